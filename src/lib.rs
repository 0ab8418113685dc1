//! AcePrep backend library.
//!
//! Exposed as a library so the router and the practice engine can be
//! exercised from integration tests; the binary in `main.rs` is a thin
//! wrapper around `routes::build_router`.

pub mod auth;
pub mod config;
pub mod domain;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod util;
