//! Tracing setup.
//!
//! `LOG_LEVEL` accepts a full filter directive string — a bare level like
//! "debug", or per-target directives such as
//! "warn,practice=debug,auth=info". When unset, the default keeps axum and
//! tower-http at info while the app's own targets ("practice", "auth",
//! "aceprep_backend") stay chatty, which is what you want when watching a
//! practice session move through its phases.
//!
//! `LOG_FORMAT=json` switches to structured output for log shippers;
//! anything else gets the human-readable form. File/line and targets are
//! recorded either way so events from the session engine, the auth store,
//! and the HTTP trace layer stay distinguishable.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
  let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
    EnvFilter::new("info,practice=debug,auth=debug,aceprep_backend=debug,tower_http=info,axum=info")
  });

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  // The json and pretty builders are distinct types, so pick the sink here
  // rather than trying to store one of them.
  if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}
