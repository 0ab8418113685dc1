//! In-memory identity provider.
//!
//! Stand-in for the hosted auth service the application normally talks to:
//! it keeps credentials and bearer tokens in process memory and offers the
//! same four operations the rest of the backend consumes — create account,
//! sign in, sign out, resolve the current user from a token. Nothing here
//! survives a restart, and credentials are not durably protected; that is
//! the external provider's job in a real deployment.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Account {
  user_id: String,
  password: String,
}

/// Credential + token store. Cheap to clone; all clones share the maps.
#[derive(Clone, Default)]
pub struct IdentityStore {
  // keyed by lowercase email
  accounts: Arc<RwLock<HashMap<String, Account>>>,
  // bearer token -> user id
  tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl IdentityStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new account. Fails on empty fields or a duplicate email.
  /// Returns the new opaque user id.
  #[instrument(level = "info", skip(self, password), fields(%email))]
  pub async fn create_account(&self, email: &str, password: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
      return Err("A valid email address is required.".into());
    }
    if password.len() < 6 {
      return Err("Password must be at least 6 characters.".into());
    }

    let mut accounts = self.accounts.write().await;
    if accounts.contains_key(&email) {
      warn!(target: "auth", %email, "Registration rejected: email already in use");
      return Err("An account with this email already exists.".into());
    }
    let user_id = Uuid::new_v4().to_string();
    accounts.insert(email.clone(), Account { user_id: user_id.clone(), password: password.to_string() });
    info!(target: "auth", %email, %user_id, "Account created");
    Ok(user_id)
  }

  /// Verify credentials and mint a bearer token.
  #[instrument(level = "info", skip(self, password), fields(%email))]
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<(String, String), String> {
    let email = email.trim().to_lowercase();
    let user_id = {
      let accounts = self.accounts.read().await;
      match accounts.get(&email) {
        Some(acc) if acc.password == password => acc.user_id.clone(),
        _ => {
          warn!(target: "auth", %email, "Sign-in rejected: bad credentials");
          return Err("Invalid email or password.".into());
        }
      }
    };
    let token = Uuid::new_v4().to_string();
    self.tokens.write().await.insert(token.clone(), user_id.clone());
    info!(target: "auth", %email, %user_id, "Signed in");
    Ok((user_id, token))
  }

  /// Invalidate a token. Idempotent: unknown tokens are ignored.
  #[instrument(level = "info", skip_all)]
  pub async fn sign_out(&self, token: &str) {
    if self.tokens.write().await.remove(token).is_some() {
      info!(target: "auth", "Signed out");
    }
  }

  /// Resolve a bearer token to the opaque user id it was minted for.
  pub async fn current_user(&self, token: &str) -> Option<String> {
    self.tokens.read().await.get(token).cloned()
  }
}
