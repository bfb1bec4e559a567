use std::sync::Arc;

use log::{error, info};

use crate::backend::DockBackend;
use crate::errors::{AuthError, ConsoleError};
use crate::session::{SessionPatch, SessionStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginSuccess {
    pub token: String,
    pub username: String,
}

/// Login and logout. The backend decides whether credentials are valid; the
/// gateway only owns the token lifecycle in the [`SessionStore`].
pub struct AuthGateway {
    backend: Arc<dyn DockBackend>,
    store: Arc<dyn SessionStore>,
}

impl AuthGateway {
    pub fn new(backend: Arc<dyn DockBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Single login attempt. On success the token and username are persisted
    /// and any previously tracked truck is forgotten.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let token = self.backend.login(username, password).map_err(|e| {
            error!("Login failed for '{}': {}", username, e);
            e
        })?;

        self.store
            .save(SessionPatch::login(username, &token))
            .map_err(|e| {
                error!("Login succeeded but session could not be saved: {}", e);
                AuthError::SessionPersistence {
                    reason: e.to_string(),
                }
            })?;

        info!("Operator '{}' logged in", username);
        Ok(LoginSuccess {
            token,
            username: username.to_string(),
        })
    }

    /// Forget the whole session. Purely local, the backend is not told.
    pub fn logout(&self) -> Result<(), ConsoleError> {
        self.store.clear()?;
        info!("Operator logged out");
        Ok(())
    }
}
