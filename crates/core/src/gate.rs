use std::sync::Arc;

use tracing::warn;

use crate::{
    error::{Result, TrackerError},
    storage::Storage,
};

pub const SESSION_KEY: &str = "analytics_auth";

/// Client-side password gate for the dashboard.
///
/// The password ships with the binary; this keeps casual visitors out and nothing more.
pub struct AccessGate {
    session: Arc<dyn Storage>,
    password: String,
}

impl AccessGate {
    pub fn new(session: Arc<dyn Storage>, password: impl Into<String>) -> Self {
        Self {
            session,
            password: password.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        match self.session.get_item(SESSION_KEY) {
            Ok(flag) => flag.as_deref().map(str::trim) == Some("true"),
            Err(e) => {
                warn!(error = %e, "failed to read session flag");
                false
            }
        }
    }

    pub fn login(&self, candidate: &str) -> Result<()> {
        if candidate != self.password {
            return Err(TrackerError::WrongPassword);
        }
        self.session.set_item(SESSION_KEY, "true")
    }

    pub fn logout(&self) -> Result<()> {
        self.session.remove_item(SESSION_KEY)
    }
}
