use std::path::PathBuf;

use crate::error::{Result, TrackerError};

pub const DEFAULT_DASHBOARD_PASSWORD: &str = "softham2024";

/// Shipped placeholder; treated as "no measurement id".
pub const PLACEHOLDER_MEASUREMENT_ID: &str = "G-XXXXXXXXXX";

pub const ENV_DATA_DIR: &str = "SOFTHAM_DATA_DIR";
pub const ENV_SESSION_DIR: &str = "SOFTHAM_SESSION_DIR";
pub const ENV_DASHBOARD_PASSWORD: &str = "SOFTHAM_DASHBOARD_PASSWORD";
pub const ENV_MEASUREMENT_ID: &str = "SOFTHAM_GA_MEASUREMENT_ID";
pub const ENV_API_SECRET: &str = "SOFTHAM_GA_API_SECRET";

#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Where the event log is persisted.
    pub data_dir: PathBuf,
    /// Where the dashboard session flag lives.
    pub session_dir: PathBuf,
    pub dashboard_password: String,
    pub tag: TagConfig,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagConfig {
    pub measurement_id: Option<String>,
    pub api_secret: Option<String>,
}

impl TagConfig {
    /// Returns `(measurement_id, api_secret)` when both are usable.
    pub fn validate(&self) -> Result<(String, String)> {
        let measurement_id = match self.measurement_id.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(TrackerError::TagNotConfigured {
                    reason: format!("{} is not set", ENV_MEASUREMENT_ID),
                });
            }
            Some(PLACEHOLDER_MEASUREMENT_ID) => {
                return Err(TrackerError::TagNotConfigured {
                    reason: format!("{} is still the placeholder", ENV_MEASUREMENT_ID),
                });
            }
            Some(id) => id.to_string(),
        };
        let api_secret = self
            .api_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrackerError::TagNotConfigured {
                reason: format!("{} is not set", ENV_API_SECRET),
            })?;
        Ok((measurement_id, api_secret.to_string()))
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }
}

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("softham-analytics")
}

/// Prefers the per-login runtime dir so the flag dies with the session.
pub fn get_root_session_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("softham-analytics")
        .join("session")
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_dir: non_empty(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(get_root_data_dir),
            session_dir: non_empty(ENV_SESSION_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(get_root_session_dir),
            dashboard_password: non_empty(ENV_DASHBOARD_PASSWORD)
                .unwrap_or_else(|| DEFAULT_DASHBOARD_PASSWORD.to_string()),
            tag: TagConfig {
                measurement_id: non_empty(ENV_MEASUREMENT_ID),
                api_secret: non_empty(ENV_API_SECRET),
            },
        }
    }
}
