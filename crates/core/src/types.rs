use serde::{Deserialize, Serialize};

/// One tracked interaction, as persisted in the local event log.
///
/// `timestamp` and `page` are always filled in by the store at insertion time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub category: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub page: String,
}

impl EventRecord {
    /// Label if present and non-empty.
    pub fn label_str(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }
}
