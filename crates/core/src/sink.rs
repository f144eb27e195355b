//! Optional mirroring of tracked events to an external tag manager.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;
use uuid::Uuid;

use crate::{config::TagConfig, error::Result};

pub const GA4_COLLECT_URL: &str = "https://www.google-analytics.com/mp/collect";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagEvent {
    pub name: String,
    pub params: TagParams,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagParams {
    Interaction {
        event_category: String,
        event_action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        event_label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },
    PageView {
        page_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        page_title: Option<String>,
    },
}

impl TagEvent {
    pub fn interaction(
        category: &str,
        action: &str,
        label: Option<&str>,
        value: Option<f64>,
    ) -> Self {
        Self {
            name: action.to_string(),
            params: TagParams::Interaction {
                event_category: category.to_string(),
                event_action: action.to_string(),
                event_label: label.map(str::to_string),
                value,
            },
        }
    }

    pub fn page_view(path: &str, title: Option<&str>) -> Self {
        Self {
            name: "page_view".to_string(),
            params: TagParams::PageView {
                page_path: path.to_string(),
                page_title: title.map(str::to_string),
            },
        }
    }
}

/// Fire-and-forget receiver of mirrored events. Implementations must never block or fail.
pub trait TagSink: Send + Sync {
    fn fire(&self, event: TagEvent);
}

/// Keeps every fired event in memory, like the browser `dataLayer` array.
#[derive(Default)]
pub struct DataLayer {
    entries: Mutex<Vec<TagEvent>>,
}

impl DataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TagEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TagSink for DataLayer {
    fn fire(&self, event: TagEvent) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Forwards events to the GA4 Measurement Protocol from a background task.
#[derive(Clone)]
pub struct Ga4Sink {
    tx: mpsc::UnboundedSender<TagEvent>,
}

#[derive(Serialize)]
struct CollectBody<'a> {
    client_id: &'a str,
    events: [&'a TagEvent; 1],
}

impl Ga4Sink {
    /// Validate the config and start the drain task.
    ///
    /// The returned handle completes once every `Ga4Sink` clone is dropped and the
    /// queue is drained. Must be called from within a tokio runtime.
    pub fn spawn(config: &TagConfig) -> Result<(Self, JoinHandle<()>)> {
        let (measurement_id, api_secret) = config.validate()?;
        let (tx, mut rx) = mpsc::unbounded_channel::<TagEvent>();
        let client = reqwest::Client::new();
        let client_id = Uuid::new_v4().to_string();

        let drain_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let body = CollectBody {
                    client_id: &client_id,
                    events: [&event],
                };
                let sent = client
                    .post(GA4_COLLECT_URL)
                    .query(&[
                        ("measurement_id", measurement_id.as_str()),
                        ("api_secret", api_secret.as_str()),
                    ])
                    .json(&body)
                    .send()
                    .await
                    .and_then(|resp| resp.error_for_status());

                if let Err(e) = sent {
                    debug!(event = %event.name, error = %e, "tag event not delivered");
                }
            }
        });

        Ok((Self { tx }, drain_task))
    }
}

impl TagSink for Ga4Sink {
    fn fire(&self, event: TagEvent) {
        if self.tx.send(event).is_err() {
            debug!("tag sink drain task has stopped");
        }
    }
}
