//! SoftHam Analytics Core Library
//!
//! Bounded local event log for site interactions, the tracking helpers that feed it,
//! and the aggregations, CSV export and access gate behind the analytics dashboard.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod gate;
pub mod sink;
pub mod storage;
pub mod store;
pub mod tracker;
pub mod types;

// Re-export commonly used items at crate root
pub use aggregate::{
    CategoryFilter, conversion_rate, count_by_category, filter_by_category, top_ctas,
    top_labels_for_category, top_pages,
};
pub use config::{TagConfig, TrackerConfig};
pub use dashboard::{Dashboard, DashboardQuery, DashboardStats, bar_ratio};
pub use error::{Result, TrackerError};
pub use export::{export_csv, export_csv_in, export_file_name};
pub use gate::AccessGate;
pub use sink::{DataLayer, Ga4Sink, TagEvent, TagSink};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{CurrentPage, EventStore, MAX_EVENTS, STORAGE_KEY};
pub use tracker::{Interaction, Tracker};
pub use types::EventRecord;
