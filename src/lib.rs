//! spectrum-bridge v0.5.0 - Retrieval and Enrichment Orchestration
//!
//! Answers a question from a vector knowledge base, then fans the retrieved
//! context out to concurrent enrichment producers (simplified explanation,
//! social story, illustration) and merges their outcomes into one report.
//!
//! # Architecture
//!
//! - **Retrieval**: query -> embedding -> nearest neighbours -> ranked passages
//! - **Scheduler**: retrieval gate, bounded worker pool, per-task timeouts
//! - **Aggregator**: pure merge into an immutable report with SUCCESS /
//!   PARTIAL / FAILED classification

pub mod errors;
pub mod config;
pub mod logging;

// Collaborators and the core pipeline
pub mod providers;
pub mod retrieval;
pub mod enrichment;
pub mod scheduler;
pub mod aggregator;

// Caller-side surfaces
pub mod report;
pub mod retry;
pub mod bootstrap;
pub mod cli;

// Re-export commonly used types
pub use errors::{BridgeError, ErrorKind, Result};
pub use aggregator::{AggregateReport, OverallStatus};
pub use enrichment::TaskName;
pub use retrieval::RetrievalGateway;
pub use scheduler::{FanOutScheduler, FanOutSettings, ProcessRequest};
