// Result aggregation and the final report value
pub mod aggregate;
pub mod report;

pub use aggregate::aggregate;
pub use report::{AggregateReport, OverallStatus, ReportMeta, TaskResults};
