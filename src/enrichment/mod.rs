// Enrichment producers and the adapter boundary they run behind
pub mod adapter;
pub mod cues;
pub mod illustrator;
pub mod readability;
pub mod simplifier;
pub mod story;
pub mod types;

pub use adapter::{run, truncate_context, EnrichmentProducer};
pub use illustrator::Illustrator;
pub use readability::{GradeBand, ReadabilityMetrics};
pub use simplifier::Simplifier;
pub use story::StoryGenerator;
pub use types::{
    EnrichmentResult, EnrichmentTask, Personalization, ReadingLevel, TaskInput, TaskName,
    TaskPayload,
};
