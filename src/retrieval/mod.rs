// Retrieval gateway: query -> embedding -> nearest neighbours -> ranked passages
pub mod gateway;
pub mod types;

pub use gateway::RetrievalGateway;
pub use types::{
    KnowledgeStats, RetrievalOutcome, RetrievedPassage, SearchParams, SourceGroup, TopicRetrieval,
    CONTEXT_DELIMITER, MAX_TOP_K,
};
