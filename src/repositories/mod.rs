pub mod topic_repository;

pub use topic_repository::{decode_topic_document, JsonFileRepository, TopicRepository};
