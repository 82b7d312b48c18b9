pub mod request;

pub use request::{NewTopicRequest, QuestionDraft};
