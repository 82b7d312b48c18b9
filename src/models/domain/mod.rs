pub mod connect_nodes;
pub mod course;
pub mod question;
pub mod topic;

pub use connect_nodes::{ConnectNodes, Node, NodePair, Side};
pub use course::{CourseCatalog, CourseEntry, TopicEntry, TopicIndex};
pub use question::{Question, QuestionKind, QuestionType, TableAnswers};
pub use topic::{Topic, TopicViolation};
