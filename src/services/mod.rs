pub mod editor_session;
pub mod node_id_allocator;
pub mod preview_service;
pub mod question_validator;
pub mod shape_normalizer;

pub use editor_session::EditorSession;
pub use preview_service::PreviewRenderer;
pub use question_validator::{QuestionValidator, QuestionViolation};
pub use shape_normalizer::{NormalizationReport, ShapeNormalizer};
