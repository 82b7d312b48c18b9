use std::sync::Arc;

use serde_json::Value;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{CourseCatalog, Question, Topic, TopicEntry, TopicIndex},
    models::dto::NewTopicRequest,
    repositories::TopicRepository,
    services::{question_validator::QuestionValidator, shape_normalizer::ShapeNormalizer},
};

/// Editing state over one course and one topic at a time: the open topic,
/// the selected question, and the repository they are persisted through.
pub struct EditorSession {
    repository: Arc<dyn TopicRepository>,
    course_id: Option<String>,
    topic_index: TopicIndex,
    topic_file: Option<String>,
    topic: Topic,
    selected: Option<usize>,
}

impl EditorSession {
    pub fn new(repository: Arc<dyn TopicRepository>) -> Self {
        Self {
            repository,
            course_id: None,
            topic_index: TopicIndex::default(),
            topic_file: None,
            topic: Topic::default(),
            selected: None,
        }
    }

    pub fn courses(&self) -> AppResult<CourseCatalog> {
        self.repository.load_courses()
    }

    /// Loads the course's topic index and closes any open topic.
    pub fn open_course(&mut self, course_id: &str) -> AppResult<&TopicIndex> {
        let index = self.repository.load_topic_index(course_id)?;
        log::info!("Opened course '{}' ({} topics)", course_id, index.topics.len());

        self.course_id = Some(course_id.to_string());
        self.topic_index = index;
        self.topic_file = None;
        self.topic = Topic::default();
        self.selected = None;
        Ok(&self.topic_index)
    }

    /// Opens a topic declared in the course index. A topic whose file does
    /// not exist yet opens empty; missing id or name are taken from the
    /// index entry.
    pub fn open_topic(&mut self, topic_id: &str) -> AppResult<&Topic> {
        let course_id = self.require_course()?.to_string();
        let entry = self
            .topic_index
            .find(topic_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Topic '{}' not found in course '{}'",
                    topic_id, course_id
                ))
            })?;

        let mut topic = self
            .repository
            .load_topic(&course_id, &entry.file)?
            .unwrap_or_default();
        if topic.topic_id.is_empty() {
            topic.topic_id = entry.id.clone();
        }
        if topic.topic_name.is_empty() {
            topic.topic_name = entry.topic_name.clone().unwrap_or_else(|| entry.id.clone());
        }

        log::info!(
            "Opened topic '{}' ({} questions)",
            topic.topic_id,
            topic.questions.len()
        );
        self.topic_file = Some(entry.file);
        self.topic = topic;
        self.selected = None;
        Ok(&self.topic)
    }

    /// Declares a new topic in the open course and opens it empty. The
    /// topic file itself is written on the first `save_topic`.
    pub fn create_topic(&mut self, request: NewTopicRequest) -> AppResult<&Topic> {
        request.validate()?;
        let course_id = self.require_course()?.to_string();
        if self.topic_index.contains(&request.topic_id) {
            return Err(AppError::AlreadyExists("Topic ID already exists".to_string()));
        }

        let entry = TopicEntry::for_new_topic(&request.topic_id);
        let mut index = self.topic_index.clone();
        index.topics.push(entry.clone());
        self.repository.save_topic_index(&course_id, &index)?;
        log::info!("Added topic '{}' to course '{}'", entry.id, course_id);

        self.topic_index = index;
        self.topic_file = Some(entry.file);
        self.topic = Topic::new(&request.topic_id, &request.topic_name);
        self.selected = None;
        Ok(&self.topic)
    }

    pub fn select_question(&mut self, index: usize) -> AppResult<&Question> {
        let question = self.topic.questions.get(index).ok_or_else(|| {
            AppError::NotFound(format!("No question at position {}", index + 1))
        })?;
        self.selected = Some(index);
        Ok(question)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Normalizes and validates a question document, then stores it at the
    /// selected position (or appends). Returns the stored position.
    pub fn save_question_document(&mut self, mut doc: Value) -> AppResult<usize> {
        if let Some(report) = ShapeNormalizer::normalize_document(&mut doc) {
            if !report.is_lossless() {
                log::warn!("Question normalization dropped data: {:?}", report);
            }
        }
        let question = QuestionValidator::validate_document(&doc)?;
        self.save_question(question)
    }

    pub fn save_question(&mut self, question: Question) -> AppResult<usize> {
        self.require_topic()?;
        QuestionValidator::validate_question(&question)?;

        let position = self.topic.add_or_update(self.selected, question);
        self.selected = Some(position);
        Ok(position)
    }

    pub fn delete_question(&mut self, index: usize) -> AppResult<Question> {
        let removed = self.topic.remove(index).ok_or_else(|| {
            AppError::NotFound(format!("No question at position {}", index + 1))
        })?;
        self.selected = None;
        Ok(removed)
    }

    /// Writes the open topic after every question passes validation.
    pub fn save_topic(&self) -> AppResult<()> {
        let course_id = self.require_course()?;
        let file = self.require_topic()?;

        self.topic.validate_all()?;
        for id in self.topic.duplicate_ids() {
            log::warn!("Topic '{}' has more than one question with id '{}'", self.topic.topic_id, id);
        }

        self.repository.save_topic(course_id, file, &self.topic)?;
        log::info!("Saved {}", file);
        Ok(())
    }

    pub fn course_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }

    pub fn topic_index(&self) -> &TopicIndex {
        &self.topic_index
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn require_course(&self) -> AppResult<&str> {
        self.course_id
            .as_deref()
            .ok_or_else(|| AppError::ValidationError("Select a course".to_string()))
    }

    fn require_topic(&self) -> AppResult<&str> {
        self.topic_file
            .as_deref()
            .ok_or_else(|| AppError::ValidationError("Select or create a topic first".to_string()))
    }
}
