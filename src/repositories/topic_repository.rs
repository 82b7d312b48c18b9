use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::{
    config::relative_path,
    errors::{AppError, AppResult},
    models::document::{self, keys},
    models::domain::{CourseCatalog, Topic, TopicIndex, TopicViolation},
    services::{question_validator::QuestionValidator, shape_normalizer::ShapeNormalizer},
};

#[cfg_attr(test, mockall::automock)]
pub trait TopicRepository: Send + Sync {
    fn load_courses(&self) -> AppResult<CourseCatalog>;
    fn load_topic_index(&self, course_id: &str) -> AppResult<TopicIndex>;
    fn save_topic_index(&self, course_id: &str, index: &TopicIndex) -> AppResult<()>;
    /// `Ok(None)` when the topic file does not exist yet.
    fn load_topic(&self, course_id: &str, file: &str) -> AppResult<Option<Topic>>;
    fn save_topic(&self, course_id: &str, file: &str, topic: &Topic) -> AppResult<()>;
}

/// Content tree on disk:
/// `<data_dir>/courses.json`, `<data_dir>/<course>/topics.json` and the
/// topic files the index points at.
pub struct JsonFileRepository {
    data_dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn course_dir(&self, course_id: &str) -> AppResult<PathBuf> {
        Ok(self.data_dir.join(relative_path(course_id)?))
    }

    fn topic_path(&self, course_id: &str, file: &str) -> AppResult<PathBuf> {
        Ok(self.course_dir(course_id)?.join(relative_path(file)?))
    }

    fn read_json(path: &Path) -> AppResult<Value> {
        if !path.exists() {
            return Err(AppError::NotFound(format!("Missing {}", path.display())));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Pretty JSON with two-space indentation; non-ASCII is written as-is.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, body)?;
    Ok(())
}

impl TopicRepository for JsonFileRepository {
    fn load_courses(&self) -> AppResult<CourseCatalog> {
        let raw = Self::read_json(&self.data_dir.join("courses.json"))?;
        Ok(serde_json::from_value(raw)?)
    }

    fn load_topic_index(&self, course_id: &str) -> AppResult<TopicIndex> {
        let raw = Self::read_json(&self.course_dir(course_id)?.join("topics.json"))?;
        Ok(serde_json::from_value(raw)?)
    }

    fn save_topic_index(&self, course_id: &str, index: &TopicIndex) -> AppResult<()> {
        write_json(&self.course_dir(course_id)?.join("topics.json"), index)
    }

    fn load_topic(&self, course_id: &str, file: &str) -> AppResult<Option<Topic>> {
        let path = self.topic_path(course_id, file)?;
        if !path.exists() {
            log::debug!("Topic file {} does not exist yet", path.display());
            return Ok(None);
        }
        let raw = Self::read_json(&path)?;
        decode_topic_document(raw).map(Some)
    }

    fn save_topic(&self, course_id: &str, file: &str, topic: &Topic) -> AppResult<()> {
        write_json(&self.topic_path(course_id, file)?, topic)
    }
}

/// Builds a `Topic` from a topic file document. connect_nodes questions are
/// normalized first; each question is then decoded for shape only, so a
/// question that breaks a rule still loads and is caught at save time.
pub fn decode_topic_document(mut raw: Value) -> AppResult<Topic> {
    let topic_id = document::text(document::field(&raw, keys::TOPIC_ID))
        .unwrap_or_default()
        .to_string();
    let topic_name = document::text(document::field(&raw, keys::TOPIC_NAME))
        .unwrap_or_default()
        .to_string();

    let mut topic = Topic::new(&topic_id, &topic_name);
    if let Some(map) = raw.as_object() {
        topic.extra = map
            .iter()
            .filter(|(key, _)| {
                let key = key.as_str();
                key != "questions"
                    && !keys::TOPIC_ID.contains(&key)
                    && !keys::TOPIC_NAME.contains(&key)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
    }
    let entries = match raw.get_mut("questions") {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => return Ok(topic),
        Some(_) => {
            return Err(AppError::ValidationError(
                "Topic questions must be an array".to_string(),
            ))
        }
    };

    for (index, entry) in entries.iter_mut().enumerate() {
        if let Some(report) = ShapeNormalizer::normalize_document(entry) {
            if !report.is_lossless() {
                log::warn!(
                    "Question #{} in topic '{}' lost data during normalization: {:?}",
                    index + 1,
                    topic_id,
                    report
                );
            }
        }
        let question = QuestionValidator::decode_question(entry).map_err(|violation| {
            TopicViolation {
                index,
                id: document::text(entry.get("id")).unwrap_or_default().to_string(),
                violation,
            }
        })?;
        topic.questions.push(question);
    }

    Ok(topic)
}
