use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `courses.json` at the root of the data directory.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CourseCatalog {
    #[serde(default)]
    pub courses: Vec<CourseEntry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CourseEntry {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `<course>/topics.json`. Keys this tool does not know about are kept so
/// rewriting the index does not lose them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TopicIndex {
    #[serde(default)]
    pub topics: Vec<TopicEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TopicEntry {
    pub id: String,
    /// Topic file path relative to the course directory, `/`-separated.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TopicEntry {
    /// Entry for a newly declared topic, stored under `topic/<id>.json`.
    pub fn for_new_topic(topic_id: &str) -> Self {
        TopicEntry {
            id: topic_id.to_string(),
            file: format!("topic/{}.json", topic_id),
            topic_name: None,
            extra: Map::new(),
        }
    }
}

impl TopicIndex {
    pub fn find(&self, topic_id: &str) -> Option<&TopicEntry> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    pub fn contains(&self, topic_id: &str) -> bool {
        self.find(topic_id).is_some()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.id.as_str()).collect()
    }
}
