use std::collections::HashSet;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::domain::question::Question;
use crate::services::question_validator::{QuestionValidator, QuestionViolation};

/// An ordered set of questions plus topic metadata; the unit of persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Topic {
    pub topic_id: String,
    pub topic_name: String,
    pub questions: Vec<Question>,
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

/// A question that failed validation, located by position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Question #{} ({}): {}", .index + 1, .id, .violation)]
pub struct TopicViolation {
    pub index: usize,
    pub id: String,
    pub violation: QuestionViolation,
}

impl Topic {
    pub fn new(topic_id: &str, topic_name: &str) -> Self {
        Topic {
            topic_id: topic_id.to_string(),
            topic_name: topic_name.to_string(),
            questions: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Replaces the question at `selected` if that position exists,
    /// otherwise appends. Returns the position the question now occupies.
    pub fn add_or_update(&mut self, selected: Option<usize>, question: Question) -> usize {
        match selected {
            Some(index) if index < self.questions.len() => {
                self.questions[index] = question;
                index
            }
            _ => {
                self.questions.push(question);
                self.questions.len() - 1
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Question> {
        if index < self.questions.len() {
            Some(self.questions.remove(index))
        } else {
            None
        }
    }

    /// First failing question, in order.
    pub fn validate_all(&self) -> Result<(), TopicViolation> {
        match self.violations_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Every failing question, in order.
    pub fn violations(&self) -> Vec<TopicViolation> {
        self.violations_iter().collect()
    }

    fn violations_iter(&self) -> impl Iterator<Item = TopicViolation> + '_ {
        self.questions
            .iter()
            .enumerate()
            .filter_map(|(index, question)| {
                QuestionValidator::validate_question(question)
                    .err()
                    .map(|violation| TopicViolation {
                        index,
                        id: question.id.clone(),
                        violation,
                    })
            })
    }

    /// Ids used by more than one question, in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for question in &self.questions {
            let id = question.id.as_str();
            if !seen.insert(id) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        duplicates
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::*;

    #[test]
    fn add_or_update_appends_without_selection() {
        let mut topic = Topic::new("t1", "Topic");

        assert_eq!(topic.add_or_update(None, true_false_question("q1")), 0);
        assert_eq!(topic.add_or_update(None, true_false_question("q2")), 1);
        assert_eq!(topic.questions.len(), 2);
    }

    #[test]
    fn add_or_update_replaces_selected_position() {
        let mut topic = sample_topic();
        let before = topic.questions.len();

        let position = topic.add_or_update(Some(1), true_false_question("replacement"));

        assert_eq!(position, 1);
        assert_eq!(topic.questions.len(), before);
        assert_eq!(topic.questions[1].id, "replacement");
    }

    #[test]
    fn add_or_update_appends_when_selection_is_stale() {
        let mut topic = Topic::new("t1", "Topic");

        assert_eq!(topic.add_or_update(Some(5), true_false_question("q1")), 0);
    }

    #[test]
    fn add_or_update_does_not_enforce_unique_ids() {
        let mut topic = Topic::new("t1", "Topic");
        topic.add_or_update(None, true_false_question("q1"));
        topic.add_or_update(None, true_false_question("q1"));

        assert_eq!(topic.questions.len(), 2);
        assert_eq!(topic.duplicate_ids(), vec!["q1"]);
        assert!(topic.validate_all().is_ok());
    }

    #[test]
    fn remove_by_position() {
        let mut topic = sample_topic();
        let second = topic.questions[1].id.clone();

        let removed = topic.remove(1).expect("position exists");

        assert_eq!(removed.id, second);
        assert!(topic.remove(99).is_none());
        assert!(topic.position_of(&second).is_none());
    }

    #[test]
    fn validate_all_reports_first_failure_only() {
        let mut topic = sample_topic();
        topic.questions[1].explanation = String::new();
        topic.questions[2].id = String::new();

        let failure = topic.validate_all().expect_err("two questions are broken");

        assert_eq!(failure.index, 1);
        assert_eq!(failure.violation, QuestionViolation::MissingExplanation);
        assert_eq!(
            failure.to_string(),
            format!(
                "Question #2 ({}): Provide either explanation text or explanation_image (or both)",
                topic.questions[1].id
            )
        );
    }

    #[test]
    fn violations_collects_every_failure() {
        let mut topic = sample_topic();
        topic.questions[1].explanation = String::new();
        topic.questions[2].id = String::new();

        let failures = topic.violations();

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].index, 2);
        assert_eq!(failures[1].violation, QuestionViolation::MissingField("id"));
    }

    #[test]
    fn sample_topic_is_valid() {
        assert!(sample_topic().validate_all().is_ok());
        assert!(sample_topic().violations().is_empty());
    }
}
