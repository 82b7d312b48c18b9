#[cfg(test)]
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::models::domain::{ConnectNodes, Node, NodePair, Question, QuestionKind, Topic};

    /// A valid true_false question with the given id.
    pub fn true_false_question(id: &str) -> Question {
        Question::new(
            id,
            "The sky is blue.",
            "Rayleigh scattering.",
            QuestionKind::TrueFalse { correct: true },
        )
    }

    pub fn mc_single_question(id: &str) -> Question {
        Question::new(
            id,
            "Capital of France?",
            "Paris has been the capital since 987.",
            QuestionKind::McSingle {
                options: vec!["Lyon".into(), "Paris".into(), "Nice".into()],
                correct: 1,
            },
        )
    }

    pub fn sort_question(id: &str) -> Question {
        Question::new(
            id,
            "Order by size, smallest first.",
            "Sizes increase from atom to galaxy.",
            QuestionKind::Sort {
                items: vec!["galaxy".into(), "atom".into(), "planet".into()],
                correct: vec![1, 2, 0],
            },
        )
    }

    pub fn connect_nodes_question(id: &str) -> Question {
        Question::new(
            id,
            "Match countries to capitals.",
            "Capitals.",
            QuestionKind::ConnectNodes(ConnectNodes {
                left_nodes: vec![Node::new("l1", "France"), Node::new("l2", "Peru")],
                right_nodes: vec![Node::new("r1", "Paris"), Node::new("r2", "Lima")],
                correct_pairs: vec![NodePair::new("l1", "r1"), NodePair::new("l2", "r2")],
            }),
        )
    }

    /// Four valid questions of different types: `tf-1`, `mc-1`, `sort-1`,
    /// `cn-1`.
    pub fn sample_topic() -> Topic {
        let mut topic = Topic::new("geo", "Geography");
        topic.questions = vec![
            true_false_question("tf-1"),
            mc_single_question("mc-1"),
            sort_question("sort-1"),
            connect_nodes_question("cn-1"),
        ];
        topic
    }

    /// Legacy label-based connect_nodes document in camelCase.
    pub fn legacy_connect_document() -> Value {
        json!({
            "id": "cn-legacy",
            "type": "connect_nodes",
            "question": "Match",
            "explanation": "Capitals.",
            "leftNodes": ["France", "Peru"],
            "rightNodes": ["Paris", "Lima"],
            "correctPairs": [
                {"left": "France", "right": "Paris"},
                {"left": "Peru", "right": "Lima"}
            ]
        })
    }

    /// Topic file contents as written to disk.
    pub fn topic_document() -> Value {
        json!({
            "topic_id": "geo",
            "topic_name": "Geography",
            "questions": [
                {
                    "id": "tf-1",
                    "type": "true_false",
                    "question": "The sky is blue.",
                    "explanation": "Rayleigh scattering.",
                    "correct": true
                },
                legacy_connect_document()
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::question_validator::QuestionValidator;

    #[test]
    fn fixture_questions_are_valid() {
        for question in sample_topic().questions {
            assert!(
                QuestionValidator::validate_question(&question).is_ok(),
                "fixture {} should be valid",
                question.id
            );
        }
    }

    #[test]
    fn sample_topic_ids_are_unique() {
        let topic = sample_topic();
        assert_eq!(topic.questions.len(), 4);
        assert!(topic.duplicate_ids().is_empty());
        assert_eq!(topic.position_of("sort-1"), Some(2));
    }
}
