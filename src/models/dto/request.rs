use serde::Deserialize;
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::models::domain::question::QuestionType;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTopicRequest {
    #[validate(length(min = 1, message = "Topic ID required"))]
    pub topic_id: String,

    pub topic_name: String,
}

impl NewTopicRequest {
    /// Trims both fields; an empty name falls back to the topic id.
    pub fn new(topic_id: &str, topic_name: Option<&str>) -> Self {
        let topic_id = topic_id.trim().to_string();
        let topic_name = topic_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| topic_id.clone());
        NewTopicRequest {
            topic_id,
            topic_name,
        }
    }
}

/// Question fields as typed into an editing form. Multi-value fields use
/// the form conventions: one option, item or node per line; indices and
/// fill_text answers comma-separated; table rows one per line with
/// comma-separated cells; connect_nodes pairs one per line as
/// `left label = right label`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionDraft {
    pub id: String,
    pub question_type: String,
    pub question: String,
    pub explanation: String,
    pub image: String,
    pub explanation_image: String,
    /// true_false answer.
    pub correct_flag: String,
    pub options: String,
    /// mc_single index, mc_multi or sort index list.
    pub correct: String,
    pub answers: String,
    pub table: String,
    pub items: String,
    pub left_nodes: String,
    pub right_nodes: String,
    pub pairs: String,
}

impl QuestionDraft {
    /// Builds the question document. Nothing is rejected here: text that
    /// does not parse is carried into the document as-is so the validator
    /// reports it against the right rule.
    pub fn into_document(self) -> Value {
        let mut doc = Map::new();
        doc.insert("id".into(), json!(self.id.trim()));
        doc.insert("type".into(), json!(self.question_type.trim()));
        doc.insert("question".into(), json!(self.question.trim()));
        doc.insert("explanation".into(), json!(self.explanation.trim()));
        if !self.image.trim().is_empty() {
            doc.insert("image".into(), json!(self.image.trim()));
        }
        if !self.explanation_image.trim().is_empty() {
            doc.insert("explanation_image".into(), json!(self.explanation_image.trim()));
        }

        match self.question_type.trim().parse::<QuestionType>() {
            Ok(QuestionType::TrueFalse) => {
                doc.insert("correct".into(), parse_flag(&self.correct_flag));
            }
            Ok(QuestionType::McSingle) => {
                let options = lines(&self.options);
                let correct = if options.is_empty() {
                    json!(0)
                } else {
                    parse_index(&self.correct)
                };
                doc.insert("options".into(), json!(options));
                doc.insert("correct".into(), correct);
            }
            Ok(QuestionType::McMulti) => {
                doc.insert("options".into(), json!(lines(&self.options)));
                let correct = parse_indices(&self.correct)
                    .map(|indices| json!(indices))
                    .unwrap_or_else(|| json!(self.correct.trim()));
                doc.insert("correct".into(), correct);
            }
            Ok(QuestionType::FillText) => {
                doc.insert("answers".into(), json!(comma_list(&self.answers)));
            }
            Ok(QuestionType::FillTable) => {
                let rows: Vec<Vec<String>> = lines(&self.table)
                    .iter()
                    .map(|row| row.split(',').map(|cell| cell.trim().to_string()).collect())
                    .collect();
                doc.insert("table".into(), json!({ "answers": rows }));
            }
            Ok(QuestionType::Sort) => {
                let items = lines(&self.items);
                // An empty or unreadable order means "as listed".
                let correct = parse_indices(&self.correct)
                    .filter(|indices| !indices.is_empty())
                    .unwrap_or_else(|| (0..items.len() as i64).collect());
                doc.insert("items".into(), json!(items));
                doc.insert("correct".into(), json!(correct));
            }
            Ok(QuestionType::ConnectNodes) => {
                doc.insert("left_nodes".into(), json!(lines(&self.left_nodes)));
                doc.insert("right_nodes".into(), json!(lines(&self.right_nodes)));
                let pairs: Vec<Value> = lines(&self.pairs)
                    .iter()
                    .map(|line| {
                        let (left, right) = line.split_once('=').unwrap_or((line.as_str(), ""));
                        json!({"left": left.trim(), "right": right.trim()})
                    })
                    .collect();
                doc.insert("correct_pairs".into(), Value::Array(pairs));
            }
            Err(_) => {}
        }

        Value::Object(doc)
    }
}

fn lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(text: &str) -> Value {
    match text.trim().to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" | "" => Value::Bool(false),
        other => json!(other),
    }
}

fn parse_index(text: &str) -> Value {
    text.trim()
        .parse::<i64>()
        .map(|index| json!(index))
        .unwrap_or_else(|_| json!(text.trim()))
}

fn parse_indices(text: &str) -> Option<Vec<i64>> {
    comma_list(text)
        .iter()
        .map(|part| part.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn draft(question_type: &str) -> QuestionDraft {
        QuestionDraft {
            id: " q1 ".into(),
            question_type: question_type.into(),
            question: "Prompt\n".into(),
            explanation: " why ".into(),
            ..Default::default()
        }
    }

    #[test]
    fn new_topic_request_defaults_name_to_id() {
        let request = NewTopicRequest::new(" algebra ", Some("   "));
        assert_eq!(request.topic_id, "algebra");
        assert_eq!(request.topic_name, "algebra");
        assert!(request.validate().is_ok());

        let request = NewTopicRequest::new("algebra", Some(" Algebra I "));
        assert_eq!(request.topic_name, "Algebra I");
    }

    #[test]
    fn new_topic_request_requires_id() {
        let request = NewTopicRequest::new("   ", None);
        assert!(request.validate().is_err());
    }

    #[test]
    fn base_fields_are_trimmed_and_images_optional() {
        let doc = QuestionDraft {
            image: " t1/a.png ".into(),
            correct_flag: "True".into(),
            ..draft("true_false")
        }
        .into_document();

        assert_eq!(
            doc,
            json!({
                "id": "q1",
                "type": "true_false",
                "question": "Prompt",
                "explanation": "why",
                "image": "t1/a.png",
                "correct": true
            })
        );
    }

    #[test]
    fn unreadable_flag_is_kept_as_text() {
        let doc = QuestionDraft {
            correct_flag: "yes".into(),
            ..draft("true_false")
        }
        .into_document();
        assert_eq!(doc["correct"], json!("yes"));
    }

    #[test]
    fn mc_single_options_one_per_line() {
        let doc = QuestionDraft {
            options: "Paris\n\n Lima \n".into(),
            correct: " 1 ".into(),
            ..draft("mc_single")
        }
        .into_document();

        assert_eq!(doc["options"], json!(["Paris", "Lima"]));
        assert_eq!(doc["correct"], json!(1));
    }

    #[test]
    fn mc_multi_indices_comma_separated() {
        let doc = QuestionDraft {
            options: "a\nb\nc".into(),
            correct: "0, 2,".into(),
            ..draft("mc_multi")
        }
        .into_document();
        assert_eq!(doc["correct"], json!([0, 2]));

        let doc = QuestionDraft {
            options: "a\nb".into(),
            correct: "0,x".into(),
            ..draft("mc_multi")
        }
        .into_document();
        assert_eq!(doc["correct"], json!("0,x"));
    }

    #[test]
    fn fill_text_and_fill_table_parsing() {
        let doc = QuestionDraft {
            answers: "Paris, paris ,".into(),
            ..draft("fill_text")
        }
        .into_document();
        assert_eq!(doc["answers"], json!(["Paris", "paris"]));

        let doc = QuestionDraft {
            table: "4\n2, 2\n\n".into(),
            ..draft("fill_table")
        }
        .into_document();
        assert_eq!(doc["table"]["answers"], json!([["4"], ["2", "2"]]));
    }

    #[test]
    fn sort_order_defaults_to_listed_order() {
        let doc = QuestionDraft {
            items: "a\nb\nc".into(),
            ..draft("sort")
        }
        .into_document();
        assert_eq!(doc["correct"], json!([0, 1, 2]));

        let doc = QuestionDraft {
            items: "a\nb".into(),
            correct: "one, two".into(),
            ..draft("sort")
        }
        .into_document();
        assert_eq!(doc["correct"], json!([0, 1]));

        let doc = QuestionDraft {
            items: "a\nb".into(),
            correct: "1,0".into(),
            ..draft("sort")
        }
        .into_document();
        assert_eq!(doc["correct"], json!([1, 0]));
    }

    #[test]
    fn connect_nodes_pairs_are_label_based() {
        let doc = QuestionDraft {
            left_nodes: "France\nPeru".into(),
            right_nodes: "Paris\nLima".into(),
            pairs: "France = Paris\nPeru=Lima".into(),
            ..draft("connect_nodes")
        }
        .into_document();

        assert_eq!(doc["left_nodes"], json!(["France", "Peru"]));
        assert_eq!(
            doc["correct_pairs"],
            json!([
                {"left": "France", "right": "Paris"},
                {"left": "Peru", "right": "Lima"}
            ])
        );
    }

    #[test]
    fn unknown_type_gets_no_payload() {
        let doc = QuestionDraft {
            options: "a\nb".into(),
            ..draft("essay")
        }
        .into_document();

        assert_eq!(doc["type"], json!("essay"));
        assert!(doc.get("options").is_none());
    }
}
