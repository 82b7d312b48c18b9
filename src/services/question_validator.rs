use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::document::{self, keys};
use crate::models::domain::connect_nodes::{ConnectNodes, Node, NodePair};
use crate::models::domain::question::{Question, QuestionKind, QuestionType, TableAnswers};

/// Reason string reported for a well-formed question.
pub const OK_REASON: &str = "OK";

/// A violated schema rule. The `Display` text is shown to authors verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionViolation {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Provide either explanation text or explanation_image (or both)")]
    MissingExplanation,

    #[error("true_false requires boolean \"correct\"")]
    TrueFalseCorrect,

    #[error("mc_single requires options[] (>=2)")]
    SingleOptions,

    #[error("mc_single requires numeric correct index")]
    SingleCorrectIndex,

    #[error("mc_multi requires options[] (>=2)")]
    MultiOptions,

    #[error("mc_multi requires array of correct indices")]
    MultiCorrectIndices,

    #[error("mc_multi: correct indices out of range")]
    MultiIndexOutOfRange,

    #[error("fill_text requires answers[]")]
    FillTextAnswers,

    #[error("fill_table requires table.answers as 2D array")]
    FillTableAnswers,

    #[error("sort requires items[] (>=2)")]
    SortItems,

    #[error("sort requires correct[] as array of indices (0..n-1)")]
    SortCorrectIndices,

    #[error("sort correct[] must have the same length as items[]")]
    SortLength,

    #[error("sort: correct indices out of range")]
    SortIndexOutOfRange,

    #[error("sort: correct[] must contain each index 0..n-1 exactly once (a permutation)")]
    SortNotPermutation,

    #[error("connect_nodes requires left_nodes[] and right_nodes[] as arrays of {{id, label}}")]
    ConnectNodeLists,

    #[error("connect_nodes: node ids must be non-empty and unique on each side")]
    ConnectNodeIds,

    #[error("connect_nodes requires correct_pairs[] as array of {{left_id, right_id}}")]
    ConnectPairs,

    #[error("connect_nodes: correct_pairs reference unknown node id")]
    ConnectUnknownNode,

    #[error("connect_nodes: correct_pairs must be one-to-one (each node at most once)")]
    ConnectNotOneToOne,

    #[error("Unknown type: {0}")]
    UnknownType(String),
}

/// How much of the rule set a document pass applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Checks {
    /// JSON shape only: enough to build a typed `Question`.
    Shape,
    /// Every rule, in order.
    Full,
}

pub struct QuestionValidator;

impl QuestionValidator {
    /// Validates a raw question document, stopping at the first violated
    /// rule. On success the typed question is returned.
    ///
    /// connect_nodes documents are expected in canonical form; run
    /// `ShapeNormalizer::normalize_document` first for legacy input.
    pub fn validate_document(doc: &Value) -> Result<Question, QuestionViolation> {
        read_question(doc, Checks::Full)
    }

    /// Builds the typed question, failing only on JSON shape errors. The
    /// result may still break rules; see `validate_question`.
    pub fn decode_question(doc: &Value) -> Result<Question, QuestionViolation> {
        read_question(doc, Checks::Shape)
    }

    /// Rules that remain checkable once a question is typed: non-empty
    /// base fields, explanation presence, and payload indices and ids.
    pub fn validate_question(question: &Question) -> Result<(), QuestionViolation> {
        require_text(&question.id, "id")?;
        require_text(&question.question, "question")?;
        require_explanation(&question.explanation, question.explanation_image.as_deref())?;

        match &question.kind {
            QuestionKind::TrueFalse { .. } => Ok(()),
            QuestionKind::McSingle { options, correct } => {
                require_options(options, QuestionViolation::SingleOptions)?;
                require_single_index(*correct, options.len())
            }
            QuestionKind::McMulti { options, correct } => {
                require_options(options, QuestionViolation::MultiOptions)?;
                require_multi_indices(correct, options.len())
            }
            QuestionKind::FillText { answers } => require_answers(answers),
            QuestionKind::FillTable { .. } => Ok(()),
            QuestionKind::Sort { items, correct } => {
                require_sort_items(items)?;
                require_permutation(correct, items.len())
            }
            QuestionKind::ConnectNodes(payload) => {
                require_node_ids(&payload.left_nodes, &payload.right_nodes)?;
                require_matching(payload)
            }
        }
    }

    /// `(valid, reason)` with `reason == "OK"` on success.
    pub fn verdict(doc: &Value) -> (bool, String) {
        match Self::validate_document(doc) {
            Ok(_) => (true, OK_REASON.to_string()),
            Err(violation) => (false, violation.to_string()),
        }
    }
}

fn read_question(doc: &Value, checks: Checks) -> Result<Question, QuestionViolation> {
    let empty = Map::new();
    let map = doc.as_object().unwrap_or(&empty);

    let id = base_text(map, "id", checks)?;
    let type_tag = match map.get("type") {
        Some(Value::String(tag)) if !tag.is_empty() => tag.as_str(),
        _ => return Err(QuestionViolation::MissingField("type")),
    };
    let question = base_text(map, "question", checks)?;

    let explanation = document::text(map.get("explanation"))
        .unwrap_or_default()
        .to_string();
    let explanation_image = optional_text(document::field_in(map, keys::EXPLANATION_IMAGE));
    if checks == Checks::Full {
        require_explanation(&explanation, explanation_image.as_deref())?;
    }

    let question_type: QuestionType = type_tag
        .parse()
        .map_err(QuestionViolation::UnknownType)?;
    let kind = read_kind(map, question_type, checks)?;

    Ok(Question {
        id,
        question,
        explanation,
        explanation_image,
        image: optional_text(map.get("image")),
        kind,
        extra: unmodelled_fields(map, question_type),
    })
}

/// Keys written from the typed fields of a question of this type, in
/// every accepted spelling.
fn modelled_keys(question_type: QuestionType) -> Vec<&'static str> {
    let mut modelled = vec!["id", "type", "question", "explanation", "image"];
    modelled.extend_from_slice(keys::EXPLANATION_IMAGE);
    match question_type {
        QuestionType::TrueFalse => modelled.push("correct"),
        QuestionType::McSingle | QuestionType::McMulti => {
            modelled.extend_from_slice(&["options", "correct"])
        }
        QuestionType::FillText => modelled.push("answers"),
        QuestionType::FillTable => modelled.push("table"),
        QuestionType::Sort => modelled.extend_from_slice(&["items", "correct"]),
        QuestionType::ConnectNodes => {
            modelled.extend_from_slice(keys::LEFT_NODES);
            modelled.extend_from_slice(keys::RIGHT_NODES);
            modelled.extend_from_slice(keys::CORRECT_PAIRS);
        }
    }
    modelled
}

fn unmodelled_fields(map: &Map<String, Value>, question_type: QuestionType) -> Map<String, Value> {
    let modelled = modelled_keys(question_type);
    map.iter()
        .filter(|(key, _)| !modelled.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn read_kind(
    map: &Map<String, Value>,
    question_type: QuestionType,
    checks: Checks,
) -> Result<QuestionKind, QuestionViolation> {
    let full = checks == Checks::Full;

    let kind = match question_type {
        QuestionType::TrueFalse => match map.get("correct") {
            Some(Value::Bool(correct)) => QuestionKind::TrueFalse { correct: *correct },
            _ => return Err(QuestionViolation::TrueFalseCorrect),
        },
        QuestionType::McSingle => {
            let options = document::string_list(map.get("options"))
                .ok_or(QuestionViolation::SingleOptions)?;
            if full {
                require_options(&options, QuestionViolation::SingleOptions)?;
            }
            let correct = document::index(map.get("correct"))
                .ok_or(QuestionViolation::SingleCorrectIndex)?;
            if full {
                require_single_index(correct, options.len())?;
            }
            QuestionKind::McSingle { options, correct }
        }
        QuestionType::McMulti => {
            let options = document::string_list(map.get("options"))
                .ok_or(QuestionViolation::MultiOptions)?;
            if full {
                require_options(&options, QuestionViolation::MultiOptions)?;
            }
            let correct = document::index_list(map.get("correct"))
                .ok_or(QuestionViolation::MultiCorrectIndices)?;
            if full {
                require_multi_indices(&correct, options.len())?;
            }
            QuestionKind::McMulti { options, correct }
        }
        QuestionType::FillText => {
            let answers = document::string_list(map.get("answers"))
                .ok_or(QuestionViolation::FillTextAnswers)?;
            if full {
                require_answers(&answers)?;
            }
            QuestionKind::FillText { answers }
        }
        QuestionType::FillTable => {
            let answers = map
                .get("table")
                .and_then(|table| table.get("answers"))
                .and_then(|rows| match rows {
                    Value::Array(rows) => rows
                        .iter()
                        .map(|row| document::string_list(Some(row)))
                        .collect::<Option<Vec<_>>>(),
                    _ => None,
                })
                .ok_or(QuestionViolation::FillTableAnswers)?;
            QuestionKind::FillTable {
                table: TableAnswers { answers },
            }
        }
        QuestionType::Sort => {
            let items = match map.get("items") {
                Some(Value::Array(items)) => items.clone(),
                _ => return Err(QuestionViolation::SortItems),
            };
            if full {
                require_sort_items(&items)?;
            }
            let correct = document::index_list(map.get("correct"))
                .ok_or(QuestionViolation::SortCorrectIndices)?;
            if full {
                require_permutation(&correct, items.len())?;
            }
            QuestionKind::Sort { items, correct }
        }
        QuestionType::ConnectNodes => {
            let left_nodes = read_nodes(document::field_in(map, keys::LEFT_NODES))
                .ok_or(QuestionViolation::ConnectNodeLists)?;
            let right_nodes = read_nodes(document::field_in(map, keys::RIGHT_NODES))
                .ok_or(QuestionViolation::ConnectNodeLists)?;
            if full {
                require_node_ids(&left_nodes, &right_nodes)?;
            }
            let correct_pairs = read_pairs(document::field_in(map, keys::CORRECT_PAIRS))
                .ok_or(QuestionViolation::ConnectPairs)?;
            let payload = ConnectNodes {
                left_nodes,
                right_nodes,
                correct_pairs,
            };
            if full {
                require_matching(&payload)?;
            }
            QuestionKind::ConnectNodes(payload)
        }
    };

    Ok(kind)
}

/// Shape mode tolerates an absent or empty field so the question can be
/// loaded and fixed; a value of the wrong JSON type is never tolerated.
fn base_text(
    map: &Map<String, Value>,
    field: &'static str,
    checks: Checks,
) -> Result<String, QuestionViolation> {
    match (map.get(field), checks) {
        (Some(Value::String(text)), Checks::Shape) => Ok(text.clone()),
        (Some(Value::String(text)), Checks::Full) if !text.is_empty() => Ok(text.clone()),
        (None | Some(Value::Null), Checks::Shape) => Ok(String::new()),
        _ => Err(QuestionViolation::MissingField(field)),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    document::text(value)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn read_nodes(value: Option<&Value>) -> Option<Vec<Node>> {
    let Value::Array(entries) = value? else {
        return None;
    };
    entries
        .iter()
        .map(|entry| {
            Some(Node {
                id: entry.get("id")?.as_str()?.to_string(),
                label: entry.get("label")?.as_str()?.to_string(),
            })
        })
        .collect()
}

fn read_pairs(value: Option<&Value>) -> Option<Vec<NodePair>> {
    let Value::Array(entries) = value? else {
        return None;
    };
    entries
        .iter()
        .map(|entry| {
            let map = entry.as_object()?;
            Some(NodePair {
                left_id: document::text(document::field_in(map, keys::LEFT_ID))?.to_string(),
                right_id: document::text(document::field_in(map, keys::RIGHT_ID))?.to_string(),
            })
        })
        .collect()
}

fn require_text(value: &str, field: &'static str) -> Result<(), QuestionViolation> {
    if value.is_empty() {
        return Err(QuestionViolation::MissingField(field));
    }
    Ok(())
}

fn require_explanation(
    explanation: &str,
    explanation_image: Option<&str>,
) -> Result<(), QuestionViolation> {
    let has_text = !explanation.trim().is_empty();
    let has_image = explanation_image.is_some_and(|image| !image.is_empty());
    if !(has_text || has_image) {
        return Err(QuestionViolation::MissingExplanation);
    }
    Ok(())
}

fn require_options(options: &[String], violation: QuestionViolation) -> Result<(), QuestionViolation> {
    if options.len() < 2 {
        return Err(violation);
    }
    Ok(())
}

fn in_range(index: i64, len: usize) -> bool {
    usize::try_from(index).is_ok_and(|i| i < len)
}

fn require_single_index(correct: i64, len: usize) -> Result<(), QuestionViolation> {
    if !in_range(correct, len) {
        return Err(QuestionViolation::SingleCorrectIndex);
    }
    Ok(())
}

// Duplicate indices are accepted.
fn require_multi_indices(correct: &[i64], len: usize) -> Result<(), QuestionViolation> {
    if !correct.iter().all(|&i| in_range(i, len)) {
        return Err(QuestionViolation::MultiIndexOutOfRange);
    }
    Ok(())
}

fn require_answers(answers: &[String]) -> Result<(), QuestionViolation> {
    if answers.is_empty() {
        return Err(QuestionViolation::FillTextAnswers);
    }
    Ok(())
}

fn require_sort_items(items: &[Value]) -> Result<(), QuestionViolation> {
    if items.len() < 2 {
        return Err(QuestionViolation::SortItems);
    }
    Ok(())
}

fn require_permutation(correct: &[i64], n: usize) -> Result<(), QuestionViolation> {
    if correct.len() != n {
        return Err(QuestionViolation::SortLength);
    }
    if !correct.iter().all(|&i| in_range(i, n)) {
        return Err(QuestionViolation::SortIndexOutOfRange);
    }
    let mut sorted = correct.to_vec();
    sorted.sort_unstable();
    if !sorted.iter().copied().eq(0..n as i64) {
        return Err(QuestionViolation::SortNotPermutation);
    }
    Ok(())
}

fn require_node_ids(left: &[Node], right: &[Node]) -> Result<(), QuestionViolation> {
    for side in [left, right] {
        let mut seen = HashSet::with_capacity(side.len());
        if !side.iter().all(|n| !n.id.is_empty() && seen.insert(n.id.as_str())) {
            return Err(QuestionViolation::ConnectNodeIds);
        }
    }
    Ok(())
}

fn require_matching(payload: &ConnectNodes) -> Result<(), QuestionViolation> {
    let left: HashSet<&str> = payload.left_nodes.iter().map(|n| n.id.as_str()).collect();
    let right: HashSet<&str> = payload.right_nodes.iter().map(|n| n.id.as_str()).collect();

    let known = payload
        .correct_pairs
        .iter()
        .all(|p| left.contains(p.left_id.as_str()) && right.contains(p.right_id.as_str()));
    if !known {
        return Err(QuestionViolation::ConnectUnknownNode);
    }

    let mut used_left = HashSet::new();
    let mut used_right = HashSet::new();
    let one_to_one = payload
        .correct_pairs
        .iter()
        .all(|p| used_left.insert(p.left_id.as_str()) && used_right.insert(p.right_id.as_str()));
    if !one_to_one {
        return Err(QuestionViolation::ConnectNotOneToOne);
    }
    Ok(())
}
