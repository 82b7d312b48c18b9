use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use thiserror::Error;

use crate::models::document::{self, keys};
use crate::models::domain::connect_nodes::{ConnectNodes, Node, NodePair, Side};
use crate::models::domain::question::QuestionType;
use crate::services::node_id_allocator;

/// Why a `correct_pairs` entry did not survive normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("left label '{0}' matches no node")]
    UnknownLeftLabel(String),

    #[error("right label '{0}' matches no node")]
    UnknownRightLabel(String),

    #[error("entry is neither {{left_id, right_id}} nor {{left, right}}")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPair {
    pub position: usize,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNode {
    pub side: Side,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignedId {
    pub side: Side,
    pub position: usize,
    pub from: String,
    pub to: String,
}

/// What normalization changed or discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Plain-string nodes (or id-less objects) given an allocated id.
    pub converted_nodes: usize,
    /// Label-based `{left, right}` pairs resolved to ids.
    pub converted_pairs: usize,
    pub dropped_pairs: Vec<DroppedPair>,
    pub skipped_nodes: Vec<SkippedNode>,
    pub reassigned_ids: Vec<ReassignedId>,
    /// Payload keys (or pair keys) read from a camelCase spelling.
    pub renamed_keys: usize,
}

impl NormalizationReport {
    /// True when the input already was in canonical form.
    pub fn is_unchanged(&self) -> bool {
        self.converted_nodes == 0
            && self.converted_pairs == 0
            && self.renamed_keys == 0
            && self.reassigned_ids.is_empty()
            && self.is_lossless()
    }

    pub fn is_lossless(&self) -> bool {
        self.dropped_pairs.is_empty() && self.skipped_nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub payload: ConnectNodes,
    pub report: NormalizationReport,
}

pub struct ShapeNormalizer;

impl ShapeNormalizer {
    /// Canonical connect_nodes payload for a raw question document.
    ///
    /// Never fails: absent or malformed node lists and pair lists become
    /// empty sequences. Canonical input comes back unchanged.
    pub fn normalize(raw: &Value) -> Normalized {
        let renamed_keys = [keys::LEFT_NODES, keys::RIGHT_NODES, keys::CORRECT_PAIRS]
            .iter()
            .map(|aliases| aliases[1..].iter().filter(|key| raw.get(**key).is_some()).count())
            .sum();
        let mut report = NormalizationReport {
            renamed_keys,
            ..Default::default()
        };

        let left_nodes =
            Self::normalize_side(document::field(raw, keys::LEFT_NODES), Side::Left, &mut report);
        let right_nodes = Self::normalize_side(
            document::field(raw, keys::RIGHT_NODES),
            Side::Right,
            &mut report,
        );
        let correct_pairs = Self::normalize_pairs(
            document::field(raw, keys::CORRECT_PAIRS),
            &left_nodes,
            &right_nodes,
            &mut report,
        );

        for dropped in &report.dropped_pairs {
            log::warn!(
                "Dropped correct_pairs[{}] of question '{}': {}",
                dropped.position,
                raw.get("id").and_then(Value::as_str).unwrap_or_default(),
                dropped.reason
            );
        }

        Normalized {
            payload: ConnectNodes {
                left_nodes,
                right_nodes,
                correct_pairs,
            },
            report,
        }
    }

    /// Rewrites a connect_nodes document in place with canonical
    /// snake_case keys. Documents of any other type are left alone and
    /// `None` is returned.
    pub fn normalize_document(doc: &mut Value) -> Option<NormalizationReport> {
        if doc.get("type").and_then(Value::as_str) != Some(QuestionType::ConnectNodes.as_str()) {
            return None;
        }

        let Normalized { payload, report } = Self::normalize(doc);
        let map = doc.as_object_mut()?;
        for key in keys::LEFT_NODES
            .iter()
            .chain(keys::RIGHT_NODES)
            .chain(keys::CORRECT_PAIRS)
        {
            map.remove(*key);
        }
        map.insert("left_nodes".to_string(), nodes_value(&payload.left_nodes));
        map.insert("right_nodes".to_string(), nodes_value(&payload.right_nodes));
        map.insert(
            "correct_pairs".to_string(),
            Value::Array(
                payload
                    .correct_pairs
                    .iter()
                    .map(|p| json!({"left_id": p.left_id, "right_id": p.right_id}))
                    .collect(),
            ),
        );

        Some(report)
    }

    fn normalize_side(
        raw: Option<&Value>,
        side: Side,
        report: &mut NormalizationReport,
    ) -> Vec<Node> {
        let Some(Value::Array(entries)) = raw else {
            return Vec::new();
        };

        // Object ids are reserved up front, not claimed in input order:
        // canonical pairs already point at them, so a string node listed
        // earlier must not take one and silently re-target those pairs.
        let mut taken: HashSet<String> = HashSet::new();
        let reserved: Vec<Option<&str>> = entries
            .iter()
            .map(|entry| match entry.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() && taken.insert(id.to_string()) => Some(id),
                _ => None,
            })
            .collect();

        let mut nodes = Vec::with_capacity(entries.len());
        for (position, (entry, reserved)) in entries.iter().zip(reserved).enumerate() {
            match entry {
                Value::String(label) => {
                    let id = Self::next_id(&mut taken, side);
                    report.converted_nodes += 1;
                    nodes.push(Node {
                        id,
                        label: label.clone(),
                    });
                }
                Value::Object(map) => {
                    let label = map
                        .get("label")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let id = match reserved {
                        Some(id) => id.to_string(),
                        None => {
                            let id = Self::next_id(&mut taken, side);
                            match map.get("id").and_then(Value::as_str) {
                                Some(previous) if !previous.is_empty() => {
                                    report.reassigned_ids.push(ReassignedId {
                                        side,
                                        position,
                                        from: previous.to_string(),
                                        to: id.clone(),
                                    })
                                }
                                _ => report.converted_nodes += 1,
                            }
                            id
                        }
                    };
                    nodes.push(Node { id, label });
                }
                _ => report.skipped_nodes.push(SkippedNode { side, position }),
            }
        }
        nodes
    }

    fn next_id(taken: &mut HashSet<String>, side: Side) -> String {
        let id = node_id_allocator::allocate(taken, side.prefix());
        taken.insert(id.clone());
        id
    }

    fn normalize_pairs(
        raw: Option<&Value>,
        left: &[Node],
        right: &[Node],
        report: &mut NormalizationReport,
    ) -> Vec<NodePair> {
        let Some(Value::Array(entries)) = raw else {
            return Vec::new();
        };

        let left_by_label = label_index(left);
        let right_by_label = label_index(right);

        let mut pairs = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            match Self::resolve_pair(entry, &left_by_label, &right_by_label) {
                Ok((pair, converted)) => {
                    if converted {
                        report.converted_pairs += 1;
                    } else if has_camel_case_id_key(entry) {
                        report.renamed_keys += 1;
                    }
                    pairs.push(pair);
                }
                Err(reason) => report.dropped_pairs.push(DroppedPair { position, reason }),
            }
        }
        pairs
    }

    /// Returns the pair and whether it was converted from labels.
    fn resolve_pair(
        entry: &Value,
        left_by_label: &HashMap<&str, &str>,
        right_by_label: &HashMap<&str, &str>,
    ) -> Result<(NodePair, bool), DropReason> {
        let Value::Object(map) = entry else {
            return Err(DropReason::Malformed);
        };

        let left_id = document::field_in(map, keys::LEFT_ID);
        let right_id = document::field_in(map, keys::RIGHT_ID);
        if left_id.is_some() || right_id.is_some() {
            return match (document::text(left_id), document::text(right_id)) {
                (Some(l), Some(r)) => Ok((NodePair::new(l, r), false)),
                _ => Err(DropReason::Malformed),
            };
        }

        match (document::text(map.get("left")), document::text(map.get("right"))) {
            (Some(l), Some(r)) => {
                let left_id = left_by_label
                    .get(l)
                    .ok_or_else(|| DropReason::UnknownLeftLabel(l.to_string()))?;
                let right_id = right_by_label
                    .get(r)
                    .ok_or_else(|| DropReason::UnknownRightLabel(r.to_string()))?;
                Ok((NodePair::new(left_id, right_id), true))
            }
            _ => Err(DropReason::Malformed),
        }
    }
}

/// label -> id; the first node carrying a label wins.
fn label_index(nodes: &[Node]) -> HashMap<&str, &str> {
    let mut index = HashMap::with_capacity(nodes.len());
    for node in nodes {
        index.entry(node.label.as_str()).or_insert(node.id.as_str());
    }
    index
}

fn nodes_value(nodes: &[Node]) -> Value {
    Value::Array(
        nodes
            .iter()
            .map(|n| json!({"id": n.id, "label": n.label}))
            .collect(),
    )
}

fn has_camel_case_id_key(entry: &Value) -> bool {
    keys::LEFT_ID[1..]
        .iter()
        .chain(&keys::RIGHT_ID[1..])
        .any(|key| entry.get(*key).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> Value {
        json!({
            "id": "cn1",
            "type": "connect_nodes",
            "question": "Match capitals",
            "explanation": "geography",
            "left_nodes": [{"id": "l1", "label": "France"}, {"id": "l2", "label": "Peru"}],
            "right_nodes": [{"id": "r1", "label": "Paris"}, {"id": "r2", "label": "Lima"}],
            "correct_pairs": [
                {"left_id": "l1", "right_id": "r1"},
                {"left_id": "l2", "right_id": "r2"}
            ]
        })
    }

    #[test]
    fn legacy_strings_and_label_pairs_become_canonical() {
        let raw = json!({
            "type": "connect_nodes",
            "leftNodes": ["A", "B"],
            "rightNodes": ["X", "Y"],
            "correctPairs": [{"left": "A", "right": "X"}]
        });

        let Normalized { payload, report } = ShapeNormalizer::normalize(&raw);

        assert_eq!(payload.left_nodes, vec![Node::new("l1", "A"), Node::new("l2", "B")]);
        assert_eq!(payload.right_nodes, vec![Node::new("r1", "X"), Node::new("r2", "Y")]);
        assert_eq!(payload.correct_pairs, vec![NodePair::new("l1", "r1")]);
        assert_eq!(report.converted_nodes, 4);
        assert_eq!(report.converted_pairs, 1);
        assert!(report.is_lossless());
    }

    #[test]
    fn canonical_document_is_unchanged() {
        let mut doc = canonical();
        let report = ShapeNormalizer::normalize_document(&mut doc).expect("connect_nodes document");

        assert_eq!(doc, canonical());
        assert!(report.is_unchanged());
    }

    #[test]
    fn normalization_is_idempotent_after_legacy_conversion() {
        let mut doc = json!({
            "type": "connect_nodes",
            "left_nodes": ["A", {"id": "l1", "label": "B"}],
            "right_nodes": ["X"],
            "correct_pairs": [{"left": "B", "right": "X"}]
        });
        ShapeNormalizer::normalize_document(&mut doc);
        let once = doc.clone();

        let report = ShapeNormalizer::normalize_document(&mut doc).expect("connect_nodes document");

        assert_eq!(doc, once);
        assert!(report.is_unchanged());
    }

    #[test]
    fn object_ids_are_reserved_before_strings_are_allocated() {
        let raw = json!({
            "left_nodes": ["A", {"id": "l1", "label": "B"}, "C"]
        });

        let Normalized { payload, report } = ShapeNormalizer::normalize(&raw);

        assert_eq!(
            payload.left_nodes,
            vec![Node::new("l2", "A"), Node::new("l1", "B"), Node::new("l3", "C")]
        );
        assert!(report.reassigned_ids.is_empty());
    }

    #[test]
    fn reserved_object_id_keeps_its_canonical_pair() {
        let raw = json!({
            "left_nodes": ["A", {"id": "l1", "label": "B"}],
            "right_nodes": [{"id": "r1", "label": "X"}],
            "correct_pairs": [{"left_id": "l1", "right_id": "r1"}]
        });

        let Normalized { payload, .. } = ShapeNormalizer::normalize(&raw);

        assert_eq!(payload.label_of(Side::Left, "l1"), Some("B"));
        assert_eq!(payload.correct_pairs, vec![NodePair::new("l1", "r1")]);
    }

    #[test]
    fn camel_case_canonical_document_is_reported_as_renamed() {
        let mut doc = json!({
            "type": "connect_nodes",
            "leftNodes": [{"id": "l1", "label": "A"}],
            "rightNodes": [{"id": "r1", "label": "X"}],
            "correctPairs": [{"leftId": "l1", "rightId": "r1"}]
        });

        let report = ShapeNormalizer::normalize_document(&mut doc).expect("connect_nodes document");

        assert_eq!(report.renamed_keys, 4);
        assert!(!report.is_unchanged());
        assert!(report.is_lossless());
        assert_eq!(doc["correct_pairs"], json!([{"left_id": "l1", "right_id": "r1"}]));

        let again = ShapeNormalizer::normalize_document(&mut doc).expect("connect_nodes document");
        assert!(again.is_unchanged());
    }

    #[test]
    fn colliding_object_ids_are_reassigned_and_reported() {
        let raw = json!({
            "right_nodes": [{"id": "r1", "label": "X"}, {"id": "r1", "label": "Y"}]
        });

        let Normalized { payload, report } = ShapeNormalizer::normalize(&raw);

        assert_eq!(payload.right_nodes, vec![Node::new("r1", "X"), Node::new("r2", "Y")]);
        assert_eq!(
            report.reassigned_ids,
            vec![ReassignedId {
                side: Side::Right,
                position: 1,
                from: "r1".into(),
                to: "r2".into()
            }]
        );
    }

    #[test]
    fn unresolvable_label_pairs_are_dropped_and_reported() {
        let raw = json!({
            "left_nodes": ["A"],
            "right_nodes": ["X"],
            "correct_pairs": [
                {"left": "A", "right": "Gone"},
                {"left": "Stale", "right": "X"},
                {"left": "A", "right": "X"},
                "junk"
            ]
        });

        let Normalized { payload, report } = ShapeNormalizer::normalize(&raw);

        assert_eq!(payload.correct_pairs, vec![NodePair::new("l1", "r1")]);
        assert_eq!(
            report.dropped_pairs,
            vec![
                DroppedPair {
                    position: 0,
                    reason: DropReason::UnknownRightLabel("Gone".into())
                },
                DroppedPair {
                    position: 1,
                    reason: DropReason::UnknownLeftLabel("Stale".into())
                },
                DroppedPair {
                    position: 3,
                    reason: DropReason::Malformed
                },
            ]
        );
        assert!(!report.is_lossless());
    }

    #[test]
    fn canonical_pairs_are_kept_verbatim_even_if_unknown() {
        let raw = json!({
            "left_nodes": ["A"],
            "right_nodes": ["X"],
            "correct_pairs": [{"leftId": "l9", "rightId": "r1"}]
        });

        let payload = ShapeNormalizer::normalize(&raw).payload;

        assert_eq!(payload.correct_pairs, vec![NodePair::new("l9", "r1")]);
    }

    #[test]
    fn half_canonical_pair_is_malformed() {
        let raw = json!({"correct_pairs": [{"left_id": "l1", "right": "X"}]});

        let report = ShapeNormalizer::normalize(&raw).report;

        assert_eq!(report.dropped_pairs[0].reason, DropReason::Malformed);
    }

    #[test]
    fn missing_and_malformed_fields_default_to_empty() {
        let raw = json!({"left_nodes": "A,B", "right_nodes": null});

        let Normalized { payload, report } = ShapeNormalizer::normalize(&raw);

        assert_eq!(payload, ConnectNodes::default());
        assert!(report.is_unchanged());
    }

    #[test]
    fn non_node_entries_are_skipped() {
        let raw = json!({"left_nodes": ["A", 7, null, {"label": "B"}]});

        let Normalized { payload, report } = ShapeNormalizer::normalize(&raw);

        assert_eq!(payload.left_nodes, vec![Node::new("l1", "A"), Node::new("l2", "B")]);
        assert_eq!(
            report.skipped_nodes,
            vec![
                SkippedNode {
                    side: Side::Left,
                    position: 1
                },
                SkippedNode {
                    side: Side::Left,
                    position: 2
                }
            ]
        );
    }

    #[test]
    fn duplicate_labels_resolve_to_first_node() {
        let raw = json!({
            "left_nodes": ["A", "A"],
            "right_nodes": ["X"],
            "correct_pairs": [{"left": "A", "right": "X"}]
        });

        let payload = ShapeNormalizer::normalize(&raw).payload;

        assert_eq!(payload.correct_pairs, vec![NodePair::new("l1", "r1")]);
    }

    #[test]
    fn normalize_document_rewrites_camel_case_keys() {
        let mut doc = json!({
            "id": "cn",
            "type": "connect_nodes",
            "leftNodes": ["A"],
            "rightNodes": ["X"],
            "correctPairs": [{"left": "A", "right": "X"}]
        });

        ShapeNormalizer::normalize_document(&mut doc);

        assert!(doc.get("leftNodes").is_none());
        assert!(doc.get("correctPairs").is_none());
        assert_eq!(doc["left_nodes"], json!([{"id": "l1", "label": "A"}]));
        assert_eq!(doc["correct_pairs"], json!([{"left_id": "l1", "right_id": "r1"}]));
    }

    #[test]
    fn normalize_document_ignores_other_types() {
        let mut doc = json!({"type": "sort", "items": ["a", "b"], "correct": [1, 0]});
        let before = doc.clone();

        assert!(ShapeNormalizer::normalize_document(&mut doc).is_none());
        assert_eq!(doc, before);
    }
}
