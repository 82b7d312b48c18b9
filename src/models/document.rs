//! Lookups over raw JSON question documents.
//!
//! Documents are written with snake_case keys; the camelCase spellings are
//! accepted on input, so every multi-word key is looked up through its
//! alias list.

use serde_json::{Map, Value};

pub mod keys {
    pub const EXPLANATION_IMAGE: &[&str] = &["explanation_image", "explanationImage"];
    pub const LEFT_NODES: &[&str] = &["left_nodes", "leftNodes"];
    pub const RIGHT_NODES: &[&str] = &["right_nodes", "rightNodes"];
    pub const CORRECT_PAIRS: &[&str] = &["correct_pairs", "correctPairs"];
    pub const LEFT_ID: &[&str] = &["left_id", "leftId"];
    pub const RIGHT_ID: &[&str] = &["right_id", "rightId"];
    pub const TOPIC_ID: &[&str] = &["topic_id", "topicId"];
    pub const TOPIC_NAME: &[&str] = &["topic_name", "topicName"];
}

pub fn field<'a>(doc: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| doc.get(*key))
}

pub fn field_in<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| map.get(*key))
}

pub fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

/// Integer index; floats, booleans and strings are not indices.
pub fn index(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

pub fn index_list(value: Option<&Value>) -> Option<Vec<i64>> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|item| index(Some(item))).collect(),
        _ => None,
    }
}

pub fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_prefers_first_alias() {
        let doc = json!({"left_nodes": [1], "leftNodes": [2]});
        assert_eq!(field(&doc, keys::LEFT_NODES), Some(&json!([1])));

        let doc = json!({"leftNodes": [2]});
        assert_eq!(field(&doc, keys::LEFT_NODES), Some(&json!([2])));
    }

    #[test]
    fn index_accepts_only_integers() {
        assert_eq!(index(Some(&json!(2))), Some(2));
        assert_eq!(index(Some(&json!(-1))), Some(-1));
        assert_eq!(index(Some(&json!(1.0))), None);
        assert_eq!(index(Some(&json!("1"))), None);
        assert_eq!(index(Some(&json!(true))), None);
        assert_eq!(index(None), None);
    }

    #[test]
    fn lists_reject_mixed_elements() {
        assert_eq!(index_list(Some(&json!([0, 2]))), Some(vec![0, 2]));
        assert_eq!(index_list(Some(&json!([0, "2"]))), None);
        assert_eq!(
            string_list(Some(&json!(["a", "b"]))),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(string_list(Some(&json!(["a", 3]))), None);
        assert_eq!(string_list(Some(&json!("a"))), None);
    }
}
