use std::collections::HashSet;
use std::fmt;

use schemars::JsonSchema;
use serde::Serialize;

use crate::services::node_id_allocator;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ConnectNodes {
    pub left_nodes: Vec<Node>,
    pub right_nodes: Vec<Node>,
    pub correct_pairs: Vec<NodePair>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Node {
    pub id: String,
    pub label: String,
}

impl Node {
    pub fn new(id: &str, label: &str) -> Self {
        Node {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NodePair {
    pub left_id: String,
    pub right_id: String,
}

impl NodePair {
    pub fn new(left_id: &str, right_id: &str) -> Self {
        NodePair {
            left_id: left_id.to_string(),
            right_id: right_id.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::Left => "l",
            Side::Right => "r",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

impl ConnectNodes {
    pub fn nodes(&self, side: Side) -> &[Node] {
        match side {
            Side::Left => &self.left_nodes,
            Side::Right => &self.right_nodes,
        }
    }

    pub fn ids(&self, side: Side) -> HashSet<String> {
        self.nodes(side).iter().map(|n| n.id.clone()).collect()
    }

    /// Appends a node with a freshly allocated id and returns that id.
    pub fn add_node(&mut self, side: Side, label: &str) -> String {
        let id = node_id_allocator::allocate(&self.ids(side), side.prefix());
        let node = Node::new(&id, label);
        match side {
            Side::Left => self.left_nodes.push(node),
            Side::Right => self.right_nodes.push(node),
        }
        id
    }

    pub fn label_of(&self, side: Side, id: &str) -> Option<&str> {
        self.nodes(side)
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.label.as_str())
    }
}
