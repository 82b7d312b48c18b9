use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::domain::connect_nodes::ConnectNodes;

/// A single quiz question as stored inside a topic file.
///
/// Built from JSON through `QuestionValidator::decode_question` (or
/// `validate_document`), never deserialized directly, so that legacy
/// shapes pass through the normalizer first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Keys this tool does not model, written back unchanged.
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(id: &str, question: &str, explanation: &str, kind: QuestionKind) -> Self {
        Question {
            id: id.to_string(),
            question: question.to_string(),
            explanation: explanation.to_string(),
            explanation_image: None,
            image: None,
            kind,
            extra: Map::new(),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    /// First line of the prompt, shortened for list views.
    pub fn snippet(&self) -> String {
        let first_line = self.question.trim().lines().next().unwrap_or_default();
        if first_line.chars().count() > 60 {
            let head: String = first_line.chars().take(57).collect();
            format!("{}…", head)
        } else {
            first_line.to_string()
        }
    }
}

/// Type-specific payload. The serialized `type` tag is the variant name in
/// snake_case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    TrueFalse {
        correct: bool,
    },
    McSingle {
        options: Vec<String>,
        correct: i64,
    },
    McMulti {
        options: Vec<String>,
        correct: Vec<i64>,
    },
    FillText {
        answers: Vec<String>,
    },
    FillTable {
        table: TableAnswers,
    },
    /// Items are shown as-is; plain text and `{id, text}` objects both occur.
    Sort {
        items: Vec<Value>,
        correct: Vec<i64>,
    },
    ConnectNodes(ConnectNodes),
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::McSingle { .. } => QuestionType::McSingle,
            QuestionKind::McMulti { .. } => QuestionType::McMulti,
            QuestionKind::FillText { .. } => QuestionType::FillText,
            QuestionKind::FillTable { .. } => QuestionType::FillTable,
            QuestionKind::Sort { .. } => QuestionType::Sort,
            QuestionKind::ConnectNodes(_) => QuestionType::ConnectNodes,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TableAnswers {
    /// Rows of accepted cell answers; rows may differ in width.
    pub answers: Vec<Vec<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuestionType {
    TrueFalse,
    McSingle,
    McMulti,
    FillText,
    FillTable,
    Sort,
    ConnectNodes,
}

impl QuestionType {
    pub const ALL: [QuestionType; 7] = [
        QuestionType::TrueFalse,
        QuestionType::McSingle,
        QuestionType::McMulti,
        QuestionType::FillText,
        QuestionType::FillTable,
        QuestionType::Sort,
        QuestionType::ConnectNodes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::TrueFalse => "true_false",
            QuestionType::McSingle => "mc_single",
            QuestionType::McMulti => "mc_multi",
            QuestionType::FillText => "fill_text",
            QuestionType::FillTable => "fill_table",
            QuestionType::Sort => "sort",
            QuestionType::ConnectNodes => "connect_nodes",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
