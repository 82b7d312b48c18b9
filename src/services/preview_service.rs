use std::fmt::Write;

use serde_json::Value;

use crate::models::domain::{ConnectNodes, Question, QuestionKind, Side};

pub struct PreviewRenderer;

impl PreviewRenderer {
    /// Plain-text rendering of a question as a learner-facing preview.
    pub fn render_preview(question: &Question) -> String {
        let mut out = String::new();
        let w = &mut out;

        line(w, format_args!("ID: {}", question.id));
        line(w, format_args!("Type: {}", question.question_type()));
        line(w, format_args!(""));
        line(w, format_args!("Question:"));
        line(w, format_args!("{}", question.question));
        line(w, format_args!(""));

        match &question.kind {
            QuestionKind::TrueFalse { correct } => {
                line(w, format_args!("Correct: {}", if *correct { "True" } else { "False" }));
            }
            QuestionKind::McSingle { options, correct } => {
                options_block(w, options);
                line(w, format_args!("  {}", correct));
            }
            QuestionKind::McMulti { options, correct } => {
                options_block(w, options);
                line(w, format_args!("  {}", join_indices(correct)));
            }
            QuestionKind::FillText { answers } => {
                line(w, format_args!("Accepted answers:"));
                line(w, format_args!("{}", answers.join(", ")));
            }
            QuestionKind::FillTable { table } => {
                line(w, format_args!("Table answers:"));
                for row in &table.answers {
                    line(w, format_args!("{}", row.join(" | ")));
                }
            }
            QuestionKind::Sort { items, correct } => {
                line(w, format_args!("Items:"));
                for (i, item) in items.iter().enumerate() {
                    line(w, format_args!("  {}. {}", i, item_text(item)));
                }
                line(w, format_args!(""));
                line(w, format_args!("Correct order (indices):"));
                line(w, format_args!("{}", join_indices(correct)));
            }
            QuestionKind::ConnectNodes(payload) => connect_block(w, payload),
        }

        if let Some(image) = &question.image {
            line(w, format_args!(""));
            line(w, format_args!("Image: {}", image));
        }
        if let Some(image) = &question.explanation_image {
            line(w, format_args!(""));
            line(w, format_args!("Explanation image: {}", image));
        }
        line(w, format_args!(""));
        line(w, format_args!("Explanation:"));
        line(w, format_args!("{}", question.explanation));

        out
    }
}

fn line(out: &mut String, args: std::fmt::Arguments<'_>) {
    // Writing into a String cannot fail.
    let _ = out.write_fmt(args);
    out.push('\n');
}

fn options_block(out: &mut String, options: &[String]) {
    line(out, format_args!("Options:"));
    for (i, option) in options.iter().enumerate() {
        line(out, format_args!("  {}. {}", i, option));
    }
    line(out, format_args!(""));
    line(out, format_args!("Correct:"));
}

fn connect_block(out: &mut String, payload: &ConnectNodes) {
    for side in [Side::Left, Side::Right] {
        let title = match side {
            Side::Left => "Left nodes:",
            Side::Right => "Right nodes:",
        };
        line(out, format_args!("{}", title));
        for node in payload.nodes(side) {
            line(out, format_args!("  {}. {}", node.id, node.label));
        }
        line(out, format_args!(""));
    }

    line(out, format_args!("Correct pairs:"));
    for pair in &payload.correct_pairs {
        let left = payload.label_of(Side::Left, &pair.left_id).unwrap_or(&pair.left_id);
        let right = payload.label_of(Side::Right, &pair.right_id).unwrap_or(&pair.right_id);
        line(out, format_args!("  {} -> {}", left, right));
    }
}

/// Text items print bare, `{id, text}` items by their text.
fn item_text(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

fn join_indices(indices: &[i64]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
