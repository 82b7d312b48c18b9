use std::fs;
use std::io::Write;
use std::path::Path;

use clap::Args;
use serde_json::Value;

use crate::{
    errors::{AppError, AppResult},
    handlers::Outcome,
    models::document,
    models::dto::QuestionDraft,
    repositories::topic_repository::write_json,
    services::{
        question_validator::QuestionValidator, shape_normalizer::ShapeNormalizer, EditorSession,
        PreviewRenderer,
    },
};

/// Question fields for `add`. Repeated flags become one line each.
#[derive(Debug, Clone, Default, Args)]
pub struct DraftArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long = "type")]
    pub question_type: String,
    #[arg(long)]
    pub question: String,
    #[arg(long, default_value = "")]
    pub explanation: String,
    #[arg(long, default_value = "")]
    pub image: String,
    #[arg(long, default_value = "")]
    pub explanation_image: String,
    /// true_false answer: true or false
    #[arg(long = "correct-flag", default_value = "")]
    pub correct_flag: String,
    #[arg(long = "option")]
    pub options: Vec<String>,
    /// Correct index, or comma-separated indices
    #[arg(long, default_value = "")]
    pub correct: String,
    /// Comma-separated accepted answers
    #[arg(long, default_value = "")]
    pub answers: String,
    /// Comma-separated cells of one table row
    #[arg(long = "row")]
    pub rows: Vec<String>,
    #[arg(long = "item")]
    pub items: Vec<String>,
    #[arg(long = "left")]
    pub left_nodes: Vec<String>,
    #[arg(long = "right")]
    pub right_nodes: Vec<String>,
    /// `left label = right label`
    #[arg(long = "pair")]
    pub pairs: Vec<String>,
}

impl From<DraftArgs> for QuestionDraft {
    fn from(args: DraftArgs) -> Self {
        QuestionDraft {
            id: args.id,
            question_type: args.question_type,
            question: args.question,
            explanation: args.explanation,
            image: args.image,
            explanation_image: args.explanation_image,
            correct_flag: args.correct_flag,
            options: args.options.join("\n"),
            correct: args.correct,
            answers: args.answers,
            table: args.rows.join("\n"),
            items: args.items.join("\n"),
            left_nodes: args.left_nodes.join("\n"),
            right_nodes: args.right_nodes.join("\n"),
            pairs: args.pairs.join("\n"),
        }
    }
}

fn read_document(path: &Path) -> AppResult<Value> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::StorageError(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&raw)?)
}

/// A topic document's question list, or the document itself as a single
/// question.
fn question_entries(doc: &mut Value) -> Vec<&mut Value> {
    if doc.get("questions").map_or(false, Value::is_array) {
        match doc.get_mut("questions") {
            Some(Value::Array(entries)) => entries.iter_mut().collect(),
            _ => Vec::new(),
        }
    } else {
        vec![doc]
    }
}

pub fn check(path: &Path, all: bool, out: &mut impl Write) -> AppResult<Outcome> {
    let mut doc = read_document(path)?;
    let mut outcome = Outcome::Success;

    for (index, entry) in question_entries(&mut doc).into_iter().enumerate() {
        ShapeNormalizer::normalize_document(entry);
        let (valid, reason) = QuestionValidator::verdict(entry);
        if valid {
            continue;
        }
        let id = document::text(entry.get("id")).unwrap_or_default();
        writeln!(out, "Question #{} ({}): {}", index + 1, id, reason)?;
        outcome = Outcome::Invalid;
        if !all {
            break;
        }
    }

    if outcome == Outcome::Success {
        writeln!(out, "OK")?;
    }
    Ok(outcome)
}

/// Lossy normalization (dropped pairs or skipped nodes) ends as `Invalid`.
pub fn normalize(path: &Path, write: bool, out: &mut impl Write) -> AppResult<Outcome> {
    let mut doc = read_document(path)?;
    let mut outcome = Outcome::Success;
    let mut changed = false;

    for (index, entry) in question_entries(&mut doc).into_iter().enumerate() {
        let Some(report) = ShapeNormalizer::normalize_document(entry) else {
            continue;
        };
        changed |= !report.is_unchanged();
        for dropped in &report.dropped_pairs {
            log::warn!(
                "Question #{}: dropped pair #{}: {}",
                index + 1,
                dropped.position + 1,
                dropped.reason
            );
        }
        for skipped in &report.skipped_nodes {
            log::warn!(
                "Question #{}: skipped {} node #{}",
                index + 1,
                skipped.side,
                skipped.position + 1
            );
        }
        for reassigned in &report.reassigned_ids {
            log::warn!(
                "Question #{}: {} node id '{}' reassigned to '{}'",
                index + 1,
                reassigned.side,
                reassigned.from,
                reassigned.to
            );
        }
        if !report.is_lossless() {
            outcome = Outcome::Invalid;
        }
    }

    if write {
        if changed {
            write_json(path, &doc)?;
            log::info!("Rewrote {}", path.display());
        } else {
            log::info!("{} is already canonical", path.display());
        }
    } else {
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
    }
    Ok(outcome)
}

pub fn preview(
    session: &mut EditorSession,
    course: &str,
    topic_id: &str,
    question_id: &str,
    out: &mut impl Write,
) -> AppResult<Outcome> {
    session.open_course(course)?;
    let topic = session.open_topic(topic_id)?;
    let question = topic
        .questions
        .iter()
        .find(|q| q.id == question_id)
        .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))?;

    write!(out, "{}", PreviewRenderer::render_preview(question))?;
    Ok(Outcome::Success)
}

pub fn add(
    session: &mut EditorSession,
    course: &str,
    topic_id: &str,
    draft: DraftArgs,
    replace: Option<usize>,
    out: &mut impl Write,
) -> AppResult<Outcome> {
    session.open_course(course)?;
    session.open_topic(topic_id)?;
    if let Some(position) = replace {
        session.select_question(position.saturating_sub(1))?;
    }

    let doc = QuestionDraft::from(draft).into_document();
    let position = session.save_question_document(doc)?;
    session.save_topic()?;

    let question = &session.topic().questions[position];
    writeln!(out, "Saved question #{} ({})", position + 1, question.id)?;
    Ok(Outcome::Success)
}

pub fn delete(
    session: &mut EditorSession,
    course: &str,
    topic_id: &str,
    position: usize,
    out: &mut impl Write,
) -> AppResult<Outcome> {
    session.open_course(course)?;
    session.open_topic(topic_id)?;
    let removed = session.delete_question(position.saturating_sub(1))?;
    session.save_topic()?;

    writeln!(out, "Deleted question #{} ({})", position, removed.id)?;
    Ok(Outcome::Success)
}
