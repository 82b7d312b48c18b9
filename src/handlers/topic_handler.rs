use std::io::Write;

use crate::{
    config::Config,
    errors::AppResult,
    handlers::Outcome,
    models::domain::{Question, Topic},
    models::dto::NewTopicRequest,
    services::EditorSession,
};

pub fn courses(session: &EditorSession, out: &mut impl Write) -> AppResult<Outcome> {
    let catalog = session.courses()?;
    for course in &catalog.courses {
        writeln!(out, "{}", course.id)?;
    }
    Ok(Outcome::Success)
}

pub fn topics(session: &mut EditorSession, course: &str, out: &mut impl Write) -> AppResult<Outcome> {
    let index = session.open_course(course)?;
    for entry in &index.topics {
        writeln!(out, "{}\t{}", entry.id, entry.file)?;
    }
    Ok(Outcome::Success)
}

pub fn new_topic(
    session: &mut EditorSession,
    course: &str,
    topic_id: &str,
    name: Option<&str>,
    out: &mut impl Write,
) -> AppResult<Outcome> {
    session.open_course(course)?;
    session.create_topic(NewTopicRequest::new(topic_id, name))?;
    session.save_topic()?;

    let topic = session.topic();
    writeln!(out, "Created topic {} ({})", topic.topic_id, topic.topic_name)?;
    Ok(Outcome::Success)
}

pub fn list(
    session: &mut EditorSession,
    course: &str,
    topic_id: &str,
    out: &mut impl Write,
) -> AppResult<Outcome> {
    session.open_course(course)?;
    let topic = session.open_topic(topic_id)?;

    writeln!(out, "{} ({} questions)", topic.topic_name, topic.questions.len())?;
    for (index, question) in topic.questions.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. [{}] {}: {}",
            index + 1,
            question.question_type(),
            question.id,
            question.snippet()
        )?;
    }
    Ok(Outcome::Success)
}

pub fn validate(
    session: &mut EditorSession,
    config: &Config,
    course: &str,
    topic_id: &str,
    all: bool,
    out: &mut impl Write,
) -> AppResult<Outcome> {
    session.open_course(course)?;
    let topic = session.open_topic(topic_id)?;

    warn_missing_images(config, course, topic);
    for id in topic.duplicate_ids() {
        log::warn!("More than one question uses id '{}'", id);
    }

    let failures = if all {
        topic.violations()
    } else {
        topic.validate_all().err().into_iter().collect()
    };
    if failures.is_empty() {
        writeln!(out, "OK")?;
        return Ok(Outcome::Success);
    }
    for failure in &failures {
        writeln!(out, "{}", failure)?;
    }
    Ok(Outcome::Invalid)
}

/// Image references are only checked for presence under the images root.
fn warn_missing_images(config: &Config, course: &str, topic: &Topic) {
    for question in &topic.questions {
        for reference in image_references(question) {
            let path = match config.image_path(course, reference) {
                Ok(path) => path,
                Err(err) => {
                    log::warn!(
                        "Question '{}' has an unusable image reference: {}",
                        question.id,
                        err
                    );
                    continue;
                }
            };
            if !path.exists() {
                log::warn!(
                    "Question '{}' references missing image {}",
                    question.id,
                    path.display()
                );
            }
        }
    }
}

fn image_references(question: &Question) -> impl Iterator<Item = &str> {
    question
        .image
        .as_deref()
        .into_iter()
        .chain(question.explanation_image.as_deref())
}

pub fn schema(out: &mut impl Write) -> AppResult<Outcome> {
    let schema = schemars::schema_for!(Topic);
    writeln!(out, "{}", serde_json::to_string_pretty(&schema)?)?;
    Ok(Outcome::Success)
}
