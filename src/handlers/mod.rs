pub mod question_handler;
pub mod topic_handler;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::JsonFileRepository,
    services::EditorSession,
};

pub use question_handler::DraftArgs;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the courses in the data directory
    Courses,
    /// List the topics declared by a course
    Topics { course: String },
    /// Declare a new topic in a course and write its empty topic file
    NewTopic {
        course: String,
        id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// List the questions of a topic
    List { course: String, topic: String },
    /// Validate every question of a topic
    Validate {
        course: String,
        topic: String,
        /// Report every failing question instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Validate a question or topic JSON file outside the data directory
    Check {
        file: PathBuf,
        #[arg(long)]
        all: bool,
    },
    /// Rewrite connect_nodes questions of a question or topic file into canonical form
    Normalize {
        file: PathBuf,
        /// Write the result back instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Show a question the way a learner sees it
    Preview {
        course: String,
        topic: String,
        question_id: String,
    },
    /// Add a question to a topic, or replace one with --replace
    Add {
        course: String,
        topic: String,
        #[command(flatten)]
        draft: DraftArgs,
        /// 1-based position of the question to replace
        #[arg(long)]
        replace: Option<usize>,
    },
    /// Delete the question at a 1-based position
    Delete {
        course: String,
        topic: String,
        position: usize,
    },
    /// Print the JSON Schema of a topic file
    Schema,
}

/// How a command that ran to completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Content was checked and found invalid or lossy.
    Invalid,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Invalid => 1,
        }
    }
}

pub fn run(command: Command, config: &Config, out: &mut impl Write) -> AppResult<Outcome> {
    log::debug!("Running {:?} against {}", command, config.data_dir().display());
    let session = || EditorSession::new(Arc::new(JsonFileRepository::new(config.data_dir())));

    match command {
        Command::Courses => topic_handler::courses(&session(), out),
        Command::Topics { course } => topic_handler::topics(&mut session(), &course, out),
        Command::NewTopic { course, id, name } => {
            topic_handler::new_topic(&mut session(), &course, &id, name.as_deref(), out)
        }
        Command::List { course, topic } => {
            topic_handler::list(&mut session(), &course, &topic, out)
        }
        Command::Validate { course, topic, all } => {
            topic_handler::validate(&mut session(), config, &course, &topic, all, out)
        }
        Command::Check { file, all } => question_handler::check(&file, all, out),
        Command::Normalize { file, write } => question_handler::normalize(&file, write, out),
        Command::Preview {
            course,
            topic,
            question_id,
        } => question_handler::preview(&mut session(), &course, &topic, &question_id, out),
        Command::Add {
            course,
            topic,
            draft,
            replace,
        } => question_handler::add(&mut session(), &course, &topic, draft, replace, out),
        Command::Delete {
            course,
            topic,
            position,
        } => question_handler::delete(&mut session(), &course, &topic, position, out),
        Command::Schema => topic_handler::schema(out),
    }
}
