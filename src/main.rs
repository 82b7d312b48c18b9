use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use quiz_forge::{
    config::Config,
    handlers::{self, Command},
};

/// Author, validate and normalize quiz question files.
///
/// Exit codes: 0 success, 1 content failed validation, 2 any other error.
#[derive(Debug, Parser)]
#[command(name = "quiz-forge", version, about)]
struct Args {
    /// Content root holding courses.json (overrides QUIZ_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(data_dir) = args.data_dir {
        config = config.with_data_dir(data_dir);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match handlers::run(args.command, &config, &mut out) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            log::error!("{} ({})", err, err.error_code());
            ExitCode::from(err.exit_code())
        }
    }
}
