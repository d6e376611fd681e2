pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "trivia",
    about = "Trivia link archive operator CLI",
    long_about = "Operate the trivia bot's link archive: migrations, readiness checks, config inspection, and archive listing.",
    after_help = "Examples:\n  trivia doctor --json\n  trivia config\n  trivia links --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, bot token readiness, sheet mirror, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the most recently archived links as JSON")]
    Links {
        #[arg(
            long,
            default_value_t = commands::links::DEFAULT_LIMIT,
            help = "Maximum number of links to list"
        )]
        limit: u32,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Links { limit } => commands::links::run(limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
