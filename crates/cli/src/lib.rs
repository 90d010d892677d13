pub mod commands;
pub mod remote;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "chatdesk",
    about = "Chatdesk operator CLI",
    long_about = "Operate the chatbot dashboard: migrations, demo data, config inspection, and structured prompt editing.",
    after_help = "Examples:\n  chatdesk doctor --json\n  chatdesk prompt parse prompt.txt > prompt.json\n  chatdesk prompt push prompt.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo admin, prompt, contacts, and chats (idempotent)")]
    Seed {
        #[arg(long, default_value = commands::seed::DEFAULT_ADMIN_EMAIL)]
        admin_email: String,
        #[arg(long, help = "Password for the demo admin (at least 8 characters)")]
        admin_password: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, DB connectivity, migration state, and bot sync settings")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Convert and sync the bot's structured system prompt")]
    Prompt(PromptCommand),
}

#[derive(Debug, Subcommand)]
enum PromptCommand {
    #[command(about = "Parse prompt text into structured JSON")]
    Parse { file: PathBuf },
    #[command(about = "Render structured JSON into canonical prompt text")]
    Render { file: PathBuf },
    #[command(about = "Fetch the prompt from bot.settings_url")]
    Pull {
        #[arg(long, help = "Print the parsed structured form instead of raw text")]
        structured: bool,
    },
    #[command(about = "Upload a prompt text or structured JSON file to bot.settings_url")]
    Push { file: PathBuf },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { admin_email, admin_password } => {
            commands::seed::run(&admin_email, &admin_password)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Prompt(PromptCommand::Parse { file }) => commands::prompt::parse(&file),
        Command::Prompt(PromptCommand::Render { file }) => commands::prompt::render(&file),
        Command::Prompt(PromptCommand::Pull { structured }) => commands::prompt::pull(structured),
        Command::Prompt(PromptCommand::Push { file }) => commands::prompt::push(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
