use std::fs;
use std::path::Path;

use chatdesk_core::config::{AppConfig, LoadOptions};
use chatdesk_core::prompt::{parse_prompt, render_prompt, PromptData};

use crate::commands::CommandResult;
use crate::remote::SettingsClient;

/// Prompt text file -> structured JSON.
pub fn parse(path: &Path) -> CommandResult {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => return read_failure("prompt parse", path, error),
    };

    json_output("prompt parse", &parse_prompt(&text))
}

/// Structured JSON file -> canonical prompt text.
pub fn render(path: &Path) -> CommandResult {
    match load_prompt_data(path) {
        Ok(data) => CommandResult { exit_code: 0, output: render_prompt(&data) },
        Err(failure) => failure.into_result("prompt render"),
    }
}

/// Fetches the stored prompt; `structured` prints the parsed record instead of the text.
pub fn pull(structured: bool) -> CommandResult {
    let client = match remote_client("prompt pull") {
        Ok(client) => client,
        Err(result) => return result,
    };

    let runtime = match runtime("prompt pull") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    match runtime.block_on(client.fetch()) {
        Ok(payload) if structured => {
            json_output("prompt pull", &parse_prompt(&payload.prompt_system))
        }
        Ok(payload) => CommandResult { exit_code: 0, output: payload.prompt_system },
        Err(error) => CommandResult::failure("prompt pull", "remote", error.to_string(), 8),
    }
}

/// Uploads a prompt. `.json` files are rendered from their structured form first.
pub fn push(path: &Path) -> CommandResult {
    let text = if is_json(path) {
        match load_prompt_data(path) {
            Ok(data) => render_prompt(&data),
            Err(failure) => return failure.into_result("prompt push"),
        }
    } else {
        match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => return read_failure("prompt push", path, error),
        }
    };

    let client = match remote_client("prompt push") {
        Ok(client) => client,
        Err(result) => return result,
    };
    let runtime = match runtime("prompt push") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    match runtime.block_on(client.store(&text)) {
        Ok(stored) => CommandResult::success(
            "prompt push",
            format!("stored {} bytes of prompt text at {}", stored.prompt_system.len(), client.url()),
        ),
        Err(error) => CommandResult::failure("prompt push", "remote", error.to_string(), 8),
    }
}

enum InputFailure {
    Read(String),
    Decode(String),
}

impl InputFailure {
    fn into_result(self, command: &str) -> CommandResult {
        match self {
            Self::Read(message) => CommandResult::failure(command, "input_read", message, 7),
            Self::Decode(message) => CommandResult::failure(command, "input_decode", message, 7),
        }
    }
}

fn load_prompt_data(path: &Path) -> Result<PromptData, InputFailure> {
    let raw = fs::read_to_string(path)
        .map_err(|error| InputFailure::Read(format!("could not read `{}`: {error}", path.display())))?;
    serde_json::from_str::<PromptData>(&raw).map_err(|error| {
        InputFailure::Decode(format!("`{}` is not a structured prompt: {error}", path.display()))
    })
}

fn read_failure(command: &str, path: &Path, error: std::io::Error) -> CommandResult {
    InputFailure::Read(format!("could not read `{}`: {error}", path.display())).into_result(command)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
}

fn json_output(command: &str, data: &PromptData) -> CommandResult {
    match serde_json::to_string_pretty(data) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 7),
    }
}

fn remote_client(command: &str) -> Result<SettingsClient, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })?;

    SettingsClient::from_config(&config.bot)
        .map_err(|error| CommandResult::failure(command, "remote_config", error.to_string(), 2))
}

fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}
