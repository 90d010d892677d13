use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chatdesk_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    let field = |key, env_keys, value: String| Field { key, env_keys, value };

    vec![
        field("database.url", &["CHATDESK_DATABASE_URL"], config.database.url.clone()),
        field(
            "database.max_connections",
            &["CHATDESK_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        field(
            "database.timeout_secs",
            &["CHATDESK_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        field(
            "server.bind_address",
            &["CHATDESK_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        field("server.port", &["CHATDESK_SERVER_PORT"], config.server.port.to_string()),
        field(
            "server.graceful_shutdown_secs",
            &["CHATDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        field(
            "auth.session_secret",
            &["CHATDESK_AUTH_SESSION_SECRET"],
            redact_secret(config.auth.session_secret.expose_secret()),
        ),
        field(
            "auth.session_ttl_secs",
            &["CHATDESK_AUTH_SESSION_TTL_SECS"],
            config.auth.session_ttl_secs.to_string(),
        ),
        field(
            "bot.settings_url",
            &["CHATDESK_BOT_SETTINGS_URL"],
            config.bot.settings_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        ),
        field(
            "bot.api_token",
            &["CHATDESK_BOT_API_TOKEN"],
            config
                .bot
                .api_token
                .as_ref()
                .map(|token| redact_secret(token.expose_secret()))
                .unwrap_or_else(|| "<unset>".to_string()),
        ),
        field("bot.timeout_secs", &["CHATDESK_BOT_TIMEOUT_SECS"], config.bot.timeout_secs.to_string()),
        field(
            "logging.level",
            &["CHATDESK_LOGGING_LEVEL", "CHATDESK_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        field(
            "logging.format",
            &["CHATDESK_LOGGING_FORMAT", "CHATDESK_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

pub(crate) fn detect_config_path() -> Option<PathBuf> {
    ["chatdesk.toml", "config/chatdesk.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the first four characters so operators can tell secrets apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}
