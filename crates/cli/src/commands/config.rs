use std::env;
use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use toml::Value;

use trivia_core::config::{resolve_config_path, AppConfig, LoadOptions};

struct Field {
    key: &'static str,
    value: String,
    /// Checked in order; the first variable that is set wins.
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
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

fn fields(config: &AppConfig) -> Vec<Field> {
    let unset = || "<unset>".to_string();

    vec![
        Field::new("database.url", &config.database.url, &["TRIVIA_DATABASE_URL"]),
        Field::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["TRIVIA_DATABASE_MAX_CONNECTIONS"],
        ),
        Field::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["TRIVIA_DATABASE_TIMEOUT_SECS"],
        ),
        Field::new(
            "chat.bot_token",
            redact_token(config.chat.bot_token.expose_secret()),
            &["TRIVIA_CHAT_BOT_TOKEN", "DISCORD_TOKEN"],
        ),
        Field::new(
            "chat.command_prefix",
            &config.chat.command_prefix,
            &["TRIVIA_CHAT_COMMAND_PREFIX"],
        ),
        Field::new(
            "chat.voice_channel_id",
            config.chat.voice_channel_id.clone().unwrap_or_else(unset),
            &["TRIVIA_CHAT_VOICE_CHANNEL_ID", "GENERAL_VOICE_CHANNEL_ID"],
        ),
        Field::new(
            "sheets.spreadsheet_id",
            config.sheets.spreadsheet_id.clone().unwrap_or_else(unset),
            &["TRIVIA_SHEETS_SPREADSHEET_ID", "SPREADSHEET_ID"],
        ),
        Field::new("sheets.range", &config.sheets.range, &["TRIVIA_SHEETS_RANGE"]),
        Field::new(
            "sheets.access_token",
            if config.sheets.access_token.is_some() { "<redacted>" } else { "<unset>" },
            &["TRIVIA_SHEETS_ACCESS_TOKEN"],
        ),
        Field::new(
            "sheets.api_base_url",
            &config.sheets.api_base_url,
            &["TRIVIA_SHEETS_API_BASE_URL"],
        ),
        Field::new(
            "scrape.history_limit",
            config.scrape.history_limit.to_string(),
            &["TRIVIA_SCRAPE_HISTORY_LIMIT"],
        ),
        Field::new(
            "scrape.title_timeout_secs",
            config.scrape.title_timeout_secs.to_string(),
            &["TRIVIA_SCRAPE_TITLE_TIMEOUT_SECS"],
        ),
        Field::new("scrape.user_agent", &config.scrape.user_agent, &["TRIVIA_SCRAPE_USER_AGENT"]),
        Field::new(
            "server.bind_address",
            &config.server.bind_address,
            &["TRIVIA_SERVER_BIND_ADDRESS"],
        ),
        Field::new(
            "server.health_check_port",
            config.server.health_check_port.to_string(),
            &["TRIVIA_SERVER_HEALTH_CHECK_PORT"],
        ),
        Field::new(
            "logging.level",
            &config.logging.level,
            &["TRIVIA_LOGGING_LEVEL", "TRIVIA_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["TRIVIA_LOGGING_FORMAT", "TRIVIA_LOG_FORMAT"],
        ),
    ]
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

/// Keeps the first token segment, which only encodes the bot's id.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('.') {
        return format!("{prefix}.***");
    }

    "<redacted>".to_string()
}
