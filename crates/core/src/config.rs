use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
    pub sheets: SheetsConfig,
    pub scrape: ScrapeConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub bot_token: SecretString,
    pub command_prefix: String,
    /// Voice channel whose members are used by `??mta`.
    pub voice_channel_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub range: String,
    pub access_token: Option<SecretString>,
    pub api_base_url: String,
}

impl SheetsConfig {
    pub fn is_enabled(&self) -> bool {
        self.spreadsheet_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub history_limit: u32,
    pub title_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bot_token: Option<String>,
    pub voice_channel_id: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub sheets_access_token: Option<String>,
    pub history_limit: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_FILE: &str = "trivia.toml";
pub const NESTED_CONFIG_FILE: &str = "config/trivia.toml";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://trivia.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            chat: ChatConfig {
                bot_token: String::new().into(),
                command_prefix: "??".to_string(),
                voice_channel_id: None,
            },
            sheets: SheetsConfig {
                spreadsheet_id: None,
                range: "A:E".to_string(),
                access_token: None,
                api_base_url: "https://sheets.googleapis.com".to_string(),
            },
            scrape: ScrapeConfig {
                history_limit: 10_000,
                title_timeout_secs: 10,
                user_agent: "trivia-scraper/0.1 (link archive)".to_string(),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), health_check_port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(bot_token) = chat.bot_token {
                self.chat.bot_token = secret_value(bot_token);
            }
            if let Some(command_prefix) = chat.command_prefix {
                self.chat.command_prefix = command_prefix;
            }
            if let Some(voice_channel_id) = chat.voice_channel_id {
                self.chat.voice_channel_id = Some(voice_channel_id);
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(spreadsheet_id) = sheets.spreadsheet_id {
                self.sheets.spreadsheet_id = Some(spreadsheet_id);
            }
            if let Some(range) = sheets.range {
                self.sheets.range = range;
            }
            if let Some(access_token) = sheets.access_token {
                self.sheets.access_token = Some(secret_value(access_token));
            }
            if let Some(api_base_url) = sheets.api_base_url {
                self.sheets.api_base_url = api_base_url;
            }
        }

        if let Some(scrape) = patch.scrape {
            if let Some(history_limit) = scrape.history_limit {
                self.scrape.history_limit = history_limit;
            }
            if let Some(title_timeout_secs) = scrape.title_timeout_secs {
                self.scrape.title_timeout_secs = title_timeout_secs;
            }
            if let Some(user_agent) = scrape.user_agent {
                self.scrape.user_agent = user_agent;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TRIVIA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TRIVIA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("TRIVIA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TRIVIA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TRIVIA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        // Bare names keep existing `.env` files working.
        let bot_token = read_env("TRIVIA_CHAT_BOT_TOKEN").or_else(|| read_env("DISCORD_TOKEN"));
        if let Some(value) = bot_token {
            self.chat.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("TRIVIA_CHAT_COMMAND_PREFIX") {
            self.chat.command_prefix = value;
        }
        let voice_channel = read_env("TRIVIA_CHAT_VOICE_CHANNEL_ID")
            .or_else(|| read_env("GENERAL_VOICE_CHANNEL_ID"));
        if let Some(value) = voice_channel {
            self.chat.voice_channel_id = Some(value);
        }

        let spreadsheet_id =
            read_env("TRIVIA_SHEETS_SPREADSHEET_ID").or_else(|| read_env("SPREADSHEET_ID"));
        if let Some(value) = spreadsheet_id {
            self.sheets.spreadsheet_id = Some(value);
        }
        if let Some(value) = read_env("TRIVIA_SHEETS_RANGE") {
            self.sheets.range = value;
        }
        if let Some(value) = read_env("TRIVIA_SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TRIVIA_SHEETS_API_BASE_URL") {
            self.sheets.api_base_url = value;
        }

        if let Some(value) = read_env("TRIVIA_SCRAPE_HISTORY_LIMIT") {
            self.scrape.history_limit = parse_u32("TRIVIA_SCRAPE_HISTORY_LIMIT", &value)?;
        }
        if let Some(value) = read_env("TRIVIA_SCRAPE_TITLE_TIMEOUT_SECS") {
            self.scrape.title_timeout_secs =
                parse_u64("TRIVIA_SCRAPE_TITLE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TRIVIA_SCRAPE_USER_AGENT") {
            self.scrape.user_agent = value;
        }

        if let Some(value) = read_env("TRIVIA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TRIVIA_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("TRIVIA_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level = read_env("TRIVIA_LOGGING_LEVEL").or_else(|| read_env("TRIVIA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TRIVIA_LOGGING_FORMAT").or_else(|| read_env("TRIVIA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bot_token) = overrides.bot_token {
            self.chat.bot_token = secret_value(bot_token);
        }
        if let Some(voice_channel_id) = overrides.voice_channel_id {
            self.chat.voice_channel_id = Some(voice_channel_id);
        }
        if let Some(spreadsheet_id) = overrides.spreadsheet_id {
            self.sheets.spreadsheet_id = Some(spreadsheet_id);
        }
        if let Some(access_token) = overrides.sheets_access_token {
            self.sheets.access_token = Some(secret_value(access_token));
        }
        if let Some(history_limit) = overrides.history_limit {
            self.scrape.history_limit = history_limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_chat(&self.chat)?;
        validate_sheets(&self.sheets)?;
        validate_scrape(&self.scrape)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    let bot_token = chat.bot_token.expose_secret();
    if bot_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "chat.bot_token is required. Set TRIVIA_CHAT_BOT_TOKEN (or DISCORD_TOKEN) to the bot's token".to_string(),
        ));
    }
    if bot_token.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "chat.bot_token must not contain whitespace (check for a stray newline or quote)"
                .to_string(),
        ));
    }

    let prefix = chat.command_prefix.as_str();
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "chat.command_prefix must be a non-empty marker without whitespace (default `??`)"
                .to_string(),
        ));
    }

    if let Some(voice_channel_id) = &chat.voice_channel_id {
        if voice_channel_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chat.voice_channel_id must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    if !sheets.api_base_url.starts_with("http://") && !sheets.api_base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "sheets.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if sheets.range.trim().is_empty() {
        return Err(ConfigError::Validation("sheets.range must not be empty".to_string()));
    }

    if sheets.is_enabled() {
        let missing = sheets
            .access_token
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "sheets.access_token is required when sheets.spreadsheet_id is set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_scrape(scrape: &ScrapeConfig) -> Result<(), ConfigError> {
    if scrape.history_limit == 0 || scrape.history_limit > 100_000 {
        return Err(ConfigError::Validation(
            "scrape.history_limit must be in range 1..=100000".to_string(),
        ));
    }

    if scrape.title_timeout_secs == 0 || scrape.title_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "scrape.title_timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    chat: Option<ChatPatch>,
    sheets: Option<SheetsPatch>,
    scrape: Option<ScrapePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    bot_token: Option<String>,
    command_prefix: Option<String>,
    voice_channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    spreadsheet_id: Option<String>,
    range: Option<String>,
    access_token: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapePatch {
    history_limit: Option<u32>,
    title_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "TRIVIA_DATABASE_URL",
        "TRIVIA_CHAT_BOT_TOKEN",
        "TRIVIA_CHAT_VOICE_CHANNEL_ID",
        "TRIVIA_SHEETS_SPREADSHEET_ID",
        "TRIVIA_SHEETS_ACCESS_TOKEN",
        "TRIVIA_SCRAPE_HISTORY_LIMIT",
        "TRIVIA_LOG_LEVEL",
        "TRIVIA_LOG_FORMAT",
        "DISCORD_TOKEN",
        "SPREADSHEET_ID",
        "GENERAL_VOICE_CHANNEL_ID",
        "TEST_TRIVIA_BOT_TOKEN",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in MANAGED_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("TEST_TRIVIA_BOT_TOKEN", "bot-token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("trivia.toml");
            fs::write(
                &path,
                r#"
[chat]
bot_token = "${TEST_TRIVIA_BOT_TOKEN}"
voice_channel_id = "778899"

[scrape]
history_limit = 500
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.chat.bot_token.expose_secret() == "bot-token-from-env",
                "bot token should be interpolated from environment",
            )?;
            ensure(
                config.chat.voice_channel_id.as_deref() == Some("778899"),
                "voice channel should come from file",
            )?;
            ensure(config.scrape.history_limit == 500, "history limit should come from file")?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn legacy_bot_env_names_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("DISCORD_TOKEN", "legacy-token");
        env::set_var("SPREADSHEET_ID", "sheet-123");
        env::set_var("TRIVIA_SHEETS_ACCESS_TOKEN", "ya29.token");
        env::set_var("GENERAL_VOICE_CHANNEL_ID", "4455");
        env::set_var("TRIVIA_LOG_LEVEL", "warn");
        env::set_var("TRIVIA_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.chat.bot_token.expose_secret() == "legacy-token", "legacy bot token")?;
            ensure(
                config.sheets.spreadsheet_id.as_deref() == Some("sheet-123"),
                "legacy spreadsheet id",
            )?;
            ensure(config.sheets.is_enabled(), "sheets should be enabled by spreadsheet id")?;
            ensure(
                config.chat.voice_channel_id.as_deref() == Some("4455"),
                "legacy voice channel id",
            )?;
            ensure(config.logging.level == "warn", "log level alias")?;
            ensure(matches!(config.logging.format, LogFormat::Pretty), "log format alias")?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("TRIVIA_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("TRIVIA_CHAT_BOT_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("trivia.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[chat]
bot_token = "token-from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.chat.bot_token.expose_secret() == "token-from-env",
                "env bot token should win over file and defaults",
            )?;
            ensure(config.chat.command_prefix == "??", "default command prefix")?;
            Ok(())
        })();

        clear_vars();
        result
    }

    #[test]
    fn missing_bot_token_fails_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("chat.bot_token")),
            "validation failure should mention chat.bot_token",
        )
    }

    #[test]
    fn spreadsheet_without_access_token_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                bot_token: Some("token".to_string()),
                spreadsheet_id: Some("sheet-1".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("sheets.access_token")),
            "validation failure should mention sheets.access_token",
        )
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("TRIVIA_CHAT_BOT_TOKEN", "token");
        env::set_var("TRIVIA_SCRAPE_HISTORY_LIMIT", "lots");

        let result = AppConfig::load(LoadOptions::default());
        clear_vars();

        ensure(
            matches!(result, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "TRIVIA_SCRAPE_HISTORY_LIMIT"),
            "invalid history limit should be reported by key",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    bot_token: Some("bot-secret-value".to_string()),
                    spreadsheet_id: Some("sheet-1".to_string()),
                    sheets_access_token: Some("sheets-secret-value".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("bot-secret-value"), "debug output should not contain bot token")?;
            ensure(
                !debug.contains("sheets-secret-value"),
                "debug output should not contain sheets token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars();
        result
    }
}
