use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::services::analysis::RetryPolicy;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub completion: CompletionSettings,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Map `InvalidInput` to 400 instead of the default 500 (default: false)
    pub strict_status_codes: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Completion service settings as they appear in config.toml.
///
/// The credential itself is never part of the file; only the name of the
/// environment variable that holds it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Request deadline in seconds (accepts 60, "60s", "2m")
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
    pub api_key_env: String,
    pub anthropic_version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 0, a single call)
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    pub jitter: bool,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        if self.max_retries == 0 {
            return RetryPolicy::none();
        }
        RetryPolicy::exponential(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.multiplier,
            self.jitter,
        )
    }
}

/// Immutable completion configuration shared by every request.
///
/// Built once at startup; the credential is resolved from the environment
/// at that point and never re-read.
#[derive(Clone)]
pub struct CompletionConfig {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
    pub anthropic_version: String,
    api_key: Option<String>,
}

impl CompletionConfig {
    pub fn from_settings(settings: &CompletionSettings) -> Self {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &CompletionSettings, api_key: Option<String>) -> Self {
        Self {
            api_base: settings.api_base.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            anthropic_version: settings.anthropic_version.clone(),
            api_key,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("anthropic_version", &self.anthropic_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "readiness")]
#[command(version, about = "Readiness - requirements gap analysis and design checklist service")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Return 400 for invalid input instead of 500
    #[arg(long, value_name = "BOOL")]
    pub strict_status_codes: Option<bool>,

    /// Logging level (overrides config file, e.g., "info,readiness=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Completion model identifier (overrides config file)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Completion request timeout (overrides config file, e.g., "60s", "2m")
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Retries for transient upstream failures (overrides config file)
    #[arg(long, value_name = "COUNT")]
    pub max_retries: Option<u32>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();
        Self::load_with(&cli_args)
    }

    pub fn load_with(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST: Server host (default: 0.0.0.0)
    /// - APP_SERVER_PORT: Server port (default: 8080)
    /// - APP_STRICT_STATUS_CODES: Map invalid input to 400 (true/false)
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,readiness=debug")
    /// - APP_COMPLETION_API_BASE: Completion service base URL
    /// - APP_COMPLETION_MODEL: Completion model identifier
    /// - APP_COMPLETION_TIMEOUT: Request timeout (accepts "60s", "2m")
    /// - APP_RETRY_MAX_RETRIES: Retries for transient upstream failures
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(strict) = std::env::var("APP_STRICT_STATUS_CODES")
            && let Ok(strict) = strict.parse()
        {
            self.server.strict_status_codes = strict;
            tracing::info!(
                "Override server.strict_status_codes from env: {}",
                self.server.strict_status_codes
            );
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(api_base) = std::env::var("APP_COMPLETION_API_BASE") {
            self.completion.api_base = api_base;
            tracing::info!("Override completion.api_base from env: {}", self.completion.api_base);
        }

        if let Ok(model) = std::env::var("APP_COMPLETION_MODEL") {
            self.completion.model = model;
            tracing::info!("Override completion.model from env: {}", self.completion.model);
        }

        if let Ok(timeout) = std::env::var("APP_COMPLETION_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.completion.timeout_secs = val;
                    tracing::info!(
                        "Override completion.timeout_secs from env: {}",
                        self.completion.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_COMPLETION_TIMEOUT '{}': {} (keep {})",
                    timeout,
                    e,
                    self.completion.timeout_secs
                ),
            }
        }

        if let Ok(retries) = std::env::var("APP_RETRY_MAX_RETRIES")
            && let Ok(retries) = retries.parse()
        {
            self.retry.max_retries = retries;
            tracing::info!("Override retry.max_retries from env: {}", self.retry.max_retries);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(strict) = args.strict_status_codes {
            self.server.strict_status_codes = strict;
            tracing::info!("Override server.strict_status_codes from CLI: {}", strict);
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(model) = &args.model {
            self.completion.model = model.clone();
            tracing::info!("Override completion.model from CLI: {}", self.completion.model);
        }

        if let Some(timeout) = &args.timeout {
            match parse_duration_to_secs(timeout) {
                Ok(val) => {
                    self.completion.timeout_secs = val;
                    tracing::info!("Override completion.timeout_secs from CLI: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid --timeout '{}': {} (keep {})",
                    timeout,
                    e,
                    self.completion.timeout_secs
                ),
            }
        }

        if let Some(retries) = args.max_retries {
            self.retry.max_retries = retries;
            tracing::info!("Override retry.max_retries from CLI: {}", retries);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.completion.api_base.trim().is_empty() {
            anyhow::bail!("completion.api_base cannot be empty");
        }
        if self.completion.model.trim().is_empty() {
            anyhow::bail!("completion.model cannot be empty");
        }
        if self.completion.max_tokens == 0 {
            anyhow::bail!("completion.max_tokens must be > 0");
        }
        if !(0.0..=1.0).contains(&self.completion.temperature) {
            anyhow::bail!("completion.temperature must be within 0.0..=1.0");
        }
        if self.completion.timeout_secs == 0 {
            anyhow::bail!("completion.timeout_secs must be > 0");
        }

        if self.retry.multiplier < 1.0 {
            anyhow::bail!("retry.multiplier must be >= 1.0");
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            anyhow::bail!("retry.initial_backoff_ms cannot exceed retry.max_backoff_ms");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080, strict_status_codes: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,readiness=debug".to_string(), file: None }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.anthropic.com/v1".to_string(),
            model: "claude-3-opus-20240229".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout_secs: 60,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            anthropic_version: "2023-06-01".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    let multiplier: u64 = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 60 * 60,
        _ => return Err(format!("unsupported unit: {}", unit)),
    };
    n.checked_mul(multiplier).ok_or_else(|| "value too large".to_string())
}

// Accepts either a number of seconds or a human-friendly string
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '2m'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_single_call_behavior() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.server.strict_status_codes);
        assert_eq!(config.completion.model, "claude-3-opus-20240229");
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.completion.temperature, 0.0);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.policy().max_attempts(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_sections_fill_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9090

            [completion]
            model = "claude-3-5-sonnet-latest"
            timeout_secs = "2m"

            [retry]
            max_retries = 2
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.completion.model, "claude-3-5-sonnet-latest");
        assert_eq!(config.completion.timeout_secs, 120);
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.retry.policy().max_attempts(), 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.completion.temperature = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.completion.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.initial_backoff_ms = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_take_priority() {
        let mut config = Config::default();
        let args = CommandLineArgs {
            server_port: Some(3000),
            strict_status_codes: Some(true),
            model: Some("claude-3-haiku-20240307".to_string()),
            timeout: Some("30s".to_string()),
            max_retries: Some(1),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);

        assert_eq!(config.server.port, 3000);
        assert!(config.server.strict_status_codes);
        assert_eq!(config.completion.model, "claude-3-haiku-20240307");
        assert_eq!(config.completion.timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 1);
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration_to_secs("45"), Ok(45));
        assert_eq!(parse_duration_to_secs("45s"), Ok(45));
        assert_eq!(parse_duration_to_secs("2m"), Ok(120));
        assert_eq!(parse_duration_to_secs("1h"), Ok(3600));
        assert!(parse_duration_to_secs("soon").is_err());
        assert!(parse_duration_to_secs("5w").is_err());
        assert_eq!(parse_duration_to_secs("9999999999999999h"), Err("value too large".to_string()));
    }

    #[test]
    fn test_completion_config_debug_redacts_key() {
        let settings = CompletionSettings::default();
        let config = CompletionConfig::with_api_key(&settings, Some("sk-ant-secret".to_string()));
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-ant-secret"));
        assert!(printed.contains("<redacted>"));
        assert!(config.has_credential());
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
