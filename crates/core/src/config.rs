//! Configuration management for kbrag.
//!
//! Configuration is resolved in layers, later layers winning:
//! - Built-in defaults
//! - Config file (`KBRAG_CONFIG`, or `.kbrag/config.yaml` in the current directory)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Environment variable holding the bearer token unless `tokenEnv` says otherwise.
pub const DEFAULT_TOKEN_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a log format from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Service region (e.g., "us-east-1")
    pub region: Option<String>,

    /// Knowledge base to query
    pub knowledge_base_id: Option<String>,

    /// Foundation model id or full model ARN
    pub model_id: Option<String>,

    /// Endpoint override (defaults to the regional service endpoint)
    pub endpoint: Option<String>,

    /// Name of the environment variable that holds the bearer token
    pub token_env: String,

    /// Bearer token resolved from `token_env`
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for throttling-class failures (0 disables retrying)
    pub max_retries: u32,

    /// Number of chunks the service should retrieve
    pub number_of_results: Option<u32>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    region: Option<String>,
    knowledge_base_id: Option<String>,
    model_id: Option<String>,
    endpoint: Option<String>,
    token_env: Option<String>,
    connect_timeout_secs: Option<u64>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    number_of_results: Option<u32>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            region: None,
            knowledge_base_id: None,
            model_id: None,
            endpoint: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            token: None,
            connect_timeout_secs: 10,
            timeout_secs: 60,
            max_retries: 0,
            number_of_results: None,
            log_level: None,
            log_format: LogFormat::Text,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `KBRAG_CONFIG`: Path to config file
    /// - `AWS_REGION` / `AWS_DEFAULT_REGION`: Service region
    /// - `KBRAG_KNOWLEDGE_BASE_ID`: Knowledge base id
    /// - `KBRAG_MODEL_ID`: Model id or ARN
    /// - `KBRAG_ENDPOINT`: Endpoint override
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// The bearer token is read from the variable named by `tokenEnv`
    /// (`AWS_BEARER_TOKEN_BEDROCK` unless configured).
    ///
    /// # Example
    /// ```no_run
    /// use kbrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Region: {:?}", config.region);
    /// ```
    pub fn load() -> AppResult<Self> {
        let explicit = std::env::var("KBRAG_CONFIG").ok().map(PathBuf::from);
        Self::load_from(explicit)
    }

    /// Load configuration using an explicit config file path.
    ///
    /// An explicit path that does not exist is an error; the implicit
    /// `.kbrag/config.yaml` is optional.
    pub fn load_from(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Some(path)
            }
            None => {
                let implicit = PathBuf::from(".kbrag/config.yaml");
                implicit.exists().then_some(implicit)
            }
        };

        if let Some(path) = config_path {
            config = config.merge_yaml(&path)?;
        }

        // Environment variables override YAML config
        Ok(config.merge_env(|key| std::env::var(key).ok()))
    }

    /// Apply environment variables, read through `lookup`.
    ///
    /// Blank values count as unset, except `NO_COLOR` which only needs to exist.
    fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")) {
            self.region = Some(region);
        }

        if let Some(kb) = non_empty("KBRAG_KNOWLEDGE_BASE_ID") {
            self.knowledge_base_id = Some(kb);
        }

        if let Some(model) = non_empty("KBRAG_MODEL_ID") {
            self.model_id = Some(model);
        }

        if let Some(endpoint) = non_empty("KBRAG_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }

        self.token = non_empty(&self.token_env);

        if let Some(level) = non_empty("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        self
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.clone().merge_file(file, path))
    }

    fn merge_file(mut self, file: ConfigFile, path: &Path) -> Self {
        self.config_file = Some(path.to_path_buf());

        if file.region.is_some() {
            self.region = file.region;
        }
        if file.knowledge_base_id.is_some() {
            self.knowledge_base_id = file.knowledge_base_id;
        }
        if file.model_id.is_some() {
            self.model_id = file.model_id;
        }
        if file.endpoint.is_some() {
            self.endpoint = file.endpoint;
        }
        if let Some(token_env) = file.token_env {
            self.token_env = token_env;
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(retries) = file.max_retries {
            self.max_retries = retries;
        }
        if file.number_of_results.is_some() {
            self.number_of_results = file.number_of_results;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(format) = logging.format {
                self.log_format = format;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the config file and environment.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(region) = overrides.region {
            self.region = Some(region);
        }

        if let Some(kb) = overrides.knowledge_base_id {
            self.knowledge_base_id = Some(kb);
        }

        if let Some(model) = overrides.model_id {
            self.model_id = Some(model);
        }

        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = Some(endpoint);
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Check that the settings needed to issue a query are present.
    ///
    /// A bare model id needs a region to become a model ARN, and the
    /// default endpoint is regional as well.
    pub fn validate(&self) -> AppResult<()> {
        if self.knowledge_base_id.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::InvalidArgument(
                "knowledge base id is not set (use --knowledge-base-id or KBRAG_KNOWLEDGE_BASE_ID)"
                    .to_string(),
            ));
        }

        if self.model_id.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::InvalidArgument(
                "model id is not set (use --model-id or KBRAG_MODEL_ID)".to_string(),
            ));
        }

        if self.region.as_deref().map_or(true, str::is_empty) && self.endpoint.is_none() {
            return Err(AppError::Config(
                "region is not set (use --region or AWS_REGION)".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "timeoutSecs must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(AppError::Config(
                "connectTimeoutSecs must be greater than 0".to_string(),
            ));
        }

        if self.number_of_results == Some(0) {
            return Err(AppError::Config(
                "numberOfResults must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as YAML with the token redacted.
    pub fn to_redacted_yaml(&self) -> AppResult<String> {
        let mut value = serde_yaml::to_value(self)?;
        if let serde_yaml::Value::Mapping(ref mut map) = value {
            let redacted = if self.token.is_some() { "<redacted>" } else { "<unset>" };
            map.insert("token".into(), redacted.into());
        }
        Ok(serde_yaml::to_string(&value)?)
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub region: Option<String>,
    pub knowledge_base_id: Option<String>,
    pub model_id: Option<String>,
    pub endpoint: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub verbose: bool,
    pub no_color: bool,
}
