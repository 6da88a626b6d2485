use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Store configuration.
///
/// All sections have embedded defaults; only the database API key must be
/// provided by the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Logical database name on the hosted service.
    #[serde(default = "default_db_name")]
    pub name: String,

    /// Role the bot authenticates as.
    #[serde(default = "default_db_user")]
    pub user: String,

    /// Service credential. Required; there is no usable default.
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per connection or statement, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Seconds before a cached collection read is considered stale.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_name() -> String {
    "guildstore".to_string()
}
fn default_db_user() -> String {
    "guildstore".to_string()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1
}
fn default_cache_ttl() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            api_key: String::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_retry_delay(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl StoreConfig {
    /// Load configuration from the optional config file and environment.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Embedded defaults
    /// 2. config/guildstore.toml (optional)
    /// 3. Environment variables with GUILDSTORE__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/guildstore").required(false))
            .add_source(config::Environment::with_prefix("GUILDSTORE").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds entirely from embedded defaults and overrides, without touching
    /// the file system or the process environment.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [database]
            host = "localhost"
            port = 5432
            name = "guildstore"
            user = "guildstore"
            api_key = ""

            [retry]
            max_attempts = 3
            delay_secs = 1

            [cache]
            ttl_secs = 5

            [logging]
            level = "info"
            format = "json"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Skip validation so partial configs stay usable in tests
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.api_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "GUILDSTORE__DATABASE__API_KEY environment variable must be set".to_string(),
            ));
        }

        if self.database.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "database port cannot be 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Driver options for the configured service endpoint.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.user)
            .password(&self.api_key)
    }
}
