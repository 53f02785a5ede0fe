//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `geofenced.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// `PostgreSQL` settings.
    pub database: DatabaseConfig,
    /// Redis settings.
    pub redis: RedisConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Broadcast hub tuning.
    pub hub: HubSettings,
    /// Transition detection settings.
    pub geofence: GeofenceSettings,
    /// Cross-origin policy.
    pub cors: CorsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `PostgreSQL` + `PostGIS` configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL (e.g. `redis://127.0.0.1:6379`).
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unknown log format `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Capacity of the hub command queue.
    pub command_capacity: usize,
    /// How long a broadcast may wait for queue space, in milliseconds.
    pub broadcast_timeout_ms: u64,
    /// Outbound queue length of each WebSocket subscriber.
    pub subscriber_buffer: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeofenceSettings {
    /// Lifetime of a device's membership snapshot, in seconds.
    pub snapshot_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from `geofenced.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("geofenced.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("GEOFENCE_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("GEOFENCE_PORT") {
            self.server.port = parse_port(&val)?;
        }
        if let Some(val) = var("GEOFENCE_BIND") {
            let (host, port) = val.rsplit_once(':').ok_or_else(|| {
                ConfigError::Validation(format!("GEOFENCE_BIND `{val}` is not host:port"))
            })?;
            self.server.host = host.to_string();
            self.server.port = parse_port(port)?;
        }
        if let Some(val) = var("DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("GEOFENCE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("GEOFENCE_REDIS_URL") {
            self.redis.url = val;
        }
        if let Some(val) = var("GEOFENCE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("GEOFENCE_LOG_FORMAT") {
            self.logging.format = val.parse()?;
        }
        if let Some(val) = var("GEOFENCE_ALLOWED_ORIGINS") {
            self.cors.allowed_origins = val
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be non-zero".to_string(),
            ));
        }
        if self.hub.command_capacity == 0 || self.hub.subscriber_buffer == 0 {
            return Err(ConfigError::Validation(
                "hub queue capacities must be non-zero".to_string(),
            ));
        }
        if self.geofence.snapshot_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "geofence.snapshot_ttl_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.hub.broadcast_timeout_ms)
    }

    #[must_use]
    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.geofence.snapshot_ttl_secs)
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("invalid port `{value}`")))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/geofence".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "geofenced=info,geofence=info,tower_http=debug".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            command_capacity: 1024,
            broadcast_timeout_ms: 250,
            subscriber_buffer: 64,
        }
    }
}

impl Default for GeofenceSettings {
    fn default() -> Self {
        Self {
            snapshot_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.hub.command_capacity, 1024);
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.broadcast_timeout(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'postgres://db/geo'
            max_connections = 4

            [redis]
            url = 'redis://cache:6379'

            [logging]
            filter = 'debug'
            format = 'json'

            [hub]
            command_capacity = 16
            broadcast_timeout_ms = 50
            subscriber_buffer = 8

            [geofence]
            snapshot_ttl_secs = 60

            [cors]
            allowed_origins = ['*']
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.database.url, "postgres://db/geo");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.redis.url, "redis://cache:6379");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.hub.subscriber_buffer, 8);
        assert_eq!(config.broadcast_timeout(), Duration::from_millis(50));
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(60));
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[hub]\nsubscriber_buffer = 4").unwrap();
        assert_eq!(config.hub.subscriber_buffer, 4);
        assert_eq!(config.hub.command_capacity, 1024);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_unknown_log_format_in_toml() {
        let result: Result<Config, _> = toml::from_str("[logging]\nformat = 'xml'");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("GEOFENCE_HOST", "127.0.0.1"),
                ("GEOFENCE_PORT", "7000"),
                ("GEOFENCE_REDIS_URL", "redis://other"),
                ("GEOFENCE_LOG_FORMAT", "JSON"),
                ("GEOFENCE_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ]))
            .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:7000");
        assert_eq!(config.redis.url, "redis://other");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn should_let_bind_override_host_and_port() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("GEOFENCE_PORT", "7000"),
                ("GEOFENCE_BIND", "10.0.0.1:9000"),
            ]))
            .unwrap();
        assert_eq!(config.bind_addr(), "10.0.0.1:9000");
    }

    #[test]
    fn should_prefer_prefixed_database_url() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("DATABASE_URL", "postgres://generic"),
                ("GEOFENCE_DATABASE_URL", "postgres://specific"),
            ]))
            .unwrap();
        assert_eq!(config.database.url, "postgres://specific");
    }

    #[test]
    fn should_fall_back_to_generic_database_url() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[("DATABASE_URL", "postgres://generic")]))
            .unwrap();
        assert_eq!(config.database.url, "postgres://generic");
    }

    #[test]
    fn should_prefer_rust_log_over_geofence_log() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[("GEOFENCE_LOG", "warn"), ("RUST_LOG", "trace")]))
            .unwrap();
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_reject_malformed_port_override() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(env(&[("GEOFENCE_PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_bind_without_port() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(env(&[("GEOFENCE_BIND", "localhost")]));
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_capacities() {
        let mut config = Config::default();
        config.hub.subscriber_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.hub.command_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_snapshot_ttl() {
        let mut config = Config::default();
        config.geofence.snapshot_ttl_secs = 0;
        assert!(config.validate().is_err());
    }
}
