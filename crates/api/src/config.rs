use domain::models::{CreateZoneRequest, GeoPoint, ZoneGeometry};
use domain::services::MonitorSettings;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
    pub dispatch: DispatchConfig,
    pub activity: ActivityConfig,
    pub eviction: EvictionConfig,
    /// Zones loaded into the catalog at startup.
    #[serde(default)]
    pub zones: ZonesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Allowed CORS origins; an empty list allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Monitoring engine configuration: which scorer to run and the
/// engine thresholds handed to the monitor at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Anomaly scorer: heuristic or profile
    #[serde(default = "default_scorer")]
    pub scorer: String,

    #[serde(default)]
    pub thresholds: MonitorSettings,
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Delivery mode: console or webhook
    #[serde(default = "default_dispatch_mode")]
    pub mode: String,

    /// Target URL (required if mode is webhook)
    #[serde(default)]
    pub webhook_url: String,

    /// Shared secret used to sign webhook payloads
    #[serde(default)]
    pub webhook_secret: String,

    /// Delivery timeout in seconds
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: u64,
}

/// Activity feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_activity_capacity")]
    pub capacity_per_entity: usize,

    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,

    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: usize,
}

/// Idle entity eviction job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EvictionConfig {
    #[serde(default = "default_eviction_enabled")]
    pub enabled: bool,

    #[serde(default = "default_max_idle_hours")]
    pub max_idle_hours: i64,

    #[serde(default = "default_eviction_interval")]
    pub interval_minutes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZonesConfig {
    #[serde(default)]
    pub seed: Vec<ZoneSeed>,
}

/// A zone declared in configuration. Kept in snake_case because the
/// config crate lowercases file keys, which would mangle the camelCase
/// API payload shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSeed {
    pub name: String,
    pub zone_type: String,
    pub geometry: ZoneSeedGeometry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneSeedGeometry {
    Circle {
        center_lat: f64,
        center_lng: f64,
        radius_meters: f64,
    },
    Polygon {
        vertices: Vec<GeoPoint>,
    },
}

impl ZoneSeed {
    /// Converts the seed into the same request shape the zones endpoint
    /// accepts, so seeding and API creation share validation.
    pub fn into_request(self) -> Result<CreateZoneRequest, String> {
        let zone_type = self.zone_type.parse()?;
        let geometry = match self.geometry {
            ZoneSeedGeometry::Circle {
                center_lat,
                center_lng,
                radius_meters,
            } => ZoneGeometry::Circle {
                center_lat,
                center_lng,
                radius_meters,
            },
            ZoneSeedGeometry::Polygon { vertices } => ZoneGeometry::Polygon { vertices },
        };
        Ok(CreateZoneRequest {
            name: self.name,
            zone_type,
            geometry,
        })
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_scorer() -> String {
    "heuristic".to_string()
}
fn default_dispatch_mode() -> String {
    "console".to_string()
}
fn default_dispatch_timeout() -> u64 {
    5
}
fn default_activity_capacity() -> usize {
    1000
}
fn default_page_limit() -> usize {
    50
}
fn default_max_page_limit() -> usize {
    200
}
fn default_eviction_enabled() -> bool {
    true
}
fn default_max_idle_hours() -> i64 {
    24
}
fn default_eviction_interval() -> u64 {
    60
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with TOURIST_MONITOR__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TOURIST_MONITOR").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        // Embed defaults directly to avoid file system dependency in tests
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [logging]
            level = "info"
            format = "json"

            [monitor]
            scorer = "heuristic"

            [dispatch]
            mode = "console"
            webhook_url = ""
            webhook_secret = ""
            timeout_secs = 5

            [activity]
            capacity_per_entity = 1000
            default_page_limit = 50
            max_page_limit = 200

            [eviction]
            enabled = true
            max_idle_hours = 24
            interval_minutes = 60
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        // Validate port range
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        match self.monitor.scorer.as_str() {
            "heuristic" | "profile" => {}
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown scorer: {}. Valid values: heuristic, profile",
                    other
                )));
            }
        }

        match self.dispatch.mode.as_str() {
            "console" => {}
            "webhook" => {
                if self.dispatch.webhook_url.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "TOURIST_MONITOR__DISPATCH__WEBHOOK_URL must be set when dispatch mode is webhook"
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown dispatch mode: {}. Valid values: console, webhook",
                    other
                )));
            }
        }

        if self.monitor.thresholds.history_limit == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "monitor.thresholds.history_limit must be at least 1".to_string(),
            ));
        }

        if self.activity.max_page_limit == 0
            || self.activity.default_page_limit > self.activity.max_page_limit
        {
            return Err(ConfigValidationError::InvalidValue(
                "activity.default_page_limit cannot exceed activity.max_page_limit".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .expect("Invalid socket address")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::ZoneType;

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.monitor.scorer, "heuristic");
        assert_eq!(config.monitor.thresholds.stationary_threshold_seconds, 300);
        assert_eq!(config.dispatch.mode, "console");
        assert_eq!(config.activity.capacity_per_entity, 1000);
        assert!(config.eviction.enabled);
        assert!(config.zones.seed.is_empty());
    }

    #[test]
    fn test_config_override() {
        let config = Config::load_for_test(&[
            ("server.port", "9000"),
            ("logging.level", "debug"),
            ("monitor.scorer", "profile"),
            ("monitor.thresholds.history_limit", "40"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.monitor.scorer, "profile");
        assert_eq!(config.monitor.thresholds.history_limit, 40);
        // Untouched thresholds keep their defaults
        assert_eq!(config.monitor.thresholds.repeat_interval_seconds, 5);
    }

    #[test]
    fn test_config_validation_port_zero() {
        let config = Config::load_for_test(&[("server.port", "0")]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("port"));
    }

    #[test]
    fn test_config_validation_unknown_scorer() {
        let config =
            Config::load_for_test(&[("monitor.scorer", "oracle")]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown scorer"));
    }

    #[test]
    fn test_config_validation_webhook_requires_url() {
        let config =
            Config::load_for_test(&[("dispatch.mode", "webhook")]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("TOURIST_MONITOR__DISPATCH__WEBHOOK_URL"));
    }

    #[test]
    fn test_config_validation_page_limits() {
        let config = Config::load_for_test(&[
            ("activity.default_page_limit", "500"),
            ("activity.max_page_limit", "200"),
        ])
        .expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[("server.host", "127.0.0.1"), ("server.port", "3000")])
            .expect("Failed to load config");

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_zone_seed_parses_from_toml() {
        let toml = r#"
            [server]
            port = 8080

            [logging]
            level = "info"
            format = "pretty"

            [monitor]
            scorer = "heuristic"

            [dispatch]
            mode = "console"

            [activity]
            capacity_per_entity = 100

            [eviction]
            enabled = false

            [[zones.seed]]
            name = "Red Fort Perimeter"
            zone_type = "restricted"
            geometry = { kind = "circle", center_lat = 28.6562, center_lng = 77.2410, radius_meters = 500.0 }
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize config");

        assert_eq!(config.zones.seed.len(), 1);
        assert_eq!(config.zones.seed[0].name, "Red Fort Perimeter");

        let request = config.zones.seed[0]
            .clone()
            .into_request()
            .expect("Failed to convert seed");
        assert_eq!(request.zone_type, ZoneType::Restricted);
        assert!(matches!(request.geometry, ZoneGeometry::Circle { .. }));
    }

    #[test]
    fn test_zone_seed_rejects_unknown_type() {
        let seed = ZoneSeed {
            name: "Mystery".to_string(),
            zone_type: "danger".to_string(),
            geometry: ZoneSeedGeometry::Circle {
                center_lat: 0.0,
                center_lng: 0.0,
                radius_meters: 100.0,
            },
        };
        assert!(seed.into_request().is_err());
    }
}
