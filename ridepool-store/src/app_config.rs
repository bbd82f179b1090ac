use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// Fraction of the seat subtotal added as a service fee in quotes.
    #[serde(default)]
    pub service_fee_rate: f64,
    /// Send a confirmation email after each booking when the rider has a profile.
    #[serde(default = "default_true")]
    pub send_confirmation_email: bool,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            service_fee_rate: 0.0,
            send_confirmation_email: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    #[serde(default)]
    pub allow_dev_tokens: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    /// Serve from the in-process store instead of Postgres. Data is lost on restart.
    #[serde(default)]
    pub in_memory: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Rate limiting is off when unset.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_rate_limit")]
    pub requests_per_minute: i64,
}

fn default_rate_limit() -> i64 {
    100
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            requests_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct KafkaConfig {
    /// Events and emails are only logged when unset.
    #[serde(default)]
    pub brokers: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `RIDEPOOL_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("RIDEPOOL").prefix_separator("_").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
