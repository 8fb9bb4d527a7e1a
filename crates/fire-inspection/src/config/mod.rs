use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";
/// Upper bound for the due-soon and upcoming windows, in days.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Deployment stage, read from `APP_ENV`. Unknown values fall back to development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub inspection: InspectionConfig,
}

impl AppConfig {
    /// Read `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment = read("APP_ENV")
            .map(|value| AppEnvironment::parse(&value))
            .unwrap_or_default();

        let port = match read("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let server = ServerConfig {
            host: read("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        };
        let telemetry = TelemetryConfig {
            log_level: read("APP_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };

        let defaults = InspectionConfig::default();
        let inspection = InspectionConfig {
            due_soon_days: window_days(&read, "INSPECTION_DUE_SOON_DAYS", defaults.due_soon_days)?,
            upcoming_days: window_days(&read, "INSPECTION_UPCOMING_DAYS", defaults.upcoming_days)?,
            evidence_max_bytes: number(&read, "EVIDENCE_MAX_BYTES", defaults.evidence_max_bytes)?,
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            inspection,
        })
    }
}

fn number<T, F>(read: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match read(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
    }
}

/// A day window in `0..=MAX_WINDOW_DAYS`.
fn window_days<F>(read: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let days = number(read, key, default)?;
    if (0..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::InvalidNumber {
            key,
            value: days.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse::<IpAddr>()
                .map_err(|source| ConfigError::InvalidHost {
                    host: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Windows and limits applied by the inspection workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionConfig {
    /// Days ahead of a violation deadline that count as "due soon".
    pub due_soon_days: i64,
    /// Days ahead of a scheduled inspection that count as "upcoming".
    pub upcoming_days: i64,
    pub evidence_max_bytes: usize,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            due_soon_days: 7,
            upcoming_days: 7,
            evidence_max_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16 (found '{0}')")]
    InvalidPort(String),
    #[error("APP_HOST '{host}' must be localhost or an IPv4/IPv6 address")]
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },
    #[error("{key} must be a whole number in range (found '{value}')")]
    InvalidNumber { key: &'static str, value: String },
}
