use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::reference::{ReferenceDataError, ReferenceTables};

/// Certificate price assumed by cost projections when none is configured.
pub const DEFAULT_CERTIFICATE_PRICE_EUR: f64 = 80.0;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the engine and its service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let reference_data = env::var("CBAM_REFERENCE_DATA")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let certificate_price_eur = match env::var("CBAM_CERTIFICATE_PRICE_EUR") {
            Ok(raw) => parse_price(&raw)?,
            Err(_) => DEFAULT_CERTIFICATE_PRICE_EUR,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig {
                reference_data,
                certificate_price_eur,
            },
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, ConfigError> {
    let invalid = || ConfigError::InvalidCertificatePrice {
        value: raw.to_string(),
    };
    let price = raw.trim().parse::<f64>().map_err(|_| invalid())?;
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(invalid())
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Reference-data source and pricing inputs for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// JSON table set replacing the builtin edition.
    pub reference_data: Option<PathBuf>,
    pub certificate_price_eur: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_data: None,
            certificate_price_eur: DEFAULT_CERTIFICATE_PRICE_EUR,
        }
    }
}

impl EngineConfig {
    pub fn reference_tables(&self) -> Result<ReferenceTables, ReferenceDataError> {
        match &self.reference_data {
            Some(path) => ReferenceTables::from_path(path),
            None => Ok(ReferenceTables::builtin()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCertificatePrice { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCertificatePrice { value } => write!(
                f,
                "CBAM_CERTIFICATE_PRICE_EUR must be a non-negative number, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidCertificatePrice { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("CBAM_REFERENCE_DATA");
        env::remove_var("CBAM_CERTIFICATE_PRICE_EUR");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_invalid_port_and_price() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "70000");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));

        reset_env();
        env::set_var("CBAM_CERTIFICATE_PRICE_EUR", "-3");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidCertificatePrice { .. })
        ));
        reset_env();
    }

    #[test]
    fn reads_engine_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("CBAM_CERTIFICATE_PRICE_EUR", "72.5");
        env::set_var("CBAM_REFERENCE_DATA", "./tables/2027.json");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.engine.certificate_price_eur, 72.5);
        assert_eq!(
            config.engine.reference_data,
            Some(PathBuf::from("./tables/2027.json"))
        );
        reset_env();
    }

    #[test]
    fn builtin_tables_are_used_without_a_path() {
        let tables = EngineConfig::default()
            .reference_tables()
            .expect("builtin tables");
        assert_eq!(tables.edition(), "2026");
    }
}
