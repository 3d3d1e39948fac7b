use chrono::NaiveDate;
use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment stage, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Colored log output is only wanted on a developer terminal.
    pub fn wants_ansi(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Runtime settings for the assistance service, sourced from the environment and `.env`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub validation: ValidationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(&var_or("APP_ENV", "development"));

        let port = match var("APP_PORT").or_else(|| var("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { value: raw })?,
            None => DEFAULT_PORT,
        };

        let reference_date = var("APP_AS_OF")
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|source| ConfigError::InvalidReferenceDate { value: raw, source })
            })
            .transpose()?;

        Ok(Self {
            environment,
            server: ServerConfig {
                host: var_or("APP_HOST", DEFAULT_HOST),
                port,
            },
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", DEFAULT_LOG_LEVEL),
                ansi: environment.wants_ansi(),
            },
            validation: ValidationConfig { reference_date },
        })
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `localhost` maps to the IPv4 loopback; anything else must be a literal address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    value: self.host.clone(),
                    source,
                })?
        };

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub ansi: bool,
}

/// Date-of-birth checks compare against `reference_date` when set, otherwise today.
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort {
        value: String,
    },
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
    InvalidReferenceDate {
        value: String,
        source: chrono::ParseError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { value } => {
                write!(f, "APP_PORT '{value}' is not a port number")
            }
            ConfigError::InvalidHost { value, .. } => {
                write!(f, "APP_HOST '{value}' is not an IP address or localhost")
            }
            ConfigError::InvalidReferenceDate { value, .. } => {
                write!(f, "APP_AS_OF '{value}' is not a YYYY-MM-DD date")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort { .. } => None,
            ConfigError::InvalidHost { source, .. } => Some(source),
            ConfigError::InvalidReferenceDate { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 6] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "PORT",
        "APP_LOG_LEVEL",
        "APP_AS_OF",
    ];

    /// Run `check` with exactly `vars` set among the keys this module reads.
    fn with_env<T>(vars: &[(&str, &str)], check: impl FnOnce() -> T) -> T {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let outcome = check();
        for key in KEYS {
            env::remove_var(key);
        }
        outcome
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = with_env(&[], AppConfig::load).expect("defaults load");

        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.ansi);
        assert_eq!(config.validation.reference_date, None);
    }

    #[test]
    fn localhost_binds_loopback() {
        let config = with_env(&[("APP_HOST", "LocalHost"), ("APP_PORT", "9090")], AppConfig::load)
            .expect("config loads");

        assert_eq!(
            config.server.socket_addr().expect("address"),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9090)
        );
    }

    #[test]
    fn hostnames_other_than_localhost_are_rejected() {
        let config = with_env(&[("APP_HOST", "assist.internal")], AppConfig::load)
            .expect("config loads");

        match config.server.socket_addr() {
            Err(ConfigError::InvalidHost { value, .. }) => assert_eq!(value, "assist.internal"),
            other => panic!("expected invalid host, got {other:?}"),
        }
    }

    #[test]
    fn plain_port_is_a_fallback() {
        let config = with_env(&[("PORT", "3000")], AppConfig::load).expect("config loads");
        assert_eq!(config.server.port, 3000);

        let config = with_env(&[("PORT", "3000"), ("APP_PORT", "4000")], AppConfig::load)
            .expect("config loads");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn port_must_be_numeric() {
        let err = with_env(&[("APP_PORT", "eighty")], AppConfig::load).expect_err("bad port");
        assert!(matches!(err, ConfigError::InvalidPort { ref value } if value == "eighty"));
    }

    #[test]
    fn reference_date_is_parsed() {
        let config = with_env(&[("APP_AS_OF", "2025-06-01"), ("APP_ENV", "ci")], AppConfig::load)
            .expect("config loads");

        assert_eq!(config.environment, AppEnvironment::Test);
        assert!(!config.telemetry.ansi);
        assert_eq!(
            config.validation.reference_date,
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );

        let err = with_env(&[("APP_AS_OF", "June 1st")], AppConfig::load).expect_err("bad date");
        assert!(matches!(err, ConfigError::InvalidReferenceDate { .. }));
    }

    #[test]
    fn environment_aliases() {
        assert_eq!(AppEnvironment::parse(" PROD "), AppEnvironment::Production);
        assert_eq!(AppEnvironment::parse("test"), AppEnvironment::Test);
        assert_eq!(AppEnvironment::parse("staging"), AppEnvironment::Development);
    }
}
