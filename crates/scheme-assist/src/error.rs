use crate::assistance::AssistanceServiceError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use std::fmt;
use std::path::PathBuf;

/// Failure that ends a CLI command or the server process.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    /// Binding or serving the HTTP listener failed.
    Server(std::io::Error),
    ReadSnapshot {
        path: PathBuf,
        source: std::io::Error,
    },
    Snapshot(serde_json::Error),
    Assistance(AssistanceServiceError),
}

impl AppError {
    /// Process exit status: 2 for input the caller can fix, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_)
            | AppError::ReadSnapshot { .. }
            | AppError::Snapshot(_)
            | AppError::Assistance(AssistanceServiceError::Validation(_)) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid configuration: {err}"),
            AppError::Telemetry(err) => write!(f, "logging setup failed: {err}"),
            AppError::Server(err) => write!(f, "http server failed: {err}"),
            AppError::ReadSnapshot { path, source } => {
                write!(f, "cannot read snapshot {}: {source}", path.display())
            }
            AppError::Snapshot(err) => write!(f, "malformed snapshot: {err}"),
            AppError::Assistance(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::ReadSnapshot { source, .. } => Some(source),
            AppError::Snapshot(err) => Some(err),
            AppError::Assistance(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<TelemetryError> for AppError {
    fn from(err: TelemetryError) -> Self {
        AppError::Telemetry(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Server(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Snapshot(err)
    }
}

impl From<AssistanceServiceError> for AppError {
    fn from(err: AssistanceServiceError) -> Self {
        AppError::Assistance(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistance::{ApplicantId, ValidationError};

    #[test]
    fn caller_fixable_failures_exit_with_two() {
        let invalid = AppError::from(AssistanceServiceError::Validation(
            ValidationError::Empty {
                field: "name".to_string(),
            },
        ));
        assert_eq!(invalid.exit_code(), 2);

        let missing = AppError::from(AssistanceServiceError::ApplicantNotFound(
            ApplicantId::from("ghost"),
        ));
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(missing.to_string(), "applicant ghost not found");
    }

    #[test]
    fn snapshot_read_failures_name_the_path() {
        let err = AppError::ReadSnapshot {
            path: PathBuf::from("household.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("household.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
