use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::duration::TimeParseError;

/// Whether an error should end the run or only skip the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Recoverable,
}

/// Failures reported by an [`ExchangeClient`](crate::client::ExchangeClient).
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("request rejected ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("signing error: {0}")]
    Signing(String),

    #[error("client setup error: {0}")]
    Setup(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors surfaced by a measurement run.
#[derive(Debug, Error)]
pub enum LatencyError {
    #[error("{call} failed: {source}")]
    Setup {
        call: &'static str,
        #[source]
        source: ExchangeError,
    },

    #[error(transparent)]
    Parse(#[from] TimeParseError),

    #[error("order creation failed: {0}")]
    Probe(#[source] ExchangeError),

    #[error("failed to write {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LatencyError {
    pub fn severity(&self) -> Severity {
        match self {
            LatencyError::Setup { .. } | LatencyError::Parse(_) => Severity::Fatal,
            LatencyError::Probe(_) | LatencyError::Log { .. } => Severity::Recoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_and_parse_errors_are_fatal() {
        let setup = LatencyError::Setup {
            call: "associate_wallet",
            source: ExchangeError::Network("connection refused".into()),
        };
        assert_eq!(setup.severity(), Severity::Fatal);

        let parse = LatencyError::from(TimeParseError::InvalidUnit("5d".into()));
        assert_eq!(parse.severity(), Severity::Fatal);
    }

    #[test]
    fn probe_and_log_errors_are_recoverable() {
        let probe = LatencyError::Probe(ExchangeError::Rejected {
            status: 400,
            code: Some("INSUFFICIENT_FUNDS".into()),
            message: "insufficient funds".into(),
        });
        assert_eq!(probe.severity(), Severity::Recoverable);

        let log = LatencyError::Log {
            path: PathBuf::from("logs/prod/latency.log"),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(log.severity(), Severity::Recoverable);
        assert_eq!(
            log.to_string(),
            "failed to write logs/prod/latency.log: disk full"
        );
    }

    #[test]
    fn setup_error_names_the_call() {
        let err = LatencyError::Setup {
            call: "create_order",
            source: ExchangeError::Authentication("bad key".into()),
        };
        assert_eq!(
            err.to_string(),
            "create_order failed: authentication failed: bad key"
        );
    }
}
