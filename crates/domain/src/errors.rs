use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed DNS message: {0}")]
    FormatError(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport timeout talking to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Transport connection reset by {server}")]
    TransportConnectionReset { server: String },

    #[error("Transport error talking to {server}: {reason}")]
    TransportError { server: String, reason: String },

    #[error("Response from {server} rejected: {reason}")]
    ResponseMismatch { server: String, reason: String },

    #[error("Upstream {server} answered {rcode}")]
    UpstreamRcode { server: String, rcode: String },

    #[error("No upstream servers configured")]
    TransportNoHealthyServers,

    #[error("All upstream servers are unreachable")]
    TransportAllServersUnreachable,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl DomainError {
    /// Whether the failover loop should move on to the next upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportTimeout { .. }
                | Self::TransportConnectionRefused { .. }
                | Self::TransportConnectionReset { .. }
                | Self::TransportError { .. }
                | Self::ResponseMismatch { .. }
                | Self::UpstreamRcode { .. }
                | Self::FormatError(_)
                | Self::IoError(_)
        )
    }

    /// Stable label used in events and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FormatError(_) => "format",
            Self::InvalidDomainName(_) => "invalid_name",
            Self::QueryTimeout => "deadline",
            Self::TransportTimeout { .. } => "timeout",
            Self::TransportConnectionRefused { .. } => "refused",
            Self::TransportConnectionReset { .. } => "reset",
            Self::TransportError { .. } => "transport",
            Self::ResponseMismatch { .. } => "mismatch",
            Self::UpstreamRcode { .. } => "rcode",
            Self::TransportNoHealthyServers => "no_servers",
            Self::TransportAllServersUnreachable => "exhausted",
            Self::ConfigError(_) => "config",
            Self::IoError(_) => "io",
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::IoError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_retryable() {
        let server = "10.0.0.1:53".to_string();
        assert!(DomainError::TransportTimeout { server: server.clone() }.is_retryable());
        assert!(DomainError::ResponseMismatch {
            server,
            reason: "id".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_exhaustion_is_terminal() {
        assert!(!DomainError::TransportAllServersUnreachable.is_retryable());
        assert!(!DomainError::QueryTimeout.is_retryable());
        assert_eq!(DomainError::QueryTimeout.kind(), "deadline");
    }
}
