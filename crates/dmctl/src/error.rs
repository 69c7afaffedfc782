//! Error types for dmctl

use crate::tls::TlsError;

/// dmctl Result type
pub type Result<T> = std::result::Result<T, Error>;

/// dmctl errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid TLS config: {0}")]
    InvalidTlsConfig(#[from] TlsError),

    #[error("can't connect to {addr}: {message}")]
    ConnectionFailed { addr: String, message: String },

    #[error("args is empty")]
    EmptyInput,

    #[error("invalid sql '{sql}': {source}")]
    InvalidStatement {
        sql: String,
        #[source]
        source: sqlparser::parser::ParserError,
    },

    #[error("no valid SQLs")]
    NoValidStatements,

    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("error in get file content {path}: {source}")]
    FileContent {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("dm-master client is not initialized")]
    NotConnected,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn connection_failed(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConnectionFailed {
            addr: addr.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_not_file_content() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.to_string(), "io error: missing");
    }

    #[test]
    fn test_connection_failed_names_address() {
        let err = Error::connection_failed("127.0.0.1:8261", "deadline has elapsed");
        assert_eq!(
            err.to_string(),
            "can't connect to 127.0.0.1:8261: deadline has elapsed"
        );
    }

    #[test]
    fn test_invalid_tls_wraps_cause() {
        let err = Error::from(TlsError::MissingKeyPair("ssl-key".to_string()));
        assert!(err.to_string().starts_with("invalid TLS config:"));
        assert!(err.to_string().contains("ssl-key"));
    }
}
