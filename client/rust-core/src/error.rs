use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Transport failures and 5xx/429 responses are worth another attempt;
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            ClientError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Unauthenticated => true,
            ClientError::Status { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryability() {
        let server = ClientError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream".to_string(),
        };
        let throttled = ClientError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".to_string(),
        };
        let missing = ClientError::Status {
            status: StatusCode::NOT_FOUND,
            message: "no such mistake".to_string(),
        };

        assert!(server.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!missing.is_retryable());
        assert!(!ClientError::Unauthenticated.is_retryable());
    }

    #[test]
    fn test_unauthorized_detection() {
        let expired = ClientError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "token expired".to_string(),
        };
        assert!(expired.is_unauthorized());
        assert!(ClientError::Unauthenticated.is_unauthorized());
        assert!(!ClientError::Config("x".to_string()).is_unauthorized());
    }
}
