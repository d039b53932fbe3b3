use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Access denied: {message}")]
    Forbidden { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request timeout after {attempts} attempts")]
    Timeout { attempts: usize },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimitExceeded { .. } => true,
            ApiError::ServerError { status, .. } if *status >= 500 => true,
            ApiError::Timeout { .. } => true,
            ApiError::RequestFailed(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::AuthenticationFailed { .. } => {
                Some("Check the API key passed with --apiKey, OPSGENIE_API_KEY or the config file")
            }
            ApiError::Forbidden { .. } => {
                Some("The API key lacks the access rights required for this operation")
            }
            ApiError::RateLimitExceeded { .. } => {
                Some("Slow down or raise retryCount in the lamp config file")
            }
            ApiError::NotFound { .. } => {
                Some("Check the identifier and the identifier type (--id, --alias, --tinyId, --name)")
            }
            ApiError::BadRequest { .. } => Some("Review the request parameters"),
            ApiError::Timeout { .. } => Some("Check your network connection or proxy settings"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert!(ApiError::RateLimitExceeded { retry_after: 1 }.is_retryable());
        assert!(ApiError::ServerError {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());
        assert!(ApiError::Timeout { attempts: 3 }.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!ApiError::BadRequest {
            message: "bad".to_string()
        }
        .is_retryable());
        assert!(!ApiError::NotFound {
            resource: "/v2/alerts/x".to_string()
        }
        .is_retryable());
        assert!(!ApiError::AuthenticationFailed {
            message: "nope".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn suggestions_point_at_lamp_flags() {
        let err = ApiError::AuthenticationFailed {
            message: "Invalid GenieKey".to_string(),
        };
        assert!(err.suggestion().unwrap().contains("--apiKey"));
        assert!(ApiError::InvalidResponse("x".to_string())
            .suggestion()
            .is_none());
    }
}
