use thiserror::Error;

/// Statuses worth retrying: rate limiting and gateway trouble upstream.
const TRANSIENT_STATUSES: [u16; 4] = [429, 502, 503, 504];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider reported an error: {0}")]
    Api(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid request: {0}")]
    Request(String),

    #[error("No content: {0}")]
    NoContent(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::Network(_) => true,
            ProviderError::Status { status, .. } => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout
        } else if error.is_builder() {
            ProviderError::Request(error.to_string())
        } else if error.is_decode() {
            ProviderError::InvalidPayload(error.to_string())
        } else if let Some(status) = error.status() {
            ProviderError::Status {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}
