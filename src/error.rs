use thiserror::Error;

/// Failure of a single outbound call to a recipe, cocktail or nutrition source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} timed out")]
    Timeout { source_name: String },

    #[error("network error talking to {source_name}: {message}")]
    Network { source_name: String, message: String },

    #[error("{source_name} quota or rate limit reached: {message}")]
    RateLimited {
        source_name: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{source_name} returned HTTP {status}: {body}")]
    Status {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("could not decode {source_name} response: {message}")]
    Decode { source_name: String, message: String },
}

/// HTTP statuses that mean "stop calling, you are out of quota".
pub fn is_quota_status(status: u16) -> bool {
    status == 402 || status == 429
}

pub fn mentions_quota(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("quota") || lower.contains("api limit")
}

impl SourceError {
    pub fn from_reqwest(source_name: &str, err: reqwest::Error) -> Self {
        let source_name = source_name.to_string();
        if err.is_timeout() {
            Self::Timeout { source_name }
        } else if err.is_decode() {
            Self::Decode {
                source_name,
                message: err.to_string(),
            }
        } else {
            Self::Network {
                source_name,
                message: err.to_string(),
            }
        }
    }

    pub fn from_status(source_name: &str, status: u16, body: String) -> Self {
        if is_quota_status(status) || mentions_quota(&body) {
            Self::RateLimited {
                source_name: source_name.to_string(),
                status: Some(status),
                message: body,
            }
        } else {
            Self::Status {
                source_name: source_name.to_string(),
                status,
                body,
            }
        }
    }

    pub fn decode(source_name: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
