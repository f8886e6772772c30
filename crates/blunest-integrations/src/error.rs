use thiserror::Error;

/// Errors talking to an external service
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("A user with this email address has already been registered")]
    AlreadyExists,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unexpected response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl IntegrationError {
    pub(crate) fn invalid_response(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }
}
