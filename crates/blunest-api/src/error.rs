//! API error type
//!
//! Every handler returns [`ApiResult`]; the error side renders the
//! `{success: false, error, code?, errors?}` envelope with a matching status.

use std::collections::BTreeMap;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use blunest_integrations::IntegrationError;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// Field name to validation messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        code: Option<&'static str>,
    },

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{message}")]
    Unauthorized {
        message: String,
        code: Option<&'static str>,
    },

    #[error("{message}")]
    Forbidden {
        message: String,
        code: Option<&'static str>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        code: Option<&'static str>,
    },

    #[error("{message}")]
    Conflict {
        message: String,
        code: Option<&'static str>,
    },

    #[error("Too many requests. Please try again later.")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: None,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            code: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a stable machine-readable code
    pub fn with_code(mut self, new_code: &'static str) -> Self {
        match &mut self {
            Self::BadRequest { code, .. }
            | Self::Unauthorized { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. } => *code = Some(new_code),
            _ => {}
        }
        self
    }

    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Integration(IntegrationError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Integration(IntegrationError::AlreadyExists) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Integration(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, code, errors) = match self {
            Self::BadRequest { message, code }
            | Self::Forbidden { message, code }
            | Self::NotFound { message, code }
            | Self::Conflict { message, code } => (message.clone(), code.map(str::to_string), None),
            Self::Validation(fields) => (
                "Validation failed".to_string(),
                Some("VALIDATION_ERROR".to_string()),
                Some(fields.clone()),
            ),
            Self::Unauthorized { message, code } => (
                message.clone(),
                Some(code.unwrap_or("UNAUTHORIZED").to_string()),
                None,
            ),
            Self::RateLimited { .. } => (
                self.to_string(),
                Some("RATE_LIMITED".to_string()),
                None,
            ),
            Self::Integration(IntegrationError::InvalidCredentials) => (
                "Invalid email or password".to_string(),
                Some("INVALID_CREDENTIALS".to_string()),
                None,
            ),
            Self::Integration(IntegrationError::AlreadyExists) => (
                "A user with this email already exists".to_string(),
                Some("USER_EXISTS".to_string()),
                None,
            ),
            Self::Database(_) => (
                "Internal server error".to_string(),
                Some("DATABASE_ERROR".to_string()),
                None,
            ),
            Self::Integration(_) => (
                "Upstream service error".to_string(),
                Some("INTEGRATION_ERROR".to_string()),
                None,
            ),
            Self::Config(_) => (
                "Server configuration error".to_string(),
                Some("CONFIG_ERROR".to_string()),
                None,
            ),
            Self::Internal(_) => (
                "Internal server error".to_string(),
                Some("INTERNAL_ERROR".to_string()),
                None,
            ),
        };

        ErrorResponse {
            success: false,
            error,
            code,
            errors,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", field))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self::Validation(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let mut response = (status, Json(self.body())).into_response();

        if let Self::RateLimited { reset_at } = &self {
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            if let Ok(value) =
                HeaderValue::from_str(&reset_at.to_rfc3339_opts(SecondsFormat::Secs, true))
            {
                headers.insert("x-ratelimit-reset", value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Contact {
        #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
        name: String,
        #[validate(email(message = "Invalid email address"))]
        email: String,
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("x").with_code("GROUP_FULL").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Integration(IntegrationError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let body = ApiError::Database(DbErr::Custom("secret table".into())).body();
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.code.as_deref(), Some("DATABASE_ERROR"));
    }

    #[test]
    fn test_validation_errors_to_fields() {
        let contact = Contact {
            name: "A".to_string(),
            email: "nope".to_string(),
        };
        let err: ApiError = contact.validate().unwrap_err().into();
        let body = err.body();

        let fields = body.errors.unwrap();
        assert_eq!(fields["name"], vec!["Name must be at least 2 characters"]);
        assert_eq!(fields["email"], vec!["Invalid email address"]);
    }

    #[test]
    fn test_rate_limited_headers() {
        let response = ApiError::RateLimited {
            reset_at: Utc::now(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert!(response.headers().contains_key("x-ratelimit-reset"));
    }
}
