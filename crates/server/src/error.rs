//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side failures to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! # Response bodies
//!
//! - Validation failures: `{"<field>": ["message", ...], ...}` with status 400
//! - Everything else: `{"detail": "message"}`

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use foodgram_core::composition::CompositionError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::media::MediaError;

/// Per-field validation messages, rendered as a JSON object keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single message for a single field.
    #[must_use]
    pub fn single(field: &str, message: impl ToString) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl ToString) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.to_string());
    }

    /// Record the error of `result` under `field`, returning the success value.
    pub fn check<T, E: ToString>(
        &mut self,
        field: &str,
        result: std::result::Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field has errors.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl From<CompositionError> for FieldErrors {
    fn from(err: CompositionError) -> Self {
        Self::single(err.field(), err)
    }
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Image upload handling failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Request body failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP method not supported on this resource.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<CompositionError> for AppError {
    fn from(err: CompositionError) -> Self {
        Self::Validation(err.into())
    }
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ) | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Media(MediaError::Io(_))
                | Self::Internal(_)
        )
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) | Self::Auth(AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return (status, Json(json!({ "detail": "Internal server error" }))).into_response();
        }

        let body = match self {
            Self::Validation(errors) | Self::Auth(AuthError::Invalid(errors)) => json!(errors),
            Self::Auth(AuthError::AlreadyExists(field)) => json!(FieldErrors::single(
                &field,
                format!("a user with this {field} already exists")
            )),
            Self::Auth(AuthError::WrongCurrentPassword) => {
                json!(FieldErrors::single("current_password", "invalid password"))
            }
            Self::Auth(AuthError::InvalidCredentials) => {
                json!({ "detail": "Unable to log in with provided credentials" })
            }
            Self::Auth(AuthError::InvalidToken) => json!({ "detail": "Invalid token" }),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => json!({ "detail": msg }),
            other => json!({ "detail": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called by the auth extractor so errors are associated with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use axum::body::to_bytes;
    use foodgram_core::TagId;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("recipe 12".to_string());
        assert_eq!(err.to_string(), "Not found: recipe 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("dup".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::MethodNotAllowed),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_composition_error_is_keyed_by_field() {
        let err: AppError =
            CompositionError::DuplicateTags(BTreeSet::from([TagId::new(1), TagId::new(4)])).into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "tags": ["tags are repeated: 1, 4"] })
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("connection reset by peer".into()).into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_conflict_message_is_passed_through() {
        let response =
            AppError::Database(RepositoryError::Conflict("recipe is already in favorites".into()))
                .into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "recipe is already in favorites" })
        );
    }

    #[test]
    fn test_field_errors_accumulate() {
        let mut errors = FieldErrors::new();
        errors.add("name", "this field may not be blank");
        errors.add("name", "ensure this field has no more than 256 characters");
        errors.add("cooking_time", "ensure this value is greater than or equal to 1");

        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert_eq!(
            errors.to_string(),
            "cooking_time: ensure this value is greater than or equal to 1; \
             name: this field may not be blank, ensure this field has no more than 256 characters"
        );
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
