// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error handling for the HTTP API
//!
//! Every failure leaves the service as
//! `{success: false, code, error, details?, validationErrors?, needsReauth?, timestamp}`
//! with a status derived from the error kind, never from message text.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::DraftError;
use crate::auth::OAuthError;
use crate::gmail::GmailError;
use crate::store::UserStoreError;

/// Standardized error response format
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<ValidationError>>,
    /// Set when the client has to send the user through Google sign-in again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_reauth: Option<bool>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Field-specific validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{message}")]
    ReauthRequired { message: String },

    #[error("{message}")]
    ValidationFailed {
        message: String,
        errors: Vec<ValidationError>,
    },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("{message}")]
    RateLimitExceeded { message: String },

    #[error("{service} temporarily unavailable")]
    ServiceUnavailable { service: String, details: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("{message}")]
    InternalError {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "AUTH_REQUIRED",
            ApiError::ReauthRequired { .. } => "REAUTH_REQUIRED",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ApiError::DatabaseError { .. } => "DATABASE_ERROR",
            ApiError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Translate a mail provider failure. `context` describes the operation
    /// and becomes the message of unclassified failures.
    pub fn from_gmail(context: &str, err: GmailError) -> Self {
        match err {
            GmailError::Unauthorized(_) => ApiError::ReauthRequired {
                message: "Gmail authorization expired. Please sign in again.".to_string(),
            },
            GmailError::RateLimited(_) => ApiError::RateLimitExceeded {
                message: "Gmail rate limit exceeded. Please try again later.".to_string(),
            },
            GmailError::NotFound(id) => ApiError::NotFound {
                resource: format!("email {}", id),
            },
            other => ApiError::InternalError {
                message: context.to_string(),
                details: Some(other.to_string()),
            },
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::ServiceUnavailable { details, .. } => Some(details.clone()),
            ApiError::InternalError { details, .. } => details.clone(),
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } | ApiError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::ReauthRequired { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DatabaseError { .. } | ApiError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match status.as_u16() {
            400..=499 => log::warn!("Client error: {} ({})", self, status),
            500..=599 => log::error!("Server error: {} ({}) {}", self, status, self.details().unwrap_or_default()),
            _ => log::info!("API response: {} ({})", self, status),
        }

        let validation_errors = match self {
            ApiError::ValidationFailed { errors, .. } => Some(errors.to_vec()),
            _ => None,
        };

        let error_response = ErrorResponse {
            success: false,
            code: self.code().to_string(),
            error: self.to_string(),
            details: self.details(),
            validation_errors,
            needs_reauth: matches!(self, ApiError::ReauthRequired { .. }).then_some(true),
            timestamp: chrono::Utc::now(),
        };

        HttpResponse::build(status).json(error_response)
    }
}

// === Type Conversions ===

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        if err.is_rate_limited() {
            return ApiError::RateLimitExceeded {
                message: "AI service rate limit exceeded. Please try again later.".to_string(),
            };
        }
        match err {
            DraftError::Network(_) | DraftError::Upstream { .. } => ApiError::ServiceUnavailable {
                service: "AI service".to_string(),
                details: err.to_string(),
            },
            DraftError::InvalidResponse(_) | DraftError::MissingApiKey => ApiError::InternalError {
                message: "Failed to generate reply".to_string(),
                details: Some(err.to_string()),
            },
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::TokenRefreshFailed(_) | OAuthError::NoPendingAuth(_) => ApiError::ReauthRequired {
                message: "Google authorization expired. Please sign in again.".to_string(),
            },
            OAuthError::HttpError(_) => ApiError::ServiceUnavailable {
                service: "Google sign-in".to_string(),
                details: err.to_string(),
            },
            other => ApiError::InternalError {
                message: "Google sign-in failed".to_string(),
                details: Some(other.to_string()),
            },
        }
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        ApiError::DatabaseError {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut validation_errors: Vec<ValidationError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(|e| ValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                    constraint: Some(e.code.to_string()),
                })
            })
            .collect();
        validation_errors.sort_by(|a, b| a.field.cmp(&b.field));

        let message = match validation_errors.first() {
            Some(first) => format!("{}: {}", first.field, first.message),
            None => "Request validation failed".to_string(),
        };

        ApiError::ValidationFailed {
            message,
            errors: validation_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: ApiError) -> serde_json::Value {
        let response = err.error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::ReauthRequired { message: "x".into() }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::BadRequest { message: "x".into() }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RateLimitExceeded { message: "x".into() }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::ServiceUnavailable { service: "x".into(), details: "y".into() }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_gmail_mapping() {
        let err = ApiError::from_gmail("Failed", GmailError::Unauthorized("expired".into()));
        assert_eq!(err.code(), "REAUTH_REQUIRED");

        let err = ApiError::from_gmail("Failed", GmailError::RateLimited("quota".into()));
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let err = ApiError::from_gmail("Failed", GmailError::NotFound("m1".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::from_gmail(
            "Failed to send reply",
            GmailError::Api { status: 500, message: "backend".into() },
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to send reply");
        assert!(err.details().unwrap().contains("backend"));
    }

    #[test]
    fn test_draft_mapping() {
        let err: ApiError = DraftError::Network("timeout".into()).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = DraftError::Upstream { status: 500, message: "boom".into() }.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = DraftError::Upstream { status: 429, message: "slow".into() }.into();
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let err: ApiError = DraftError::InvalidResponse("no choices".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_refresh_failure_needs_reauth() {
        let err: ApiError = OAuthError::TokenRefreshFailed("invalid_grant".into()).into();
        assert_eq!(err.code(), "REAUTH_REQUIRED");
    }

    #[actix_web::test]
    async fn test_reauth_body() {
        let json = body_json(ApiError::ReauthRequired { message: "sign in".into() }).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "REAUTH_REQUIRED");
        assert_eq!(json["needsReauth"], true);
        assert_eq!(json["error"], "sign in");
        assert!(json.get("details").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_unavailable_body_has_details() {
        let json = body_json(DraftError::Network("connection refused".into()).into()).await;
        assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(json["error"], "AI service temporarily unavailable");
        assert!(json["details"].as_str().unwrap().contains("connection refused"));
        assert!(json.get("needsReauth").is_none());
    }

    #[test]
    fn test_validation_error_conversion() {
        use validator::Validate;

        #[derive(Validate)]
        struct TestStruct {
            #[validate(length(min = 1, message = "field is required"))]
            field: String,
        }

        let test = TestStruct { field: "".to_string() };
        let api_error: ApiError = test.validate().unwrap_err().into();
        match api_error {
            ApiError::ValidationFailed { message, errors } => {
                assert_eq!(message, "field: field is required");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "field");
                assert_eq!(errors[0].constraint.as_deref(), Some("length"));
            }
            other => panic!("Expected ValidationFailed error, got {other:?}"),
        }
    }
}
