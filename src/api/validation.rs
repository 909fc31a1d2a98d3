// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Request payloads and their validation.
//!
//! Missing fields deserialize to empty strings so they surface as field
//! validation errors (400) instead of JSON payload errors.

use std::borrow::Cow;

use actix_web::web::Json;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::ai::Tone;
use crate::api::errors::ApiError;

/// Custom validation functions
pub mod validators {
    use super::*;

    /// Reject empty and whitespace-only values.
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            let mut error = ValidationError::new("blank");
            error.message = Some(Cow::from("must not be empty"));
            return Err(error);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct SendReplyRequest {
    #[validate(custom(function = "validators::not_blank"))]
    pub email_id: String,
    #[validate(custom(function = "validators::not_blank"))]
    pub reply_content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[validate(custom(function = "validators::not_blank"))]
    pub email_id: String,
}

/// Body of both generate and regenerate requests.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateReplyRequest {
    #[validate(custom(function = "validators::not_blank"))]
    pub email_id: String,
    /// Defaults to professional when absent.
    pub tone: Option<String>,
    /// Earlier draft the regenerated reply should differ from.
    pub previous_reply: Option<String>,
}

impl GenerateReplyRequest {
    pub fn tone(&self) -> Result<Tone, ApiError> {
        match self.tone.as_deref() {
            None => Ok(Tone::default()),
            Some(raw) => raw.parse::<Tone>().map_err(|e| ApiError::BadRequest {
                message: e.to_string(),
            }),
        }
    }
}

/// Unwrap a JSON payload and run its field validation.
pub fn validate_payload<T>(payload: Json<T>) -> Result<T, ApiError>
where
    T: Validate,
{
    let inner = payload.into_inner();
    match inner.validate() {
        Ok(_) => Ok(inner),
        Err(errors) => Err(errors.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validators::not_blank("m1").is_ok());
        assert!(validators::not_blank("").is_err());
        assert!(validators::not_blank(" \n\t ").is_err());
    }

    #[test]
    fn test_send_reply_requires_both_fields() {
        let request: SendReplyRequest = serde_json::from_str(r#"{"emailId": "m1"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);

        let request: SendReplyRequest =
            serde_json::from_str(r#"{"emailId": "m1", "replyContent": "Thanks!"}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_whitespace_reply_rejected() {
        let request = SendReplyRequest {
            email_id: "m1".into(),
            reply_content: "   ".into(),
        };
        match ApiError::from(request.validate().unwrap_err()) {
            ApiError::ValidationFailed { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].constraint.as_deref(), Some("blank"));
                assert_eq!(errors[0].message, "must not be empty");
            }
            other => panic!("Expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_tone_parsing() {
        let request: GenerateReplyRequest = serde_json::from_str(r#"{"emailId": "m1"}"#).unwrap();
        assert_eq!(request.tone().unwrap(), Tone::Professional);

        let request: GenerateReplyRequest =
            serde_json::from_str(r#"{"emailId": "m1", "tone": "casual"}"#).unwrap();
        assert_eq!(request.tone().unwrap(), Tone::Casual);

        let request: GenerateReplyRequest =
            serde_json::from_str(r#"{"emailId": "m1", "tone": "sarcastic"}"#).unwrap();
        let err = request.tone().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
        assert!(err.to_string().contains("sarcastic"));
    }
}
