// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use reqwest::StatusCode;
use thiserror::Error;

use super::types::GoogleErrorEnvelope;

/// Google error reasons that mean "slow down" even when the status is 403.
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

/// Structured failure kinds of the mail provider.
#[derive(Error, Debug)]
pub enum GmailError {
    #[error("Gmail authorization rejected: {0}")]
    Unauthorized(String),

    #[error("Gmail rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Gmail API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error calling Gmail: {0}")]
    Network(String),

    #[error("Failed to decode Gmail response: {0}")]
    Decode(String),
}

impl GmailError {
    /// Classify a non-2xx Gmail response from its status and body.
    ///
    /// `resource` names what was requested and is used for not-found errors.
    pub fn from_response(status: StatusCode, body: &str, resource: &str) -> Self {
        let envelope = serde_json::from_str::<GoogleErrorEnvelope>(body).ok();
        let message = envelope
            .as_ref()
            .map(|e| e.error.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());
        let rate_limited_reason = envelope.as_ref().is_some_and(|e| {
            e.error
                .errors
                .iter()
                .filter_map(|item| item.reason.as_deref())
                .any(|reason| RATE_LIMIT_REASONS.contains(&reason))
        });

        match status {
            StatusCode::UNAUTHORIZED => GmailError::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => GmailError::RateLimited(message),
            StatusCode::FORBIDDEN if rate_limited_reason => GmailError::RateLimited(message),
            StatusCode::NOT_FOUND => GmailError::NotFound(resource.to_string()),
            _ => GmailError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for GmailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GmailError::Decode(err.to_string())
        } else {
            GmailError::Network(err.to_string())
        }
    }
}
