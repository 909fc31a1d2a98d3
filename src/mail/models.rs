// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBJECT: &str = "No Subject";
pub const DEFAULT_SENDER: &str = "Unknown Sender";

/// Normalized view of one provider message. Built once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub snippet: String,
    /// Extracted plain-text body, at most 500 characters plus an ellipsis.
    pub body: String,
}

/// Outcome of fetching one message inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(Email),
    Failed { id: String, reason: String },
}

impl FetchOutcome {
    pub fn email(&self) -> Option<&Email> {
        match self {
            FetchOutcome::Fetched(email) => Some(email),
            FetchOutcome::Failed { .. } => None,
        }
    }
}

/// Failed batch entry as reported to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub id: String,
    pub reason: String,
}

/// Result of sending a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentReply {
    pub message_id: String,
    pub thread_id: String,
    /// False when the send went through but removing the unread label did not.
    pub marked_read: bool,
}
