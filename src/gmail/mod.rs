// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mail provider seam and its Gmail REST implementation.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub mod client;
pub mod error;
pub mod types;

pub use client::{GmailClient, GmailConnector};
pub use error::GmailError;
pub use types::{GmailMessage, MessageRef};

/// Label Gmail uses to flag unread messages.
pub const UNREAD_LABEL: &str = "UNREAD";

/// Result of a successful `messages.send`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

/// Operations the mailbox gateway needs from a mail provider.
///
/// One instance is bound to one user's access token.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Ids of unread messages, newest first, at most `max_results`.
    async fn list_unread(&self, max_results: u32) -> Result<Vec<MessageRef>, GmailError>;

    /// Full message including the MIME tree.
    async fn get_message(&self, id: &str) -> Result<GmailMessage, GmailError>;

    /// Remove the unread label. Removing an absent label succeeds.
    async fn mark_read(&self, id: &str) -> Result<(), GmailError>;

    /// Submit a base64url encoded RFC 5322 message on the given thread.
    async fn send_raw(&self, raw: &str, thread_id: &str) -> Result<SentMessage, GmailError>;
}

/// Access token handed to a connector for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub access_token: String,
}

/// Builds a provider bound to the caller's credentials.
#[cfg_attr(test, automock)]
pub trait MailboxConnector: Send + Sync {
    fn connect(&self, credentials: MailCredentials) -> Arc<dyn MailProvider>;
}
