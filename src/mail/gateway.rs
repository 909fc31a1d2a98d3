// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};

use super::composer::{OutgoingMessage, ReplyHeaders};
use super::extractor::extract_body;
use super::headers::decode_header_value;
use super::models::{Email, FetchOutcome, SentReply, DEFAULT_SENDER, DEFAULT_SUBJECT};
use crate::gmail::{GmailError, GmailMessage, MailProvider};

pub const DEFAULT_UNREAD_LIMIT: u32 = 5;

/// Mailbox operations for one authenticated user.
///
/// Constructed per request from a provider that already carries the user's
/// access token.
pub struct MailboxGateway {
    provider: Arc<dyn MailProvider>,
}

impl MailboxGateway {
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        Self { provider }
    }

    /// Up to `max_results` unread messages, in the order the provider listed
    /// them. A message that fails to load becomes `FetchOutcome::Failed`.
    pub async fn list_unread(&self, max_results: u32) -> Result<Vec<FetchOutcome>, GmailError> {
        let refs = self.provider.list_unread(max_results).await?;
        if refs.is_empty() {
            debug!("No unread messages");
            return Ok(Vec::new());
        }

        let fetches = refs.iter().map(|r| async move {
            match self.get_details(&r.id).await {
                Ok(email) => FetchOutcome::Fetched(email),
                Err(e) => {
                    warn!("Failed to fetch message {}: {}", r.id, e);
                    FetchOutcome::Failed {
                        id: r.id.clone(),
                        reason: e.to_string(),
                    }
                }
            }
        });
        let outcomes = join_all(fetches).await;

        debug!("Fetched {} unread messages", outcomes.len());
        Ok(outcomes)
    }

    pub async fn get_details(&self, id: &str) -> Result<Email, GmailError> {
        let message = self.provider.get_message(id).await?;
        Ok(to_email(&message))
    }

    /// Idempotent: marking an already-read message succeeds.
    pub async fn mark_read(&self, id: &str) -> Result<(), GmailError> {
        self.provider.mark_read(id).await
    }

    /// Reply on the original thread, then mark the original read.
    ///
    /// Once the send has succeeded a mark-read failure is only reported through
    /// `SentReply::marked_read`.
    pub async fn send_reply(&self, id: &str, reply_text: &str) -> Result<SentReply, GmailError> {
        let original = self.provider.get_message(id).await?;
        let reply = OutgoingMessage::reply_to(&ReplyHeaders::from_message(&original), reply_text);

        let sent = self
            .provider
            .send_raw(&reply.encode_raw(), &original.thread_id)
            .await?;
        info!("Sent reply {} to message {} on thread {}", sent.id, id, original.thread_id);

        let marked_read = match self.provider.mark_read(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Reply {} sent but marking {} read failed: {}", sent.id, id, e);
                false
            }
        };

        let thread_id = if sent.thread_id.is_empty() {
            original.thread_id
        } else {
            sent.thread_id
        };

        Ok(SentReply {
            message_id: sent.id,
            thread_id,
            marked_read,
        })
    }
}

fn to_email(message: &GmailMessage) -> Email {
    let header = |name: &str| {
        message
            .header(name)
            .map(decode_header_value)
            .filter(|v| !v.trim().is_empty())
    };

    Email {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        subject: header("Subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        from: header("From").unwrap_or_else(|| DEFAULT_SENDER.to_string()),
        to: header("To").unwrap_or_default(),
        date: header("Date").unwrap_or_default(),
        snippet: message.snippet.clone().unwrap_or_default(),
        body: message.payload.as_ref().map(extract_body).unwrap_or_default(),
    }
}
