// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Threaded reply construction.
//!
//! Builds the RFC 5322 text of a reply so that mail clients group it with the
//! original: `In-Reply-To` carries the original `Message-ID` and `References`
//! extends the original chain. The result is handed to Gmail as base64url.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use super::models::DEFAULT_SUBJECT;
use crate::gmail::GmailMessage;

const REPLY_PREFIX: &str = "Re:";

/// Headers of the original message that a reply depends on.
///
/// Values are kept as they appeared on the wire; encoded words are valid in
/// outgoing headers too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyHeaders {
    pub subject: String,
    pub from: String,
    pub message_id: Option<String>,
    pub references: Option<String>,
}

impl ReplyHeaders {
    pub fn from_message(message: &GmailMessage) -> Self {
        let present = |name: &str| {
            message
                .header(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            subject: present("Subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            from: present("From").unwrap_or_default(),
            message_id: present("Message-ID"),
            references: present("References"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl OutgoingMessage {
    /// Reply addressed to the original sender on the original thread.
    pub fn reply_to(original: &ReplyHeaders, body: impl Into<String>) -> Self {
        Self {
            to: original.from.clone(),
            subject: reply_subject(&original.subject),
            body: body.into(),
            in_reply_to: original.message_id.clone(),
            references: original
                .message_id
                .as_deref()
                .map(|id| build_references(original.references.as_deref(), id)),
        }
    }

    /// Header block, blank line, body. Lines end with CRLF; the body is not
    /// transformed.
    pub fn to_rfc822(&self) -> String {
        let mut lines = vec![
            "MIME-Version: 1.0".to_string(),
            format!("To: {}", fold(&self.to)),
            format!("Subject: {}", fold(&self.subject)),
        ];
        if let Some(id) = &self.in_reply_to {
            lines.push(format!("In-Reply-To: {}", fold(id)));
        }
        if let Some(refs) = &self.references {
            lines.push(format!("References: {}", fold(refs)));
        }
        lines.push("Content-Type: text/plain; charset=utf-8".to_string());
        lines.push("Content-Transfer-Encoding: 8bit".to_string());

        format!("{}\r\n\r\n{}", lines.join("\r\n"), self.body)
    }

    /// base64url without padding, as `users.messages.send` expects in `raw`.
    pub fn encode_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_rfc822().as_bytes())
    }
}

/// Prefix `Re: ` unless the subject already starts with `Re:`.
pub fn reply_subject(subject: &str) -> String {
    if subject.starts_with(REPLY_PREFIX) {
        subject.to_string()
    } else {
        format!("{} {}", REPLY_PREFIX, subject)
    }
}

/// Original references followed by the original message id.
pub fn build_references(original_references: Option<&str>, message_id: &str) -> String {
    match original_references.map(str::trim).filter(|r| !r.is_empty()) {
        Some(refs) => format!("{} {}", refs, message_id),
        None => message_id.to_string(),
    }
}

// Header injection guard: a value never spans lines.
fn fold(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\r', '\n'], " ")
}
