// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mailbox content: body extraction, header decoding, reply composition and
//! the per-user gateway over a mail provider.

pub mod composer;
pub mod extractor;
pub mod gateway;
pub mod headers;
pub mod models;

pub use composer::{OutgoingMessage, ReplyHeaders};
pub use extractor::extract_body;
pub use gateway::{MailboxGateway, DEFAULT_UNREAD_LIMIT};
pub use models::{Email, FetchFailure, FetchOutcome, SentReply};
