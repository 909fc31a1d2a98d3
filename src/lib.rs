// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Library core for Draftly: Google sign-in, Gmail access, AI reply drafts.

pub mod ai;
pub mod api;
pub mod auth;
pub mod config;
pub mod gmail;
pub mod mail;
pub mod store;

pub mod prelude {
    pub use crate::ai::{DraftGenerator, ReplyDraft, Tone};
    pub use crate::config::Settings;
    pub use crate::gmail::{GmailError, MailProvider, MailboxConnector};
    pub use crate::mail::{Email, MailboxGateway, OutgoingMessage};
    pub use crate::store::{User, UserStore};
}
