// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod drafter;
pub mod error;
pub mod provider;

pub use drafter::{DraftGenerator, ReplyDraft, Tone, UnknownTone};
pub use error::DraftError;
pub use provider::{AiChatMessage, AiProvider, ChatCompletionsAdapter, CompletionOptions};
