// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Failure kinds of reply generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Text generation API key is not configured")]
    MissingApiKey,

    #[error("Network error: unable to reach the text generation API: {0}")]
    Network(String),

    #[error("Text generation API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid response from text generation API: {0}")]
    InvalidResponse(String),
}

impl DraftError {
    /// True when the upstream asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DraftError::Upstream { status: 429, .. })
    }
}
