// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Google OAuth2 client configuration.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::GoogleConfig;

/// Sign-in plus the Gmail access the service needs: read, send, and label changes.
pub const GOOGLE_SCOPES: &[&str] = &[
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.modify",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match a redirect URI registered for the client.
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    pub fn from_settings(settings: &GoogleConfig) -> Self {
        let config = Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.callback_url.clone(),
            auth_url: settings.auth_url.clone(),
            token_url: settings.token_url.clone(),
            userinfo_url: settings.userinfo_url.clone(),
        };

        if config.is_configured() {
            info!("Google OAuth2 configured with redirect {}", config.redirect_uri);
        } else {
            debug!("Google OAuth2 not configured (set GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET)");
        }
        config
    }

    /// Client id and secret are both present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}
