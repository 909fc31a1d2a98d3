// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Google sign-in and browser sessions.

pub mod oauth_config;
pub mod oauth_service;
pub mod session;

pub use oauth_config::{GoogleOAuthConfig, GOOGLE_SCOPES};
pub use oauth_service::{GoogleProfile, GoogleTokenResponse, OAuthError, OAuthService};
pub use session::{Session, SessionStore, SESSION_COOKIE};
