// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shared fixtures for handler tests.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use chrono::{DateTime, Duration, Utc};

use crate::ai::provider::MockAiProvider;
use crate::ai::DraftGenerator;
use crate::api::rest::AppState;
use crate::auth::{GoogleOAuthConfig, OAuthService, SessionStore, SESSION_COOKIE};
use crate::config::Settings;
use crate::gmail::{MailProvider, MockMailProvider, MockMailboxConnector};
use crate::store::{NewLogin, User, UserStore};

pub async fn test_state(
    settings: Settings,
    connector: MockMailboxConnector,
    ai: MockAiProvider,
) -> AppState {
    let oauth = OAuthService::new(GoogleOAuthConfig::from_settings(&settings.google), reqwest::Client::new());
    AppState {
        settings: Arc::new(settings),
        users: UserStore::connect_in_memory().await.unwrap(),
        sessions: SessionStore::new(Duration::hours(24)),
        oauth: Arc::new(oauth),
        drafter: DraftGenerator::with_provider(Arc::new(ai)),
        connector: Arc::new(connector),
    }
}

/// Settings whose Google endpoints point at a local mock server.
pub fn settings_with_google(server_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.google.client_id = "client-id".to_string();
    settings.google.client_secret = "client-secret".to_string();
    settings.google.auth_url = format!("{}/auth", server_url);
    settings.google.token_url = format!("{}/token", server_url);
    settings.google.userinfo_url = format!("{}/userinfo", server_url);
    settings
}

/// Connector that only accepts `access_token` and hands out `provider`.
pub fn connector_expecting(access_token: &str, provider: MockMailProvider) -> MockMailboxConnector {
    let provider: Arc<dyn MailProvider> = Arc::new(provider);
    let expected = access_token.to_string();
    let mut connector = MockMailboxConnector::new();
    connector
        .expect_connect()
        .withf(move |credentials| credentials.access_token == expected)
        .returning(move |_| provider.clone());
    connector
}

/// Store a user with refresh token `rt-1` and open a session for them.
pub async fn login(
    state: &AppState,
    access_token: &str,
    token_expires_at: Option<DateTime<Utc>>,
) -> (User, Cookie<'static>) {
    let user = state
        .users
        .upsert_from_login(&NewLogin {
            google_id: "google-1".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana Example".to_string(),
            access_token: access_token.to_string(),
            refresh_token: Some("rt-1".to_string()),
            token_expires_at,
            profile_picture: None,
        })
        .await
        .unwrap();
    let session_id = state.sessions.create(user.id).await;
    (user, Cookie::new(SESSION_COOKIE, session_id))
}
