// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! OAuth2 service for the Google authorization code flow with PKCE.
//!
//! Handles:
//! - Generating authorization URLs with PKCE + state
//! - Exchanging authorization codes for tokens
//! - Refreshing expired access tokens
//! - Fetching the signed-in user's profile

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine as _};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;

use super::oauth_config::{GoogleOAuthConfig, GOOGLE_SCOPES};

/// How long a started authorization may take before its state is forgotten.
const PENDING_AUTH_TTL: Duration = Duration::from_secs(600);

/// Errors from OAuth2 operations.
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("Google OAuth is not configured")]
    NotConfigured,
    #[error("No pending authorization for state: {0}")]
    NoPendingAuth(String),
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),
    #[error("Profile request failed: {0}")]
    ProfileFetchFailed(String),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Token response from Google's token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

impl GoogleTokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| now + chrono::Duration::seconds(secs))
    }
}

/// OpenID Connect userinfo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Pending authorization data stored between the authorize redirect and callback.
#[derive(Debug, Clone)]
struct PendingAuth {
    code_verifier: String,
    created_at: Instant,
}

/// OAuth2 service managing the authorization code flow with PKCE.
pub struct OAuthService {
    config: GoogleOAuthConfig,
    http_client: reqwest::Client,
    /// Map from state parameter → pending auth data (in-memory, short-lived).
    pending_auths: Arc<Mutex<HashMap<String, PendingAuth>>>,
}

impl OAuthService {
    pub fn new(config: GoogleOAuthConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
            pending_auths: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Generate a Google authorization URL with PKCE.
    ///
    /// Returns `(authorization_url, state)`. Offline access and forced consent
    /// are requested so Google issues a refresh token.
    pub async fn authorization_url(&self) -> Result<(String, String), OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let state = generate_random_string(32);
        let code_verifier = generate_code_verifier();
        let code_challenge = compute_code_challenge(&code_verifier);

        {
            let mut pending = self.pending_auths.lock().await;
            pending.retain(|_, auth| auth.created_at.elapsed() < PENDING_AUTH_TTL);
            pending.insert(
                state.clone(),
                PendingAuth {
                    code_verifier,
                    created_at: Instant::now(),
                },
            );
        }

        let scopes = GOOGLE_SCOPES.join(" ");
        let auth_url = format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(&state),
            urlencoding::encode(&code_challenge),
        );

        debug!("Generated Google OAuth2 authorization URL (state={})", &state[..8]);
        Ok((auth_url, state))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `state` and `code` come from the OAuth callback query parameters. The
    /// pending state is consumed whether or not the exchange succeeds.
    pub async fn exchange_code(&self, state: &str, code: &str) -> Result<GoogleTokenResponse, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let pending = {
            let mut pending_map = self.pending_auths.lock().await;
            pending_map
                .remove(state)
                .filter(|auth| auth.created_at.elapsed() < PENDING_AUTH_TTL)
                .ok_or_else(|| OAuthError::NoPendingAuth(state.to_string()))?
        };

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code_verifier", pending.code_verifier.as_str()),
        ];

        info!("Exchanging authorization code for tokens");

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed: HTTP {} - {}", status, body);
            return Err(OAuthError::TokenExchangeFailed(format!("HTTP {}: {}", status, body)));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(format!("JSON parse: {}", e)))?;

        info!("Successfully exchanged authorization code for tokens");
        Ok(token_response)
    }

    /// Refresh an access token using a refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        debug!("Refreshing Google OAuth2 access token");

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Token refresh failed: HTTP {} - {}", status, body);
            return Err(OAuthError::TokenRefreshFailed(format!("HTTP {}: {}", status, body)));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::TokenRefreshFailed(format!("JSON parse: {}", e)))?;

        info!("Successfully refreshed Google OAuth2 access token");
        Ok(token_response)
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http_client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Userinfo request failed: HTTP {} - {}", status, body);
            return Err(OAuthError::ProfileFetchFailed(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetchFailed(format!("JSON parse: {}", e)))
    }
}

/// Generate a cryptographically random URL-safe string of the given byte length.
fn generate_random_string(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64URL.encode(&bytes)
}

/// Generate an OAuth2 PKCE code verifier (43-128 character URL-safe string).
fn generate_code_verifier() -> String {
    generate_random_string(32) // 32 bytes → 43 base64url characters
}

/// Compute the S256 code challenge from a code verifier.
fn compute_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    BASE64URL.encode(hash)
}
