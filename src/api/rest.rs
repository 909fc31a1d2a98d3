// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    get,
    http::header,
    middleware::Logger,
    web::{self, Data},
    App, HttpResponse, HttpServer,
};
use actix_web_lab::middleware::from_fn as mw_from_fn;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use serde_json::json;

use crate::{
    ai::{DraftError, DraftGenerator},
    api::{ai, auth, emails, errors::ApiError, middleware::require_session},
    auth::{GoogleOAuthConfig, OAuthService, SessionStore},
    config::Settings,
    gmail::{GmailConnector, MailCredentials, MailboxConnector},
    mail::MailboxGateway,
    store::{User, UserStore},
};

/// Shared state for every request.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub users: UserStore,
    pub sessions: SessionStore,
    pub oauth: Arc<OAuthService>,
    pub drafter: DraftGenerator,
    pub connector: Arc<dyn MailboxConnector>,
}

impl AppState {
    /// Wire the production services. Fails when reply drafting has no API key.
    pub fn new(settings: Settings, users: UserStore, http_client: reqwest::Client) -> Result<Self, DraftError> {
        let drafter = DraftGenerator::from_settings(http_client.clone(), &settings.ai)?;
        let oauth = OAuthService::new(GoogleOAuthConfig::from_settings(&settings.google), http_client.clone());
        let connector = GmailConnector::new(http_client, settings.google.gmail_api_base.clone());
        let sessions = SessionStore::new(Duration::hours(settings.session.ttl_hours));

        Ok(Self {
            settings: Arc::new(settings),
            users,
            sessions,
            oauth: Arc::new(oauth),
            drafter,
            connector: Arc::new(connector),
        })
    }

    /// Stored user for a live session.
    pub async fn user_for_session(&self, session_id: &str) -> Result<Option<User>, ApiError> {
        let Some(session) = self.sessions.get(session_id).await else {
            return Ok(None);
        };
        Ok(self.users.get(session.user_id).await?)
    }

    /// Mailbox bound to the user's Google access token, refreshed first when
    /// it is about to expire.
    pub async fn mailbox_for(&self, user: &User) -> Result<MailboxGateway, ApiError> {
        let user = self.ensure_fresh_token(user).await?;
        let access_token = user
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::ReauthRequired {
                message: "No Gmail access token on file. Please sign in again.".to_string(),
            })?;

        let provider = self.connector.connect(MailCredentials { access_token });
        Ok(MailboxGateway::new(provider))
    }

    async fn ensure_fresh_token(&self, user: &User) -> Result<User, ApiError> {
        let margin = Duration::seconds(self.settings.mailbox.refresh_margin_secs);
        if !user.token_expires_within(margin, Utc::now()) {
            return Ok(user.clone());
        }

        let Some(refresh_token) = user.refresh_token.as_deref() else {
            debug!("Access token for user {} is expiring and no refresh token is stored", user.id);
            return Ok(user.clone());
        };

        info!("Refreshing Google access token for user {}", user.id);
        let tokens = self.oauth.refresh_token(refresh_token).await.map_err(|e| {
            warn!("Token refresh for user {} failed: {}", user.id, e);
            ApiError::from(e)
        })?;

        let refreshed = self
            .users
            .update_access_token(
                user.id,
                &tokens.access_token,
                tokens.expires_at(Utc::now()),
                tokens.refresh_token.as_deref(),
            )
            .await?;
        Ok(refreshed)
    }
}

// --- Route Configuration ---

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).configure(auth::configure).service(
        web::scope("/api")
            .wrap(mw_from_fn(require_session))
            .configure(emails::configure)
            .configure(ai::configure),
    );
}

/// Malformed JSON bodies answer with the standard error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| {
            ApiError::BadRequest {
                message: err.to_string(),
            }
            .into()
        })
}

fn cors(ui_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(ui_origin.trim_end_matches('/'))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Draftly API is running!",
        "status": "success",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// --- Main Server Setup ---

pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let bind_address = format!("{}:{}", state.settings.server.host, state.settings.server.port);
    info!("Starting REST API server at {}", bind_address);

    let ui_origin = state.settings.ui.base_url.clone();
    let app_state = Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(json_config())
            .wrap(cors(&ui_origin))
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
