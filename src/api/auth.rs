// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Google sign-in and session endpoints under `/auth`.

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    get,
    http::header,
    post,
    web::{self, Data, Query},
    HttpRequest, HttpResponse,
};
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{errors::ApiError, middleware::session_user, rest::AppState};
use crate::auth::{OAuthError, SESSION_COOKIE};
use crate::store::{NewLogin, User};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(google_login)
            .service(google_callback)
            .service(check_auth)
            .service(logout),
    );
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Public profile returned by `/auth/check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            profile_picture: user.profile_picture,
        }
    }
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn ui_url(state: &AppState, path: &str) -> String {
    format!("{}{}", state.settings.ui.base_url.trim_end_matches('/'), path)
}

#[get("/google")]
async fn google_login(state: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (auth_url, _state) = state.oauth.authorization_url().await?;
    Ok(redirect(auth_url))
}

/// Finish sign-in. Any failure sends the browser back to the login page.
#[get("/google/callback")]
async fn google_callback(state: Data<AppState>, query: Query<CallbackQuery>) -> HttpResponse {
    let query = query.into_inner();

    if let Some(err) = query.error.as_deref() {
        warn!("Google sign-in denied: {}", err);
        return redirect(ui_url(&state, "/login"));
    }

    let (Some(oauth_state), Some(code)) = (query.state.as_deref(), query.code.as_deref()) else {
        warn!("Google callback without code or state");
        return redirect(ui_url(&state, "/login"));
    };

    match complete_login(&state, oauth_state, code).await {
        Ok(session_id) => {
            let cookie = Cookie::build(SESSION_COOKIE, session_id)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.settings.session.cookie_secure)
                .max_age(CookieDuration::hours(state.settings.session.ttl_hours))
                .finish();
            HttpResponse::Found()
                .cookie(cookie)
                .insert_header((header::LOCATION, ui_url(&state, "/dashboard")))
                .finish()
        }
        Err(err) => {
            error!("Google sign-in failed: {}", err);
            redirect(ui_url(&state, "/login"))
        }
    }
}

async fn complete_login(state: &AppState, oauth_state: &str, code: &str) -> Result<String, ApiError> {
    let tokens = state.oauth.exchange_code(oauth_state, code).await?;
    let profile = state.oauth.fetch_profile(&tokens.access_token).await?;

    let email = profile.email.filter(|e| !e.is_empty()).ok_or_else(|| {
        ApiError::from(OAuthError::ProfileFetchFailed("profile has no email address".to_string()))
    })?;
    let name = profile
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.clone());

    let user = state
        .users
        .upsert_from_login(&NewLogin {
            google_id: profile.sub,
            email,
            name,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_expires_at: tokens.expires_at(Utc::now()),
            profile_picture: profile.picture,
        })
        .await?;

    Ok(state.sessions.create(user.id).await)
}

#[get("/check")]
async fn check_auth(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    match session_user(&req).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "authenticated": true,
            "user": SessionUser::from(user),
        }))),
        Err(ApiError::Unauthorized) => Ok(HttpResponse::Ok().json(json!({
            "authenticated": false,
        }))),
        Err(err) => Err(err),
    }
}

#[post("/logout")]
async fn logout(state: Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if state.sessions.remove(cookie.value()).await {
            info!("Session ended");
        }
    }

    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();

    HttpResponse::Ok().cookie(removal).json(json!({
        "success": true,
        "message": "Logged out successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::MockAiProvider;
    use crate::api::test_support::{login, settings_with_google, test_state};
    use crate::config::Settings;
    use crate::gmail::MockMailboxConnector;
    use actix_web::{http::StatusCode, test, App};
    use mockito::Matcher;

    fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
        resp.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[actix_web::test]
    async fn test_full_sign_in_flow() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                Matcher::UrlEncoded("code".into(), "auth-code".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-1","refresh_token":"rt-1","expires_in":3600,"token_type":"Bearer"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sub":"g-42","email":"ana@example.com","picture":"https://example.com/a.png"}"#)
            .create_async()
            .await;

        let state = test_state(
            settings_with_google(&server.url()),
            MockMailboxConnector::new(),
            MockAiProvider::new(),
        )
        .await;
        let app = test::init_service(App::new().app_data(Data::new(state.clone())).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/auth/google").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        let auth_url = location(&resp);
        assert!(auth_url.contains("access_type=offline"));
        let oauth_state = auth_url
            .split('&')
            .find_map(|pair| pair.strip_prefix("state="))
            .unwrap()
            .to_string();

        let callback = format!("/auth/google/callback?code=auth-code&state={}", oauth_state);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&callback).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "http://localhost:3000/dashboard");
        token_mock.assert_async().await;

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .unwrap()
            .into_owned();
        assert_eq!(cookie.http_only(), Some(true));

        let session = state.sessions.get(cookie.value()).await.unwrap();
        let user = state.users.get(session.user_id).await.unwrap().unwrap();
        assert_eq!(user.google_id, "g-42");
        // No display name in the profile: falls back to the address.
        assert_eq!(user.name, "ana@example.com");
        assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));
    }

    #[actix_web::test]
    async fn test_callback_with_unknown_state_redirects_to_login() {
        let state = test_state(
            settings_with_google("http://127.0.0.1:9"),
            MockMailboxConnector::new(),
            MockAiProvider::new(),
        )
        .await;
        let app = test::init_service(App::new().app_data(Data::new(state)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/auth/google/callback?code=c&state=forged")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "http://localhost:3000/login");

        let req = test::TestRequest::get()
            .uri("/auth/google/callback?error=access_denied")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "http://localhost:3000/login");
    }

    #[actix_web::test]
    async fn test_login_without_client_credentials() {
        let state = test_state(Settings::default(), MockMailboxConnector::new(), MockAiProvider::new()).await;
        let app = test::init_service(App::new().app_data(Data::new(state)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/auth/google").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_check_and_logout() {
        let state = test_state(Settings::default(), MockMailboxConnector::new(), MockAiProvider::new()).await;
        let (_, cookie) = login(&state, "at-1", None).await;
        let app = test::init_service(App::new().app_data(Data::new(state.clone())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/auth/check").cookie(cookie.clone()).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["email"], "ana@example.com");
        let mut keys: Vec<&str> = body["user"].as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["email", "id", "name", "profilePicture"]);

        let req = test::TestRequest::post().uri("/auth/logout").cookie(cookie.clone()).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Logged out successfully");
        assert!(state.sessions.get(cookie.value()).await.is_none());

        let req = test::TestRequest::get().uri("/auth/check").cookie(cookie).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["authenticated"], false);
    }
}
