// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    web, Error as ActixError, HttpMessage, HttpRequest,
};
use actix_web_lab::middleware::Next;
use log::{debug, warn};

use crate::api::errors::ApiError;
use crate::api::rest::AppState;
use crate::auth::SESSION_COOKIE;
use crate::store::User;

/// Session guard for `/api`. Resolves the session cookie to a stored user
/// and makes it available to handlers as `web::ReqData<User>`.
pub async fn require_session<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, ActixError>
where
    B: MessageBody,
{
    match session_user(req.request()).await {
        Ok(user) => {
            debug!("Request {} authenticated as user {}", req.path(), user.id);
            req.extensions_mut().insert(user);
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(err) => Ok(req.error_response(err).map_into_right_body()),
    }
}

/// User behind the request's session cookie, if the session is live.
pub async fn session_user(req: &HttpRequest) -> Result<User, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::InternalError {
            message: "Application state missing".to_string(),
            details: None,
        })?;

    let session_id = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            warn!("Request to {} without session cookie", req.path());
            return Err(ApiError::Unauthorized);
        }
    };

    state.user_for_session(&session_id).await?.ok_or_else(|| {
        warn!("Request to {} with unknown or expired session", req.path());
        ApiError::Unauthorized
    })
}
