// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use actix_web::{
    get, post,
    web::{self, Data, Json, ReqData},
    HttpResponse,
};
use log::info;
use serde_json::json;

use crate::api::{
    errors::ApiError,
    rest::AppState,
    validation::{validate_payload, MarkReadRequest, SendReplyRequest},
};
use crate::mail::{FetchFailure, FetchOutcome};
use crate::store::User;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/emails")
            .service(unread_emails)
            .service(send_reply)
            .service(mark_read),
    );
}

#[get("/unread")]
async fn unread_emails(state: Data<AppState>, user: ReqData<User>) -> Result<HttpResponse, ApiError> {
    let mailbox = state.mailbox_for(&user).await?;
    let outcomes = mailbox
        .list_unread(state.settings.mailbox.unread_limit)
        .await
        .map_err(|e| ApiError::from_gmail("Failed to fetch emails", e))?;

    let mut emails = Vec::with_capacity(outcomes.len());
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            FetchOutcome::Fetched(email) => emails.push(email),
            FetchOutcome::Failed { id, reason } => failed.push(FetchFailure { id, reason }),
        }
    }

    info!(
        "Listed {} unread emails for user {} ({} failed)",
        emails.len(),
        user.id,
        failed.len()
    );

    let mut body = json!({
        "success": true,
        "count": emails.len(),
        "emails": emails,
    });
    if !failed.is_empty() {
        body["failed"] = json!(failed);
    }
    Ok(HttpResponse::Ok().json(body))
}

#[post("/send-reply")]
async fn send_reply(
    state: Data<AppState>,
    user: ReqData<User>,
    payload: Json<SendReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = validate_payload(payload)?;
    let mailbox = state.mailbox_for(&user).await?;

    let sent = mailbox
        .send_reply(request.email_id.trim(), &request.reply_content)
        .await
        .map_err(|e| ApiError::from_gmail("Failed to send reply", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "messageId": sent.message_id,
        "threadId": sent.thread_id,
        "markedRead": sent.marked_read,
        "message": "Reply sent successfully",
    })))
}

#[post("/mark-read")]
async fn mark_read(
    state: Data<AppState>,
    user: ReqData<User>,
    payload: Json<MarkReadRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = validate_payload(payload)?;
    let email_id = request.email_id.trim();
    let mailbox = state.mailbox_for(&user).await?;

    mailbox
        .mark_read(email_id)
        .await
        .map_err(|e| ApiError::from_gmail("Failed to mark email as read", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "messageId": email_id,
        "message": "Email marked as read",
    })))
}
