// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use actix_web::{
    post,
    web::{self, Data, Json, ReqData},
    HttpResponse,
};
use chrono::SecondsFormat;
use serde_json::json;

use crate::ai::ReplyDraft;
use crate::api::{
    errors::ApiError,
    rest::AppState,
    validation::{validate_payload, GenerateReplyRequest},
};
use crate::mail::Email;
use crate::store::User;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ai")
            .service(generate_reply)
            .service(regenerate_reply),
    );
}

#[post("/generate-reply")]
async fn generate_reply(
    state: Data<AppState>,
    user: ReqData<User>,
    payload: Json<GenerateReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = validate_payload(payload)?;
    let tone = request.tone()?;

    let email = load_email(&state, &user, &request.email_id).await?;
    let draft = state.drafter.generate(&email, tone).await?;
    Ok(draft_response(&email, &draft))
}

#[post("/regenerate-reply")]
async fn regenerate_reply(
    state: Data<AppState>,
    user: ReqData<User>,
    payload: Json<GenerateReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = validate_payload(payload)?;
    let tone = request.tone()?;

    let email = load_email(&state, &user, &request.email_id).await?;
    let draft = state
        .drafter
        .regenerate(&email, tone, request.previous_reply.as_deref())
        .await?;
    Ok(draft_response(&email, &draft))
}

async fn load_email(state: &AppState, user: &User, email_id: &str) -> Result<Email, ApiError> {
    let mailbox = state.mailbox_for(user).await?;
    mailbox
        .get_details(email_id.trim())
        .await
        .map_err(|e| ApiError::from_gmail("Failed to fetch email", e))
}

fn draft_response(email: &Email, draft: &ReplyDraft) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "emailId": draft.original_email_id,
        "generatedReply": draft.reply,
        "tone": draft.tone,
        "timestamp": draft.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        "originalSubject": email.subject,
        "originalFrom": email.from,
    }))
}
