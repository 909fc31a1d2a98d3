// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gmail API client

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::types::{
    GmailMessage, MessageListResponse, MessageRef, ModifyMessageRequest, SendMessageRequest,
};
use super::{GmailError, MailCredentials, MailProvider, MailboxConnector, SentMessage, UNREAD_LABEL};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail API client bound to one access token.
pub struct GmailClient {
    http: Client,
    api_base: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(http: Client, api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.api_base, path)
    }

    async fn check(response: Response, resource: &str) -> Result<Response, GmailError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("Gmail API returned {} for {}: {}", status, resource, body);
        Err(GmailError::from_response(status, &body, resource))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GmailError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GmailError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_unread(&self, max_results: u32) -> Result<Vec<MessageRef>, GmailError> {
        debug!("Listing up to {} unread messages", max_results);

        let max_results = max_results.to_string();
        let response = self
            .http
            .get(self.url("messages"))
            .bearer_auth(&self.access_token)
            .query(&[("q", "is:unread"), ("maxResults", max_results.as_str())])
            .send()
            .await?;
        let response = Self::check(response, "unread message list").await?;
        let list: MessageListResponse = Self::decode(response).await?;

        debug!("Gmail reported {} unread messages", list.messages.len());
        Ok(list.messages)
    }

    async fn get_message(&self, id: &str) -> Result<GmailMessage, GmailError> {
        let path = format!("messages/{}", urlencoding::encode(id));
        let response = self
            .http
            .get(self.url(&path))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await?;
        let response = Self::check(response, id).await?;
        Self::decode(response).await
    }

    async fn mark_read(&self, id: &str) -> Result<(), GmailError> {
        let path = format!("messages/{}/modify", urlencoding::encode(id));
        let request = ModifyMessageRequest {
            add_label_ids: Vec::new(),
            remove_label_ids: vec![UNREAD_LABEL.to_string()],
        };
        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;
        Self::check(response, id).await?;
        Ok(())
    }

    async fn send_raw(&self, raw: &str, thread_id: &str) -> Result<SentMessage, GmailError> {
        let request = SendMessageRequest { raw, thread_id };
        let response = self
            .http
            .post(self.url("messages/send"))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;
        let response = Self::check(response, "outgoing message").await?;
        Self::decode(response).await
    }
}

/// Production connector: one `GmailClient` per request, sharing the HTTP pool.
#[derive(Clone)]
pub struct GmailConnector {
    http: Client,
    api_base: String,
}

impl GmailConnector {
    pub fn new(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }
}

impl MailboxConnector for GmailConnector {
    fn connect(&self, credentials: MailCredentials) -> Arc<dyn MailProvider> {
        Arc::new(GmailClient::new(
            self.http.clone(),
            self.api_base.clone(),
            credentials.access_token,
        ))
    }
}
