// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reply drafting on top of a chat completion provider.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::DraftError;
use super::provider::{AiChatMessage, AiProvider, ChatCompletionsAdapter, CompletionOptions};
use crate::config::AiSettings;
use crate::mail::Email;

/// Writing style of a generated reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Casual,
    Concise,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Professional, Tone::Friendly, Tone::Casual, Tone::Concise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Casual => "casual",
            Tone::Concise => "concise",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Tone::Professional => "You are a professional email assistant. Write formal, courteous, and business-appropriate email replies. Use proper email etiquette and maintain a respectful tone.",
            Tone::Friendly => "You are a friendly email assistant. Write warm, approachable, and personable email replies. Use a conversational tone while remaining polite and helpful.",
            Tone::Casual => "You are a casual email assistant. Write relaxed, informal email replies. Use a conversational tone as if talking to a friend, but still be respectful.",
            Tone::Concise => "You are a concise email assistant. Write brief, to-the-point email replies. Get straight to the point while being polite and covering all necessary information.",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn allowed_tones() -> String {
    Tone::ALL.iter().map(Tone::as_str).collect::<Vec<_>>().join(", ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid tone '{0}'. Must be one of: {}", allowed_tones())]
pub struct UnknownTone(pub String);

impl FromStr for Tone {
    type Err = UnknownTone;

    /// Exact, lowercase match only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str() == s)
            .ok_or_else(|| UnknownTone(s.to_string()))
    }
}

/// A generated reply. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDraft {
    pub reply: String,
    pub tone: Tone,
    pub timestamp: DateTime<Utc>,
    pub original_email_id: String,
}

/// Produces reply drafts for normalized emails.
#[derive(Clone)]
pub struct DraftGenerator {
    provider: Arc<dyn AiProvider>,
}

impl DraftGenerator {
    /// Build the production generator. Fails when no API key is configured.
    pub fn from_settings(http_client: Client, settings: &AiSettings) -> Result<Self, DraftError> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(DraftError::MissingApiKey)?;

        let options = CompletionOptions {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        };
        info!("Reply drafting uses model {} at {}", options.model, settings.api_url);

        let adapter = ChatCompletionsAdapter::new(http_client, settings.api_url.clone(), api_key, options);
        Ok(Self::with_provider(Arc::new(adapter)))
    }

    pub fn with_provider(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, email: &Email, tone: Tone) -> Result<ReplyDraft, DraftError> {
        self.draft(email, tone, None).await
    }

    /// Another draft for the same email. When the previous draft is given the
    /// model is asked for a clearly different alternative.
    pub async fn regenerate(
        &self,
        email: &Email,
        tone: Tone,
        previous_reply: Option<&str>,
    ) -> Result<ReplyDraft, DraftError> {
        let previous = previous_reply.map(str::trim).filter(|p| !p.is_empty());
        self.draft(email, tone, previous).await
    }

    async fn draft(
        &self,
        email: &Email,
        tone: Tone,
        previous_reply: Option<&str>,
    ) -> Result<ReplyDraft, DraftError> {
        debug!("Generating {} reply for email {}", tone, email.id);

        let messages = [
            AiChatMessage::system(tone.system_prompt()),
            AiChatMessage::user(build_prompt(email, tone, previous_reply)),
        ];
        let reply = self.provider.generate_response(&messages).await?.trim().to_string();

        info!("Generated {} reply for email {}", tone, email.id);
        Ok(ReplyDraft {
            reply,
            tone,
            timestamp: Utc::now(),
            original_email_id: email.id.clone(),
        })
    }
}

/// User instruction embedding the original message.
pub fn build_prompt(email: &Email, tone: Tone, previous_reply: Option<&str>) -> String {
    let mut prompt = format!(
        "Please write a {tone} email reply to the following email:

FROM: {from}
SUBJECT: {subject}
DATE: {date}

EMAIL CONTENT:
{body}

Instructions:
1. Draft the reply in a {tone} style
2. Directly respond to the key points in the original message
3. Ensure the response is supportive and solution-oriented
4. Keep it clear, concise, and complete
5. Exclude subject lines or header details
6. Only provide the reply body text
",
        tone = tone,
        from = email.from,
        subject = email.subject,
        date = email.date,
        body = email.body,
    );

    if let Some(previous) = previous_reply {
        prompt.push_str(&format!(
            "7. Write a clearly different alternative to this earlier draft:\n---\n{}\n---\n",
            previous
        ));
    }

    prompt.push_str("\nReply:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::MockAiProvider;

    fn email() -> Email {
        Email {
            id: "m1".into(),
            thread_id: "t1".into(),
            subject: "Budget review".into(),
            from: "Ana <ana@example.com>".into(),
            to: "me@example.com".into(),
            date: "Mon, 2 Jun 2025 09:00:00 +0000".into(),
            snippet: "Can we meet".into(),
            body: "Can we meet on Thursday to go over the numbers?".into(),
        }
    }

    fn settings(api_key: Option<&str>) -> AiSettings {
        AiSettings {
            api_key: api_key.map(str::to_string),
            ..AiSettings::default()
        }
    }

    #[test]
    fn test_tone_parsing() {
        assert_eq!("friendly".parse::<Tone>(), Ok(Tone::Friendly));
        assert_eq!("concise".parse::<Tone>(), Ok(Tone::Concise));
        assert!("Friendly".parse::<Tone>().is_err());
        let err = "angry".parse::<Tone>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid tone 'angry'. Must be one of: professional, friendly, casual, concise"
        );
        assert_eq!(Tone::default(), Tone::Professional);
    }

    #[test]
    fn test_tone_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Tone::Casual).unwrap(), "\"casual\"");
    }

    #[test]
    fn test_missing_api_key_fails_construction() {
        let err = DraftGenerator::from_settings(Client::new(), &settings(None)).err();
        assert_eq!(err, Some(DraftError::MissingApiKey));

        let err = DraftGenerator::from_settings(Client::new(), &settings(Some("  "))).err();
        assert_eq!(err, Some(DraftError::MissingApiKey));

        assert!(DraftGenerator::from_settings(Client::new(), &settings(Some("sk-1"))).is_ok());
    }

    #[test]
    fn test_prompt_embeds_email() {
        let prompt = build_prompt(&email(), Tone::Friendly, None);
        assert!(prompt.starts_with("Please write a friendly email reply"));
        assert!(prompt.contains("FROM: Ana <ana@example.com>"));
        assert!(prompt.contains("SUBJECT: Budget review"));
        assert!(prompt.contains("DATE: Mon, 2 Jun 2025 09:00:00 +0000"));
        assert!(prompt.contains("EMAIL CONTENT:\nCan we meet on Thursday"));
        assert!(!prompt.contains("earlier draft"));
        assert!(prompt.ends_with("Reply:"));
    }

    #[test]
    fn test_prompt_with_previous_reply() {
        let prompt = build_prompt(&email(), Tone::Concise, Some("Thursday works."));
        assert!(prompt.contains("clearly different alternative"));
        assert!(prompt.contains("Thursday works."));
    }

    #[tokio::test]
    async fn test_generate_trims_and_stamps() {
        let mut provider = MockAiProvider::new();
        provider
            .expect_generate_response()
            .withf(|messages| {
                messages.len() == 2
                    && messages[0].role == "system"
                    && messages[0].content.starts_with("You are a concise email assistant")
                    && messages[1].role == "user"
            })
            .times(1)
            .returning(|_| Ok("\n  Thursday works.  \n".to_string()));

        let generator = DraftGenerator::with_provider(Arc::new(provider));
        let draft = generator.generate(&email(), Tone::Concise).await.unwrap();

        assert_eq!(draft.reply, "Thursday works.");
        assert_eq!(draft.tone, Tone::Concise);
        assert_eq!(draft.original_email_id, "m1");
    }

    #[tokio::test]
    async fn test_regenerate_mentions_previous_draft() {
        let mut provider = MockAiProvider::new();
        provider
            .expect_generate_response()
            .withf(|messages| messages[1].content.contains("Thursday works."))
            .returning(|_| Ok("How about Friday instead?".to_string()));

        let generator = DraftGenerator::with_provider(Arc::new(provider));
        let draft = generator
            .regenerate(&email(), Tone::Professional, Some("Thursday works."))
            .await
            .unwrap();
        assert_eq!(draft.reply, "How about Friday instead?");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let mut provider = MockAiProvider::new();
        provider
            .expect_generate_response()
            .returning(|_| Err(DraftError::Network("timed out".into())));

        let generator = DraftGenerator::with_provider(Arc::new(provider));
        let err = generator.generate(&email(), Tone::Professional).await.unwrap_err();
        assert_eq!(err, DraftError::Network("timed out".into()));
    }
}
