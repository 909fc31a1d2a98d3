// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::env;

use config::{Environment, File};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite://draftly.db?mode=rwc`.
    pub url: String,
    pub max_connections: u32,
}

/// Google OAuth client and API endpoints. Endpoints are overridable so tests
/// can point them at a local server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub gmail_api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    /// Full chat completions URL.
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Browser UI the OAuth flow redirects back to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailboxConfig {
    pub unread_limit: u32,
    /// Access tokens expiring within this many seconds are refreshed first.
    pub refresh_margin_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub ai: AiSettings,
    pub ui: UiConfig,
    pub mailbox: MailboxConfig,
    pub session: SessionConfig,
}

impl Settings {
    /// Load settings: defaults, then the optional file, then
    /// `DRAFTLY__SECTION__KEY` variables, then the well-known direct variables.
    pub fn new(config_path: Option<&str>) -> Result<Self, SettingsError> {
        let mut config_builder = config::Config::builder();

        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        // e.g. `DRAFTLY__SERVER__PORT=8080` overrides `server.port`
        config_builder = config_builder.add_source(
            Environment::with_prefix("DRAFTLY")
                .prefix_separator("__")
                .separator("__")
                .ignore_empty(true),
        );

        let env_vars = [
            ("PORT", "server.port"),
            ("LOG_LEVEL", "log.level"),
            ("DATABASE_URL", "database.url"),
            ("GOOGLE_CLIENT_ID", "google.client_id"),
            ("GOOGLE_CLIENT_SECRET", "google.client_secret"),
            ("GOOGLE_CALLBACK_URL", "google.callback_url"),
            ("DEEPSEEK_API_KEY", "ai.api_key"),
            ("DEEPSEEK_API_URL", "ai.api_url"),
            ("FRONTEND_URL", "ui.base_url"),
        ];

        for (env_var, config_path) in &env_vars {
            let value = match env::var(env_var) {
                Ok(value) if !value.is_empty() => value,
                _ => continue,
            };
            if *env_var == "PORT" {
                match value.parse::<u16>() {
                    Ok(port) => config_builder = config_builder.set_override(*config_path, port)?,
                    Err(_) => warn!("Invalid port value in {}: {}", env_var, value),
                }
            } else {
                config_builder = config_builder.set_override(*config_path, value)?;
            }
        }

        Ok(config_builder.build()?.try_deserialize()?)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_string() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://draftly.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: "http://localhost:5000/auth/google/callback".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            gmail_api_base: crate::gmail::client::GMAIL_API_BASE.to_string(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.deepseek.com/chat/completions".to_string(),
            model: crate::ai::provider::DEFAULT_MODEL.to_string(),
            max_tokens: crate::ai::provider::DEFAULT_MAX_TOKENS,
            temperature: crate::ai::provider::DEFAULT_TEMPERATURE,
            timeout_secs: crate::ai::provider::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            unread_limit: crate::mail::DEFAULT_UNREAD_LIMIT,
            refresh_margin_secs: 60,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            cookie_secure: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load or parse configuration: {0}")]
    LoadError(#[from] config::ConfigError),
}
