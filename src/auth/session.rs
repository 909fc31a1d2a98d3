// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "draftly_sid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// In-memory session store. Sessions do not survive a restart.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Start a session for `user_id` and return its id.
    pub async fn create(&self, user_id: i64) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| now - s.created_at < self.ttl);
        sessions.insert(
            id.clone(),
            Session {
                user_id,
                created_at: now,
            },
        );
        info!("Created session for user {}", user_id);
        id
    }

    /// Live session for `id`. An expired session is dropped and not returned.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let session = self.sessions.read().await.get(id).cloned()?;
        if Utc::now() - session.created_at < self.ttl {
            return Some(session);
        }

        debug!("Session expired for user {}", session.user_id);
        self.sessions.write().await.remove(id);
        None
    }

    /// Returns whether a session was removed.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }
}
