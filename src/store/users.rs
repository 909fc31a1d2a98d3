// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Persisted users, keyed by Google account id.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("User not found: {0}")]
    NotFound(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub google_id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl User {
    /// True when the access token expires within `margin` of `now`.
    /// Unknown expiry is treated as still valid.
    pub fn token_expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.token_expires_at
            .map(|expires_at| expires_at - margin <= now)
            .unwrap_or(false)
    }
}

/// Data from one successful Google login.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogin {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub access_token: String,
    /// Google only returns a refresh token on consent; `None` keeps the stored one.
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub profile_picture: Option<String>,
}

const USER_COLUMNS: &str = "id, google_id, email, name, access_token, refresh_token, \
                            token_expires_at, profile_picture, created_at, last_login";

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Open the database and apply pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, UserStoreError> {
        info!("Opening user store: {}", database_url);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same database.
    pub async fn connect_in_memory() -> Result<Self, UserStoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, UserStoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Create or update the user for a Google account. Last write wins.
    pub async fn upsert_from_login(&self, login: &NewLogin) -> Result<User, UserStoreError> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (google_id, email, name, access_token, refresh_token, \
                                token_expires_at, profile_picture, created_at, last_login) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(google_id) DO UPDATE SET \
                email = excluded.email, \
                name = excluded.name, \
                access_token = excluded.access_token, \
                refresh_token = COALESCE(excluded.refresh_token, users.refresh_token), \
                token_expires_at = excluded.token_expires_at, \
                profile_picture = excluded.profile_picture, \
                last_login = excluded.last_login",
        )
        .bind(&login.google_id)
        .bind(&login.email)
        .bind(&login.name)
        .bind(&login.access_token)
        .bind(&login.refresh_token)
        .bind(login.token_expires_at)
        .bind(&login.profile_picture)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE google_id = ?",
            USER_COLUMNS
        ))
        .bind(&login.google_id)
        .fetch_one(&self.pool)
        .await?;

        info!("User {} logged in (id {})", user.email, user.id);
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Persist a refreshed access token. A `None` refresh token keeps the stored one.
    pub async fn update_access_token(
        &self,
        id: i64,
        access_token: &str,
        token_expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<&str>,
    ) -> Result<User, UserStoreError> {
        let result = sqlx::query(
            "UPDATE users SET access_token = ?, token_expires_at = ?, \
                refresh_token = COALESCE(?, refresh_token) \
             WHERE id = ?",
        )
        .bind(access_token)
        .bind(token_expires_at)
        .bind(refresh_token)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound(id));
        }
        debug!("Stored refreshed access token for user {}", id);

        self.get(id).await?.ok_or(UserStoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(google_id: &str, access_token: &str, refresh_token: Option<&str>) -> NewLogin {
        NewLogin {
            google_id: google_id.to_string(),
            email: format!("{}@example.com", google_id),
            name: "Ana Example".to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            token_expires_at: Some(Utc::now() + Duration::hours(1)),
            profile_picture: Some("https://example.com/a.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_first_login_creates_user() {
        let store = UserStore::connect_in_memory().await.unwrap();
        let user = store.upsert_from_login(&login("g1", "at-1", Some("rt-1"))).await.unwrap();

        assert_eq!(user.google_id, "g1");
        assert_eq!(user.email, "g1@example.com");
        assert_eq!(user.access_token.as_deref(), Some("at-1"));
        assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));

        let fetched = store.get(user.id).await.unwrap().unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_relogin_overwrites_tokens_and_keeps_id() {
        let store = UserStore::connect_in_memory().await.unwrap();
        let first = store.upsert_from_login(&login("g1", "at-1", Some("rt-1"))).await.unwrap();
        let second = store.upsert_from_login(&login("g1", "at-2", Some("rt-2"))).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.access_token.as_deref(), Some("at-2"));
        assert_eq!(second.refresh_token.as_deref(), Some("rt-2"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_login >= first.last_login);
    }

    #[tokio::test]
    async fn test_relogin_without_refresh_token_keeps_stored_one() {
        let store = UserStore::connect_in_memory().await.unwrap();
        store.upsert_from_login(&login("g1", "at-1", Some("rt-1"))).await.unwrap();
        let user = store.upsert_from_login(&login("g1", "at-2", None)).await.unwrap();

        assert_eq!(user.access_token.as_deref(), Some("at-2"));
        assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));
    }

    #[tokio::test]
    async fn test_update_access_token() {
        let store = UserStore::connect_in_memory().await.unwrap();
        let user = store.upsert_from_login(&login("g1", "at-1", Some("rt-1"))).await.unwrap();

        let updated = store
            .update_access_token(user.id, "at-refreshed", None, None)
            .await
            .unwrap();
        assert_eq!(updated.access_token.as_deref(), Some("at-refreshed"));
        assert_eq!(updated.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(updated.token_expires_at, None);

        let err = store.update_access_token(999, "x", None, None).await.unwrap_err();
        assert!(matches!(err, UserStoreError::NotFound(999)));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = UserStore::connect_in_memory().await.unwrap();
        assert!(store.get(42).await.unwrap().is_none());
    }

    #[test]
    fn test_token_expiry_margin() {
        let now = Utc::now();
        let mut user = User {
            id: 1,
            google_id: "g".into(),
            email: "e@example.com".into(),
            name: "n".into(),
            access_token: Some("at".into()),
            refresh_token: None,
            token_expires_at: Some(now + Duration::seconds(30)),
            profile_picture: None,
            created_at: now,
            last_login: now,
        };
        assert!(user.token_expires_within(Duration::seconds(60), now));

        user.token_expires_at = Some(now + Duration::minutes(10));
        assert!(!user.token_expires_within(Duration::seconds(60), now));

        user.token_expires_at = None;
        assert!(!user.token_expires_within(Duration::seconds(60), now));
    }

    #[test]
    fn test_tokens_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: 1,
            google_id: "g".into(),
            email: "e@example.com".into(),
            name: "n".into(),
            access_token: Some("secret-at".into()),
            refresh_token: Some("secret-rt".into()),
            token_expires_at: None,
            profile_picture: None,
            created_at: now,
            last_login: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"googleId\""));
    }
}
