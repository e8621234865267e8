//! In-process identity provider

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::{IdentityProvider, EVENT_CAPACITY};
use crate::{
    datasource::{memory::MemoryDataSource, DataSource},
    error::{AppError, AppResult},
    models::{
        session::{SignUpOutcome, UserMetadata},
        AuthEvent, Session, SessionUser,
    },
};

struct Account {
    /// Argon2 PHC string
    password_hash: String,
    user: SessionUser,
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Accounts and the current session held in memory.
///
/// Sign-up confirms immediately and signs the new user in.
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    profiles: Option<Arc<MemoryDataSource>>,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            profiles: None,
        }
    }

    /// Also create a `profiles` row for every new account
    pub fn with_profiles(mut self, source: Arc<MemoryDataSource>) -> Self {
        self.profiles = Some(source);
        self
    }

    fn issue_session(user: &SessionUser) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: user.clone(),
        }
    }

    async fn start_session(&self, session: Session) {
        *self.current.lock().await = Some(session.clone());
        // No receivers is fine
        let _ = self.events.send(AuthEvent::SignedIn(session));
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> AppResult<SignUpOutcome> {
        let key = email.to_lowercase();
        let password_hash = hash_password(password)?;
        let user = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(&key) {
                return Err(AppError::Authentication("User already registered".to_string()));
            }
            let user = SessionUser {
                id: Uuid::new_v4().to_string(),
                email: Some(email.to_string()),
                user_metadata: UserMetadata {
                    username: Some(username.to_string()),
                },
            };
            accounts.insert(
                key,
                Account {
                    password_hash,
                    user: user.clone(),
                },
            );
            user
        };

        if let Some(profiles) = &self.profiles {
            profiles
                .insert("profiles", &json!({ "id": user.id, "username": username }))
                .await?;
        }

        let session = Self::issue_session(&user);
        self.start_session(session.clone()).await;
        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let user = {
            let accounts = self.accounts.lock().await;
            match accounts.get(&email.to_lowercase()) {
                Some(account) if verify_password(&account.password_hash, password)? => {
                    account.user.clone()
                }
                _ => return Err(AppError::Authentication("Invalid login credentials".to_string())),
            }
        };
        let session = Self::issue_session(&user);
        self.start_session(session.clone()).await;
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        *self.current.lock().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Session>> {
        Ok(self.current.lock().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
