//! Delegated identity: email/password accounts and sessions
//!
//! [`gotrue::GoTrueClient`] talks to the hosted auth API,
//! [`memory::MemoryIdentityProvider`] keeps accounts in process.

pub mod gotrue;
pub mod memory;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    error::AppResult,
    models::{session::SignUpOutcome, AuthEvent, Session},
};

/// Capacity of the session-change notification channel
pub const EVENT_CAPACITY: usize = 16;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account; `username` is stored in the user metadata
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> AppResult<SignUpOutcome>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    async fn sign_out(&self) -> AppResult<()>;

    /// Session the provider currently holds, if any
    async fn current_session(&self) -> AppResult<Option<Session>>;

    /// Session-change notifications, from now on
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
