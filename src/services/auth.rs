//! Authentication service: sign-up, sign-in and sign-out against the identity provider

use std::sync::Arc;
use std::time::Duration;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    identity::IdentityProvider,
    models::{
        session::{SignInRequest, SignUpOutcome, SignUpRequest},
        Session, SessionUser,
    },
    session::SessionReader,
};

/// How long a sign-in or sign-out waits for the shared session to follow
const SETTLE_LIMIT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    session: SessionReader,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, session: SessionReader) -> Self {
        Self { identity, session }
    }

    /// Create an account; the username defaults to the local part of the email
    pub async fn sign_up(&self, request: &SignUpRequest) -> AppResult<SignUpOutcome> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let username = default_username(&request.email, request.username.as_deref());
        let outcome = self
            .identity
            .sign_up(&request.email, &request.password, &username)
            .await?;
        if outcome.session.is_some() {
            self.settle_on(Some(&outcome.user.id)).await;
        }
        Ok(outcome)
    }

    pub async fn sign_in(&self, request: &SignInRequest) -> AppResult<Session> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let session = self
            .identity
            .sign_in(&request.email, &request.password)
            .await?;
        self.settle_on(Some(&session.user.id)).await;
        Ok(session)
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.identity.sign_out().await?;
        self.settle_on(None).await;
        Ok(())
    }

    /// Let the session store catch up so the next request sees the change
    async fn settle_on(&self, user_id: Option<&str>) {
        let settled = self
            .session
            .settle(SETTLE_LIMIT, |user| user.map(|u| u.id.as_str()) == user_id)
            .await;
        if !settled {
            tracing::warn!("Session store did not observe the change in time");
        }
    }

    /// Currently signed-in user
    pub fn current_user(&self) -> AppResult<SessionUser> {
        self.session
            .current_user()
            .ok_or_else(|| AppError::Authentication("Not signed in".to_string()))
    }

    pub fn session(&self) -> &SessionReader {
        &self.session
    }
}

/// Username to register: the given one, else the email's local part
pub fn default_username(email: &str, username: Option<&str>) -> String {
    match username.map(str::trim).filter(|u| !u.is_empty()) {
        Some(username) => username.to_string(),
        None => email.split('@').next().unwrap_or(email).to_string(),
    }
}
