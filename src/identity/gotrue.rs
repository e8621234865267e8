//! GoTrue client for the hosted identity API

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use super::{IdentityProvider, EVENT_CAPACITY};
use crate::{
    config::{AuthConfig, DataConfig},
    error::{AppError, AppResult},
    models::{session::SignUpOutcome, AuthEvent, Session, SessionUser},
};

/// Refresh this long before the access token expires
const REFRESH_MARGIN_SECS: i64 = 60;
const RETRY_DELAY: StdDuration = StdDuration::from_secs(10);

/// Token grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: SessionUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            user: token.user,
        }
    }
}

/// Sign-up answers with a session when accounts are auto-confirmed,
/// otherwise with the bare user awaiting confirmation
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(SessionUser),
}

/// The auth API has used several error shapes over time
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    error: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueError {
    fn message(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
    }
}

/// Talks to `{url}/auth/v1` and holds the current session
pub struct GoTrueClient {
    http: Client,
    auth_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    session_file: Option<PathBuf>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueClient {
    pub fn new(data: &DataConfig, auth: &AuthConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(StdDuration::from_secs(data.timeout_secs))
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            auth_url: format!("{}/auth/v1", data.url.trim_end_matches('/')),
            anon_key: data.anon_key.clone(),
            session: RwLock::new(None),
            session_file: auth.session_file.clone(),
            events,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/{}", self.auth_url, path))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error: GoTrueError = response.json().await.unwrap_or_default();
        let message = error.message().unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::UNPROCESSABLE_ENTITY => Err(AppError::Authentication(message)),
            _ => Err(AppError::remote(
                error.error_code.or_else(|| Some(status.as_u16().to_string())),
                message,
            )),
        }
    }

    async fn grant(&self, grant_type: &str, body: serde_json::Value) -> AppResult<Session> {
        let request = self
            .post(&format!("token?grant_type={}", grant_type))
            .json(&body);
        let token: TokenResponse = self.send(request).await?.json().await?;
        Ok(token.into())
    }

    async fn store(&self, session: Option<Session>) {
        if let Some(path) = &self.session_file {
            if let Err(e) = persist(path, session.as_ref()).await {
                tracing::warn!(path = %path.display(), "Failed to persist session: {}", e);
            }
        }
        *self.session.write().await = session;
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers yet is fine
        let _ = self.events.send(event);
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh(&self) -> AppResult<Session> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or_else(|| AppError::Authentication("No session to refresh".to_string()))?;

        match self
            .grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "Session refreshed");
                self.store(Some(session.clone())).await;
                self.publish(AuthEvent::TokenRefreshed(session.clone()));
                Ok(session)
            }
            Err(AppError::Authentication(message)) => {
                tracing::warn!("Session refresh rejected, signing out: {}", message);
                self.store(None).await;
                self.publish(AuthEvent::SignedOut);
                Err(AppError::Authentication(message))
            }
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                Err(e)
            }
        }
    }

    /// Keep the session fresh in the background until the returned task is aborted.
    ///
    /// The task holds the client, so dropping every other handle does not stop it.
    pub fn spawn_auto_refresh(self: Arc<Self>) -> JoinHandle<()> {
        let mut events = self.subscribe();
        tokio::spawn(async move {
            loop {
                let wait = self.session.read().await.as_ref().map(|s| {
                    (s.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) - Utc::now())
                        .to_std()
                        .unwrap_or(StdDuration::ZERO)
                });

                match wait {
                    Some(wait) => {
                        tokio::select! {
                            _ = tokio::time::sleep(wait) => {
                                if self.refresh().await.is_err() {
                                    tokio::time::sleep(RETRY_DELAY).await;
                                }
                            }
                            event = events.recv() => {
                                if matches!(event, Err(broadcast::error::RecvError::Closed)) {
                                    break;
                                }
                            }
                        }
                    }
                    None => {
                        if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                            break;
                        }
                    }
                }
            }
        })
    }
}

async fn persist(path: &Path, session: Option<&Session>) -> AppResult<()> {
    match session {
        Some(session) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;
            }
            let json = serde_json::to_vec_pretty(session)?;
            tokio::fs::write(path, json)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))
        }
        None => match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(e.to_string())),
        },
    }
}

async fn restore(path: &Path) -> Option<Session> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring unreadable session file: {}", e);
            None
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> AppResult<SignUpOutcome> {
        let request = self.post("signup").json(&json!({
            "email": email,
            "password": password,
            "data": { "username": username },
        }));
        let response: SignUpResponse = self.send(request).await?.json().await?;

        match response {
            SignUpResponse::Session(token) => {
                let session: Session = token.into();
                tracing::info!(user_id = %session.user.id, "Signed up and signed in");
                self.store(Some(session.clone())).await;
                self.publish(AuthEvent::SignedIn(session.clone()));
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "Signed up, awaiting confirmation");
                Ok(SignUpOutcome {
                    user,
                    session: None,
                })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let session = self
            .grant("password", json!({ "email": email, "password": password }))
            .await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.store(Some(session.clone())).await;
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        let token = self.session.read().await.as_ref().map(|s| s.access_token.clone());
        if let Some(token) = token {
            let request = self.post("logout").bearer_auth(token);
            if let Err(e) = self.send(request).await {
                // The local session is dropped either way
                tracing::warn!("Remote sign-out failed: {}", e);
            }
        }
        self.store(None).await;
        self.publish(AuthEvent::SignedOut);
        tracing::info!("Signed out");
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Session>> {
        let mut current = self.session.read().await.clone();
        if current.is_none() {
            if let Some(path) = &self.session_file {
                current = restore(path).await;
                *self.session.write().await = current.clone();
            }
        }

        match current {
            Some(session) if session.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)) => {
                match self.refresh().await {
                    Ok(session) => Ok(Some(session)),
                    Err(AppError::Authentication(_)) => Ok(None),
                    Err(e) => Err(e),
                }
            }
            other => Ok(other),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Bytes,
        extract::State,
        http::{HeaderMap, Uri},
        response::{IntoResponse, Response as AxumResponse},
        Json, Router,
    };

    use super::*;
    use crate::models::session::UserMetadata;

    fn config(session_file: Option<PathBuf>) -> (DataConfig, AuthConfig) {
        let data = DataConfig {
            url: "http://127.0.0.1:9/".to_string(),
            ..DataConfig::default()
        };
        (data, AuthConfig { session_file })
    }

    fn session() -> Session {
        Session {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at: Utc::now() + Duration::hours(1),
            user: SessionUser {
                id: "u-1".into(),
                email: Some("reader@example.com".into()),
                user_metadata: UserMetadata {
                    username: Some("reader".into()),
                },
            },
        }
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let with_session = json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "u-1", "email": "a@example.com", "user_metadata": { "username": "a" } }
        });
        assert!(matches!(
            serde_json::from_value::<SignUpResponse>(with_session).unwrap(),
            SignUpResponse::Session(_)
        ));

        let pending = json!({ "id": "u-1", "email": "a@example.com", "user_metadata": {} });
        assert!(matches!(
            serde_json::from_value::<SignUpResponse>(pending).unwrap(),
            SignUpResponse::User(_)
        ));
    }

    #[test]
    fn test_error_message_precedence() {
        let error: GoTrueError = serde_json::from_value(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(error.message().as_deref(), Some("Invalid login credentials"));

        let error: GoTrueError =
            serde_json::from_value(json!({ "code": 422, "msg": "User already registered" })).unwrap();
        assert_eq!(error.message().as_deref(), Some("User already registered"));
    }

    #[test]
    fn test_urls() {
        let (data, auth) = config(None);
        let client = GoTrueClient::new(&data, &auth).unwrap();
        assert_eq!(client.auth_url, "http://127.0.0.1:9/auth/v1");
    }

    /// Answers like the hosted auth API for one known account
    #[derive(Clone, Default)]
    struct Stub {
        seen: Arc<std::sync::Mutex<Vec<(String, String, HeaderMap)>>>,
    }

    impl Stub {
        fn last(&self) -> (String, String, HeaderMap) {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    fn token_body() -> serde_json::Value {
        json!({
            "access_token": "at-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt-1",
            "user": {
                "id": "u-1",
                "email": "reader@example.com",
                "user_metadata": { "username": "reader" }
            }
        })
    }

    async fn answer(State(stub): State<Stub>, uri: Uri, headers: HeaderMap, body: Bytes) -> AxumResponse {
        let path = uri.path().to_string();
        let query = uri.query().unwrap_or_default().to_string();
        stub.seen.lock().unwrap().push((path.clone(), query, headers));
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();

        match path.as_str() {
            "/auth/v1/token" if body["password"] == "secret123" => Json(token_body()).into_response(),
            "/auth/v1/token" => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
            )
                .into_response(),
            "/auth/v1/signup" if body["email"] == "taken@example.com" => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "code": 422, "msg": "User already registered" })),
            )
                .into_response(),
            "/auth/v1/signup" => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error_code": "unexpected_failure", "msg": "Database error saving new user" })),
            )
                .into_response(),
            "/auth/v1/logout" => StatusCode::NO_CONTENT.into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn serve(stub: Stub) -> GoTrueClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(answer).with_state(stub);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let data = DataConfig {
            url: format!("http://{}", addr),
            anon_key: "anon-key".to_string(),
            timeout_secs: 5,
            ..DataConfig::default()
        };
        GoTrueClient::new(&data, &AuthConfig::default()).unwrap()
    }

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_password_grant_signs_in() {
        let stub = Stub::default();
        let client = serve(stub.clone()).await;
        let mut events = client.subscribe();

        let session = client.sign_in("reader@example.com", "secret123").await.unwrap();
        assert_eq!(session.access_token, "at-1");
        assert_eq!(session.user.user_metadata.username.as_deref(), Some("reader"));
        assert!(!session.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)));

        let (path, query, headers) = stub.last();
        assert_eq!(path, "/auth/v1/token");
        assert_eq!(query, "grant_type=password");
        assert_eq!(header(&headers, "apikey"), Some("anon-key"));

        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedIn(session.clone()));
        assert_eq!(client.current_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_authentication_errors() {
        let client = serve(Stub::default()).await;

        match client.sign_in("reader@example.com", "wrong").await {
            Err(AppError::Authentication(message)) => assert_eq!(message, "Invalid login credentials"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        match client.sign_up("taken@example.com", "secret123", "taken").await {
            Err(AppError::Authentication(message)) => assert_eq!(message, "User already registered"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(client.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_failures_are_remote_errors() {
        let client = serve(Stub::default()).await;

        match client.sign_up("new@example.com", "secret123", "new").await {
            Err(AppError::Remote { code, message }) => {
                assert_eq!(code.as_deref(), Some("unexpected_failure"));
                assert_eq!(message, "Database error saving new user");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_out_revokes_the_session_token() {
        let stub = Stub::default();
        let client = serve(stub.clone()).await;
        client.sign_in("reader@example.com", "secret123").await.unwrap();
        let mut events = client.subscribe();

        client.sign_out().await.unwrap();
        let (path, _, headers) = stub.last();
        assert_eq!(path, "/auth/v1/logout");
        assert_eq!(header(&headers, "authorization"), Some("Bearer at-1"));
        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedOut);
        assert_eq!(client.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_restored_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        persist(&path, Some(&session())).await.unwrap();

        let (data, auth) = config(Some(path.clone()));
        let client = GoTrueClient::new(&data, &auth).unwrap();
        let restored = client.current_session().await.unwrap().unwrap();
        assert_eq!(restored.user.id, "u-1");

        persist(&path, None).await.unwrap();
        assert!(!path.exists());
    }
}
