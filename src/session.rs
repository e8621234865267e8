//! Process-wide session state
//!
//! One [`SessionStore`] owns the current session. It is seeded from the
//! identity provider at startup and a single background task applies every
//! session-change notification afterwards. Everything else reads it through
//! cloned [`SessionReader`] handles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

use crate::{
    error::{AppError, AppResult},
    identity::IdentityProvider,
    models::{Session, SessionUser},
};

/// Owner of the session cell, the task that keeps it current and any
/// background work tied to the session's lifetime
pub struct SessionStore {
    reader: SessionReader,
    task: JoinHandle<()>,
    companions: Vec<JoinHandle<()>>,
}

impl SessionStore {
    /// Read the provider's current session, then follow its notifications
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> AppResult<Self> {
        // Subscribe first so nothing published during the initial fetch is missed
        let mut events = provider.subscribe();
        let initial = provider.current_session().await?;
        match &initial {
            Some(session) => tracing::info!(user_id = %session.user.id, "Restored session"),
            None => tracing::info!("No active session"),
        }

        let (tx, rx) = watch::channel(initial);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        tracing::debug!(signed_in = event.session().is_some(), "Session change");
                        tx.send_replace(event.session().cloned());
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session notifications lagged, resynchronizing");
                        match provider.current_session().await {
                            Ok(session) => {
                                tx.send_replace(session);
                            }
                            Err(e) => tracing::error!("Failed to resynchronize session: {}", e),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Self {
            reader: SessionReader { rx },
            task,
            companions: Vec::new(),
        })
    }

    pub fn reader(&self) -> SessionReader {
        self.reader.clone()
    }

    /// Stop `task` together with the store
    pub fn attach(&mut self, task: JoinHandle<()>) {
        self.companions.push(task);
    }

    /// Stop following notifications and every attached task; readers keep the last value
    pub fn shutdown(self) {
        self.task.abort();
        for task in self.companions {
            task.abort();
        }
    }
}

/// Read-only view of the current session
#[derive(Clone)]
pub struct SessionReader {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionReader {
    /// A reader pinned to one value, with no store behind it
    pub fn fixed(session: Option<Session>) -> Self {
        let (_tx, rx) = watch::channel(session);
        Self { rx }
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.rx.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.rx.borrow().as_ref().map(|s| s.access_token.clone())
    }

    /// Wait for the next change and return the user it leaves behind
    pub async fn changed(&mut self) -> AppResult<Option<SessionUser>> {
        self.rx
            .changed()
            .await
            .map_err(|_| AppError::Internal("Session store stopped".to_string()))?;
        Ok(self.rx.borrow_and_update().as_ref().map(|s| s.user.clone()))
    }

    /// Wait until the session satisfies `settled`, for at most `limit`.
    ///
    /// Returns false when the limit passed or the store stopped first.
    pub async fn settle(
        &self,
        limit: Duration,
        settled: impl Fn(Option<&SessionUser>) -> bool,
    ) -> bool {
        let mut rx = self.rx.clone();
        let wait = rx.wait_for(|session| settled(session.as_ref().map(|s| &s.user)));
        let settled = matches!(tokio::time::timeout(limit, wait).await, Ok(Ok(_)));
        settled
    }

    /// Current user now, then again on every change
    pub fn users(&self) -> impl tokio_stream::Stream<Item = Option<SessionUser>> {
        use tokio_stream::StreamExt;
        WatchStream::new(self.rx.clone()).map(|session| session.map(|s| s.user))
    }
}
