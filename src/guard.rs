//! Route guard for the dashboard pages
//!
//! Decides, per requested path, whether to render or to send the visitor
//! to the login page. The decision only reads the cached session.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{config::GuardConfig, models::SessionUser, AppState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected: HashSet<String>,
    login_path: String,
    protect_all: bool,
}

impl RouteGuard {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            protected: config
                .protected_paths
                .iter()
                .map(|p| normalize(p).to_string())
                .collect(),
            login_path: normalize(&config.login_path).to_string(),
            protect_all: config.protect_all,
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn is_protected(&self, path: &str) -> bool {
        let path = normalize(path);
        if self.protect_all {
            return path != self.login_path;
        }
        self.protected.contains(path)
    }

    pub fn evaluate(&self, path: &str, user: Option<&SessionUser>) -> GuardDecision {
        if user.is_none() && self.is_protected(path) {
            GuardDecision::Redirect(self.login_path.clone())
        } else {
            GuardDecision::Allow
        }
    }
}

/// `/dashboard/library/` and `/dashboard/library` are the same page
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Middleware applying the guard before any page handler runs
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let user = state.session.current_user();
    match state.guard.evaluate(request.uri().path(), user.as_ref()) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(location) => {
            tracing::debug!(path = %request.uri().path(), "Redirecting unauthenticated visitor");
            Redirect::to(&location).into_response()
        }
    }
}
