//! Bookshelf
//!
//! Personal book tracking server. Books, per-user library state and
//! profiles live in a hosted Postgres reached through its REST interface;
//! accounts and sessions are delegated to the hosted identity API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod datasource;
pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod repository;
pub mod services;
pub mod session;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub session: session::SessionReader,
    pub guard: Arc<guard::RouteGuard>,
}

/// Wire the configured backend into services and shared state.
///
/// The returned [`session::SessionStore`] keeps the session cell current and
/// must outlive the server; shutting it down also stops token refresh.
pub async fn build_state(
    config: AppConfig,
) -> AppResult<(AppState, session::SessionStore)> {
    let (source, provider, store): (
        Arc<dyn datasource::DataSource>,
        Arc<dyn identity::IdentityProvider>,
        session::SessionStore,
    ) = match config.data.backend {
        crate::config::Backend::Remote => {
            let gotrue = Arc::new(identity::gotrue::GoTrueClient::new(&config.data, &config.auth)?);
            let mut store = session::SessionStore::start(gotrue.clone()).await?;
            store.attach(gotrue.clone().spawn_auto_refresh());
            let source = datasource::postgrest::PostgrestClient::new(&config.data, store.reader())?;
            tracing::info!(url = %config.data.url, "Using hosted data service");
            let source: Arc<dyn datasource::DataSource> = Arc::new(source);
            let provider: Arc<dyn identity::IdentityProvider> = gotrue;
            (source, provider, store)
        }
        crate::config::Backend::Memory => {
            let source = Arc::new(datasource::memory::MemoryDataSource::new());
            let provider = Arc::new(
                identity::memory::MemoryIdentityProvider::new().with_profiles(source.clone()),
            );
            let store = session::SessionStore::start(provider.clone()).await?;
            tracing::warn!("Using in-memory backend, data is lost on exit");
            let source: Arc<dyn datasource::DataSource> = source;
            let provider: Arc<dyn identity::IdentityProvider> = provider;
            (source, provider, store)
        }
    };

    let reader = store.reader();
    let repository = repository::Repository::new(source);
    let services = services::Services::new(repository, provider, reader.clone());
    let state = AppState {
        guard: Arc::new(guard::RouteGuard::new(&config.guard)),
        config: Arc::new(config),
        services: Arc::new(services),
        session: reader,
    };
    Ok((state, store))
}
