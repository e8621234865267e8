//! Business logic services

pub mod auth;
pub mod catalog;
pub mod library;
pub mod profiles;

use std::sync::Arc;

use crate::{identity::IdentityProvider, repository::Repository, session::SessionReader};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub library: library::LibraryService,
    pub profiles: profiles::ProfilesService,
}

impl Services {
    /// Create all services over the given repository and identity provider
    pub fn new(
        repository: Repository,
        identity: Arc<dyn IdentityProvider>,
        session: SessionReader,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(identity, session),
            catalog: catalog::CatalogService::new(repository.clone()),
            library: library::LibraryService::new(repository.clone()),
            profiles: profiles::ProfilesService::new(repository),
        }
    }
}
