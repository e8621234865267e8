//! Profiles repository

use std::sync::Arc;

use validator::Validate;

use super::{fetch_lookup, first_row};
use crate::{
    datasource::{DataSource, Query},
    error::{require_id, AppError, AppResult},
    models::{
        profile::{Profile, UpdateProfile},
        Lookup,
    },
};

const TABLE: &str = "profiles";

#[derive(Clone)]
pub struct ProfilesRepository {
    source: Arc<dyn DataSource>,
}

impl ProfilesRepository {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Profile keyed by the identity user id
    pub async fn get_user_profile(&self, user_id: &str) -> AppResult<Lookup<Profile>> {
        let user_id = require_id("User ID", user_id)?;
        let query = Query::table(TABLE).eq("id", user_id);
        fetch_lookup(self.source.as_ref(), &query, "fetching profile").await
    }

    pub async fn update_profile(&self, user_id: &str, updates: &UpdateProfile) -> AppResult<Profile> {
        let user_id = require_id("User ID", user_id)?;
        updates
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if updates.username.is_none() && updates.is_premium.is_none() {
            return Err(AppError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }

        let changes = serde_json::to_value(updates)?;
        let rows = self
            .source
            .update(&Query::table(TABLE).eq("id", user_id), &changes)
            .await
            .map_err(|e| e.context("updating profile"))?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Profile {} not found", user_id)));
        }
        first_row(rows, "updating profile")
    }
}
