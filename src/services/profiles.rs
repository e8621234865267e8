//! Profile service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::profile::{Profile, UpdateProfile},
    repository::Repository,
};

#[derive(Clone)]
pub struct ProfilesService {
    repository: Repository,
}

impl ProfilesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Profile of a user; a missing profile is an error here
    pub async fn get(&self, user_id: &str) -> AppResult<Profile> {
        self.repository
            .profiles
            .get_user_profile(user_id)
            .await?
            .found_or(|| AppError::NotFound(format!("Profile {} not found", user_id)))
    }

    pub async fn update(&self, user_id: &str, data: &UpdateProfile) -> AppResult<Profile> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.profiles.update_profile(user_id, data).await
    }
}
