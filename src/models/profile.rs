//! User profile model

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

/// Per-user metadata keyed by the identity user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

/// Update own profile request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: Option<String>,
    pub is_premium: Option<bool>,
}
