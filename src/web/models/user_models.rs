use serde::Deserialize;

use crate::db::entities::user;
use crate::security::Role;
use super::UserResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub surname: String,
    #[serde(default)]
    pub address: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub profile_picture_filename: Option<String>,
}

impl UserResponse {
    pub fn from_user(user: user::Model, roles: &[Role]) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            surname: user.surname,
            address: user.address,
            email: user.email,
            enabled: user.enabled,
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        }
    }
}
