use serde::{Deserialize, Serialize};

use crate::models::{Level, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    pub user_code: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub level_code: String,
    pub level_name: Option<String>,
    pub market_code: Option<String>,
    pub photo: Option<String>,
}

impl UserProfile {
    pub fn new(user: User, level: Option<Level>) -> Self {
        Self {
            code: user.code,
            name: user.name,
            email: user.email,
            phone: user.phone,
            level_code: user.level_code,
            level_name: level.map(|l| l.name),
            market_code: user.market_code,
            photo: user.photo,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub user_code: String,
}
