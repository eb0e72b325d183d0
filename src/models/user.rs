use serde::{Deserialize, Serialize};

use crate::utils::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn from_flag(is_active: bool) -> Self {
        if is_active {
            UserStatus::Active
        } else {
            UserStatus::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == UserStatus::Active
    }
}

/// 后台账号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub level_code: String,
    pub photo: Option<String>,
    pub market_code: Option<String>,
    pub status: UserStatus,
    /// 当前唯一有效的会话令牌，置空即注销全部会话
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
}

/// 角色/级别
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub code: String,
    pub name: String,
}

/// 鉴权中间件放进请求扩展里的调用方身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub code: String,
    pub name: String,
    pub level_code: String,
    pub market_code: Option<String>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            code: claims.sub,
            name: claims.name,
            level_code: claims.level,
            market_code: claims.market,
        }
    }
}
