use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::models::user::User;
use crate::result::ApiResponse;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,            // 用户编码
    pub name: String,           // 显示名称
    pub level: String,          // 角色/级别编码
    pub market: Option<String>, // 所属市场编码
    pub exp: i64,               // 过期时间
    pub iat: i64,               // 签发时间
    pub jti: String,            // 同一秒内多次登录也能得到不同令牌
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("令牌有效期超出范围: {0} 秒")]
    ExpirationOutOfRange(u64),
    #[error(transparent)]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// 为用户签发会话令牌，返回 (令牌, 过期时间戳)
pub fn generate_token(user: &User, config: &Config) -> Result<(String, i64), TokenError> {
    let now = Utc::now();
    let ttl_secs = config.jwt_expiration().as_secs();
    let expiration = i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(TokenError::ExpirationOutOfRange(ttl_secs))?
        .timestamp();

    let claims = Claims {
        sub: user.code.clone(),
        name: user.name.clone(),
        level: user.level_code.clone(),
        market: user.market_code.clone(),
        exp: expiration,
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const RATE_LIMIT: i32 = 1005;
    pub const TOKEN_REVOKED: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}
