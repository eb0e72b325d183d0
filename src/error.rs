use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::result::ApiResponse;
use crate::store::StoreError;
use crate::utils::{TokenError, error_codes};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("未登录或缺少有效的身份凭证")]
    Unauthenticated,
    #[error("令牌无效或已过期")]
    InvalidToken,
    #[error("会话已失效，请重新登录")]
    TokenRevoked,
    #[error("用户名或密码错误")]
    InvalidCredentials,
    #[error("账号已停用")]
    AccountDisabled,
    #[error("无权访问该资源")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("请求过于频繁，请在{0}秒后重试")]
    RateLimited(u64),
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    #[error("缓存错误: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("令牌签发失败: {0}")]
    TokenIssue(#[from] TokenError),
    #[error("密码处理失败: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated
            | AppError::InvalidToken
            | AppError::TokenRevoked
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_) | AppError::Cache(_) | AppError::TokenIssue(_) | AppError::Password(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AppError::Unauthenticated | AppError::InvalidToken | AppError::InvalidCredentials => {
                error_codes::AUTH_FAILED
            }
            AppError::TokenRevoked => error_codes::TOKEN_REVOKED,
            AppError::AccountDisabled | AppError::Forbidden => error_codes::PERMISSION_DENIED,
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::RateLimited(_) => error_codes::RATE_LIMIT,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "内部服务器错误".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ApiResponse::<()>::error(self.code(), message));
        (status, body).into_response()
    }
}
