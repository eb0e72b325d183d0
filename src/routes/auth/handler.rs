use axum::extract::{Extension, Json, State};

use crate::{
    AppState,
    error::AppError,
    models::CurrentUser,
    result::ApiResponse,
    utils::{generate_token, success_to_api_response, verify_password},
};

use super::model::{LogoutResponse, SignInRequest, SignInResponse, UserProfile};

#[axum::debug_handler]
pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<ApiResponse<SignInResponse>>, AppError> {
    let user_code = req.user_code.trim();
    if user_code.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("用户编码和密码不能为空".to_string()));
    }

    // 用户不存在与密码错误返回同一个错误
    let user = state
        .users
        .find_user(user_code)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::info!("Failed sign-in for user: {}", user.code);
        return Err(AppError::InvalidCredentials);
    }

    if !user.status.is_active() {
        return Err(AppError::AccountDisabled);
    }

    // 先完成所有查询，写入令牌之前的失败不能影响已有会话
    let level = state.users.find_level(&user.level_code).await?;

    // 新令牌覆盖旧令牌，之前的会话随即失效
    let (token, expires_at) = generate_token(&user, &state.config)?;
    state.users.set_session_token(&user.code, Some(&token)).await?;
    tracing::info!("User signed in: {}", user.code);

    Ok(success_to_api_response(SignInResponse {
        token,
        expires_at,
        user: UserProfile::new(user, level),
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<LogoutResponse>>, AppError> {
    state.users.set_session_token(&current.code, None).await?;
    tracing::info!("User signed out: {}", current.code);

    Ok(success_to_api_response(LogoutResponse {
        user_code: current.code,
    }))
}

/// 返回鉴权中间件解析出的身份
#[axum::debug_handler]
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<ApiResponse<CurrentUser>> {
    success_to_api_response(current)
}
