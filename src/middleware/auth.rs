use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState,
    config::Config,
    error::AppError,
    models::CurrentUser,
    store::UserStore,
    utils::verify_token,
};

/// 受保护路由的鉴权中间件。
///
/// 通过后把 [`CurrentUser`] 放进请求扩展，处理函数用 `Extension<CurrentUser>` 取出。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // 请求头不合法时直接拒绝，不查库
    let token = bearer_token(req.headers()).ok_or(AppError::Unauthenticated)?;

    let current = authenticate(state.users.as_ref(), &state.config, &token).await?;
    tracing::debug!("Authenticated request for user: {}", current.code);

    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}

/// 取出 `Authorization: Bearer <token>` 里的令牌，空令牌视为缺失
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
}

/// 校验签名与过期时间，再与用户当前保存的会话令牌逐字节比对
pub async fn authenticate(
    users: &dyn UserStore,
    config: &Config,
    token: &str,
) -> Result<CurrentUser, AppError> {
    let claims = verify_token(token, config).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        AppError::InvalidToken
    })?;

    let user = users
        .find_user(&claims.sub)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if user.session_token.as_deref().map(str::as_bytes) != Some(token.as_bytes()) {
        tracing::info!("Rejected superseded session token for user: {}", user.code);
        return Err(AppError::TokenRevoked);
    }

    Ok(CurrentUser::from(claims))
}
