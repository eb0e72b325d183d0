use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors, rate_limit},
    routes,
};

// 认证相关的公开路由
fn public_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(routes::auth::signin))
        .route_layer(from_fn_with_state(state.clone(), rate_limit))
}

// 需要认证的路由
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route("/menus/{level_code}", get(routes::menu::level_menus))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}

/// 创建主路由，全部挂在配置的 API 前缀下
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .nest(
            &state.config.api_base_uri,
            Router::new()
                .merge(public_routes(&state))
                .merge(protected_routes(&state)),
        )
        .layer(from_fn(log_errors));

    // 开发环境允许所有来源
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
