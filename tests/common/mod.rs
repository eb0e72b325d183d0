#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use pasar_backend::{
    AppState, build_router,
    cache::MemoryCache,
    config::Config,
    models::{MenuRow, User, UserStatus},
    store::MemoryStore,
};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "rahasia123";

pub fn config() -> Config {
    Config {
        database_url: String::new(),
        redis_url: None,
        jwt_secret: "integration-secret".into(),
        jwt_expiration_secs: 3600,
        rate_limit_window_secs: 60,
        rate_limit_requests: 10,
        menu_cache_ttl_secs: 300,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api".into(),
        run_migrations: false,
    }
}

fn user(code: &str, level_code: &str, status: UserStatus) -> User {
    User {
        code: code.into(),
        name: format!("Pengguna {}", code),
        // 测试里用低 cost 加快哈希
        password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
        email: Some(format!("{}@pasar.test", code.to_lowercase())),
        phone: None,
        level_code: level_code.into(),
        photo: None,
        market_code: Some("PSR01".into()),
        status,
        session_token: None,
    }
}

fn menu(id: i64, parent_id: Option<i64>, category: &str, name: &str, path: &str, sort_order: i32) -> MenuRow {
    MenuRow {
        id,
        parent_id,
        category: category.into(),
        name: name.into(),
        path: path.into(),
        sort_order,
    }
}

/// ADM 可见全部菜单，OPR 只能看到仪表盘和会费
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_level("ADM", "Administrator");
    store.insert_level("OPR", "Operator Pasar");

    store.insert_user(user("ADM01", "ADM", UserStatus::Active));
    store.insert_user(user("OPR01", "OPR", UserStatus::Active));
    store.insert_user(user("OFF01", "OPR", UserStatus::Inactive));

    store.insert_menu(menu(1, None, "Utama", "Dashboard", "/dashboard", 0));
    store.insert_menu(menu(2, None, "Master Data", "Pengguna", "/user-management", 1));
    store.insert_menu(menu(3, Some(2), "Master Data", "Level", "/user-management/level", 0));
    store.insert_menu(menu(4, None, "Master Data", "Pasar", "/pasar-management", 2));
    store.insert_menu(menu(5, Some(4), "Master Data", "Lapak", "/pasar-management/lapak", 0));
    store.insert_menu(menu(6, None, "Keuangan", "Iuran", "/iuran", 3));

    store.grant("ADM", &[1, 2, 3, 4, 5, 6]);
    store.grant("OPR", &[1, 6]);

    Arc::new(store)
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    build_router(AppState::new(store.clone(), store, config()))
}

/// 带内存缓存的应用，菜单缓存与登录限流都会启用
pub fn app_with_cache(store: Arc<MemoryStore>, cache: Arc<MemoryCache>, config: Config) -> Router {
    build_router(AppState::new(store.clone(), store, config).with_cache(cache))
}

pub async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn signin_request(user_code: &str, password: &str) -> Request<Body> {
    Request::post("/api/auth/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "user_code": user_code, "password": password }).to_string(),
        ))
        .unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn sign_in(app: &Router, user_code: &str) -> String {
    let (status, body) = call(app, signin_request(user_code, PASSWORD)).await;
    assert_eq!(status, StatusCode::OK, "sign-in failed: {}", body);
    body["resp_data"]["token"].as_str().unwrap().to_string()
}
