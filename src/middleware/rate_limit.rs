use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    cache::{CacheBackend, signin_rate_key},
    config::Config,
    error::AppError,
};

/// 按客户端 IP 的固定窗口计数器
#[derive(Clone)]
pub struct RateLimiter {
    backend: Arc<dyn CacheBackend>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &Config) -> Self {
        Self {
            backend,
            window: config.rate_limit_window(),
            max_requests: config.rate_limit_requests,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 记录一次请求，返回是否仍在限额内
    pub async fn hit(&self, ip: &str) -> Result<bool, redis::RedisError> {
        let count = self
            .backend
            .incr_window(&signin_rate_key(ip), self.window.as_secs())
            .await?;
        Ok(count <= u64::from(self.max_requests))
    }
}

/// 优先取代理头，再退回连接地址
pub fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

/// 登录接口限流；未配置 Redis 时直接放行
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return Ok(next.run(req).await);
    };

    let ip = client_ip(&req);
    if !limiter.hit(&ip).await? {
        tracing::warn!("Sign-in rate limit exceeded for ip: {}", ip);
        return Err(AppError::RateLimited(limiter.window().as_secs()));
    }

    Ok(next.run(req).await)
}
