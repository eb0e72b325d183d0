use std::sync::Arc;

use config::Config;
use redis::Client as RedisClient;

use cache::{CacheBackend, MenuCache};
use middleware::RateLimiter;
use store::{MenuStore, UserStore};

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod permission;
pub mod result;
pub mod router;
pub mod routes;
pub mod store;
pub mod utils;

pub use router::build_router;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub menus: Arc<dyn MenuStore>,
    pub config: Config,
    pub menu_cache: Option<MenuCache>,
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, menus: Arc<dyn MenuStore>, config: Config) -> Self {
        Self {
            users,
            menus,
            config,
            menu_cache: None,
            rate_limiter: None,
        }
    }

    /// 启用 Redis：角色菜单缓存与登录限流
    pub fn with_redis(self, redis: Arc<RedisClient>) -> Self {
        self.with_cache(redis)
    }

    pub fn with_cache(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.menu_cache = Some(MenuCache::new(backend.clone(), self.config.menu_cache_ttl()));
        self.rate_limiter = Some(Arc::new(RateLimiter::new(backend, &self.config)));
        self
    }
}
