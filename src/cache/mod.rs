// 缓存模块
// 角色菜单缓存与登录限流计数，后端默认是 Redis

mod backend;
mod memory;
mod menu;

use async_trait::async_trait;

pub use memory::MemoryCache;
pub use menu::MenuCache;

/// 角色菜单缓存键前缀
const MENU_LEVEL_PREFIX: &str = "menu:level:";

/// 生成角色菜单缓存键
pub fn menu_level_key(level_code: &str) -> String {
    format!("{}{}", MENU_LEVEL_PREFIX, level_code)
}

/// 生成登录限流计数键
pub fn signin_rate_key(ip: &str) -> String {
    format!("rate_limit:signin:{}", ip)
}

/// 菜单缓存和限流用到的键值操作
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError>;

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), redis::RedisError>;

    /// 计数加一并返回新值；键没有过期时间时设置为 `window_secs`
    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<u64, redis::RedisError>;
}
