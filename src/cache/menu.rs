use std::sync::Arc;
use std::time::Duration;

use super::{CacheBackend, menu_level_key};
use crate::models::MenuMap;

/// 角色菜单缓存操作
#[derive(Clone)]
pub struct MenuCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl MenuCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// 读取缓存的菜单
    pub async fn get(&self, level_code: &str) -> Result<Option<MenuMap>, redis::RedisError> {
        let result = self.backend.get(&menu_level_key(level_code)).await?;

        match result {
            Some(json) => {
                let menu = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((redis::ErrorKind::IoError, "反序列化错误", e.to_string()))
                })?;
                Ok(Some(menu))
            }
            None => Ok(None),
        }
    }

    /// 写入菜单，过期时间取配置的 TTL
    pub async fn put(&self, level_code: &str, menu: &MenuMap) -> Result<(), redis::RedisError> {
        let json = serde_json::to_string(menu).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::IoError, "序列化错误", e.to_string()))
        })?;

        self.backend
            .set_ex(&menu_level_key(level_code), json, self.ttl.as_secs())
            .await
    }
}
