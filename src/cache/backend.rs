use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::CacheBackend;

#[async_trait]
impl CacheBackend for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.get_multiplexed_async_connection().await?;
        conn.get(key).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), redis::RedisError> {
        let mut conn = self.get_multiplexed_async_connection().await?;
        conn.set_ex(key, value, ttl_secs.max(1)).await
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<u64, redis::RedisError> {
        let mut conn = self.get_multiplexed_async_connection().await?;

        // INCR 与 TTL 在同一个事务里执行
        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        // -1 表示没有过期时间：首次计数，或上次设置过期时间失败
        if ttl < 0 {
            let _: () = conn.expire(key, window_secs.max(1) as i64).await?;
        }

        Ok(count)
    }
}
