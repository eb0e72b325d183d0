use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::CacheBackend;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// 进程内缓存，用于测试和没有 Redis 的本地调试
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未过期的键值
    pub fn value(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|e| e.is_live(Instant::now()))
            .map(|e| e.value.clone())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// 模拟连接故障，之后的所有操作都返回错误
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), redis::RedisError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(redis::RedisError::from((redis::ErrorKind::IoError, "缓存不可用")));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.value(key))
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), redis::RedisError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs.max(1));
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn incr_window(&self, key: &str, window_secs: u64) -> Result<u64, redis::RedisError> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let entry = entries
            .entry(key.to_string())
            .and_modify(|e| {
                if !e.is_live(now) {
                    e.value = "0".into();
                    e.expires_at = None;
                }
            })
            .or_insert_with(|| Entry {
                value: "0".into(),
                expires_at: None,
            });

        let count = entry.value.parse::<u64>().unwrap_or(0) + 1;
        entry.value = count.to_string();
        if entry.expires_at.is_none() {
            entry.expires_at = Some(now + Duration::from_secs(window_secs.max(1)));
        }
        Ok(count)
    }
}
