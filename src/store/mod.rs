//! 持久化协作者。
//!
//! 鉴权与菜单只依赖这里的两个 trait，生产环境用 Postgres 实现，
//! 测试和本地演示用内存实现。

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::models::{Level, MenuRow, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, code: &str) -> Result<Option<User>, StoreError>;

    async fn find_level(&self, code: &str) -> Result<Option<Level>, StoreError>;

    /// 覆盖用户当前的会话令牌，`None` 表示注销。后写者胜。
    async fn set_session_token(&self, code: &str, token: Option<&str>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// 授权给该角色的全部菜单行（含子项），顺序不限
    async fn menus_for_level(&self, level_code: &str) -> Result<Vec<MenuRow>, StoreError>;
}
