use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{MenuStore, StoreError, UserStore};
use crate::models::{Level, MenuRow, User};

/// 进程内存储，用于测试和无数据库的本地调试
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    levels: RwLock<HashMap<String, Level>>,
    menus: RwLock<Vec<MenuRow>>,
    grants: RwLock<HashMap<String, Vec<i64>>>,
    user_lookups: AtomicUsize,
    menu_lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.code.clone(), user);
    }

    pub fn insert_level(&self, code: &str, name: &str) {
        self.levels.write().insert(
            code.to_string(),
            Level {
                code: code.to_string(),
                name: name.to_string(),
            },
        );
    }

    pub fn insert_menu(&self, row: MenuRow) {
        self.menus.write().push(row);
    }

    /// 把菜单授权给某个角色
    pub fn grant(&self, level_code: &str, menu_ids: &[i64]) {
        self.grants
            .write()
            .entry(level_code.to_string())
            .or_default()
            .extend_from_slice(menu_ids);
    }

    pub fn session_token(&self, code: &str) -> Option<String> {
        self.users.read().get(code).and_then(|u| u.session_token.clone())
    }

    /// `find_user` 被调用的次数
    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn menu_lookups(&self) -> usize {
        self.menu_lookups.load(Ordering::SeqCst)
    }

    /// 模拟后端故障，之后的所有调用都返回错误
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, code: &str) -> Result<Option<User>, StoreError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.users.read().get(code).cloned())
    }

    async fn find_level(&self, code: &str) -> Result<Option<Level>, StoreError> {
        self.check_available()?;
        Ok(self.levels.read().get(code).cloned())
    }

    async fn set_session_token(&self, code: &str, token: Option<&str>) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(user) = self.users.write().get_mut(code) {
            user.session_token = token.map(str::to_string);
        }
        Ok(())
    }
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn menus_for_level(&self, level_code: &str) -> Result<Vec<MenuRow>, StoreError> {
        self.menu_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let grants = self.grants.read();
        let Some(ids) = grants.get(level_code) else {
            return Ok(Vec::new());
        };
        Ok(self
            .menus
            .read()
            .iter()
            .filter(|row| ids.contains(&row.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;

    fn user(code: &str) -> User {
        User {
            code: code.into(),
            name: "Budi".into(),
            password_hash: String::new(),
            email: None,
            phone: None,
            level_code: "OPR".into(),
            photo: None,
            market_code: None,
            status: UserStatus::Active,
            session_token: None,
        }
    }

    #[tokio::test]
    async fn session_token_is_overwritten_and_cleared() {
        let store = MemoryStore::new();
        store.insert_user(user("U1"));

        store.set_session_token("U1", Some("a")).await.unwrap();
        store.set_session_token("U1", Some("b")).await.unwrap();
        assert_eq!(store.session_token("U1").as_deref(), Some("b"));

        store.set_session_token("U1", None).await.unwrap();
        assert_eq!(store.session_token("U1"), None);
    }

    #[tokio::test]
    async fn menus_are_filtered_by_grant() {
        let store = MemoryStore::new();
        for (id, path) in [(1, "/dashboard"), (2, "/iuran")] {
            store.insert_menu(MenuRow {
                id,
                parent_id: None,
                category: "Utama".into(),
                name: path.trim_start_matches('/').into(),
                path: path.into(),
                sort_order: 0,
            });
        }
        store.grant("OPR", &[2]);

        let rows = store.menus_for_level("OPR").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path, "/iuran");
        assert!(store.menus_for_level("ADM").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_store_errors() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.find_user("U1").await.is_err());
        assert_eq!(store.user_lookups(), 1);
    }
}
