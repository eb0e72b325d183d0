use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{MenuStore, StoreError, UserStore};
use crate::models::{Level, MenuRow, User, UserStatus};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    code: String,
    name: String,
    password_hash: String,
    email: Option<String>,
    phone: Option<String>,
    level_code: String,
    photo: Option<String>,
    market_code: Option<String>,
    is_active: bool,
    session_token: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            code: row.code,
            name: row.name,
            password_hash: row.password_hash,
            email: row.email,
            phone: row.phone,
            level_code: row.level_code,
            photo: row.photo,
            market_code: row.market_code,
            status: UserStatus::from_flag(row.is_active),
            session_token: row.session_token,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, code: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT code, name, password_hash, email, phone, level_code, photo,
                   market_code, is_active, session_token
            FROM users
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_level(&self, code: &str) -> Result<Option<Level>, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT code, name
            FROM levels
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(code, name)| Level { code, name }))
    }

    async fn set_session_token(&self, code: &str, token: Option<&str>) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET session_token = $1, updated_at = NOW()
            WHERE code = $2
            "#,
        )
        .bind(token)
        .bind(code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("Session token update matched no user: {}", code);
        }
        Ok(())
    }
}

#[async_trait]
impl MenuStore for PgStore {
    async fn menus_for_level(&self, level_code: &str) -> Result<Vec<MenuRow>, StoreError> {
        let rows = sqlx::query_as::<_, MenuRow>(
            r#"
            SELECT m.id, m.parent_id, m.category, m.name, m.path, m.sort_order
            FROM menus m
            JOIN level_menus lm ON lm.menu_id = m.id
            WHERE lm.level_code = $1
            ORDER BY m.sort_order, m.id
            "#,
        )
        .bind(level_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
