use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::policy::{AllowedPaths, SIGNIN_PATH, UNAUTHORIZED_PATH, Whitelist, is_path_allowed};
use crate::models::MenuMap;

/// 登录后客户端持有的凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_code: String,
    pub level_code: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// 身份尚未确定（例如正在从本地存储恢复会话）
    Resolving,
    SignedOut,
    SignedIn(Session),
}

/// 会话范围内的菜单权限
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permissions {
    Unauthenticated,
    Loading,
    Loaded(AllowedPaths),
    /// 拉取失败，本会话内拒绝所有路径
    Error,
}

/// 一次导航的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Render,
    RedirectToSignIn,
    RedirectToUnauthorized,
}

impl Outcome {
    pub fn redirect_target(self) -> Option<&'static str> {
        match self {
            Outcome::RedirectToSignIn => Some(SIGNIN_PATH),
            Outcome::RedirectToUnauthorized => Some(UNAUTHORIZED_PATH),
            Outcome::Pending | Outcome::Render => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("菜单请求被拒绝，状态码 {0}")]
    Auth(u16),
    #[error("菜单请求失败: {0}")]
    Transient(String),
}

/// 角色菜单的来源
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menus(&self, level_code: &str, token: &str) -> Result<MenuMap, FetchError>;
}

struct GuardState {
    auth: AuthStatus,
    permissions: Permissions,
    /// 每次认证状态变化加一，过期的拉取结果据此丢弃
    epoch: u64,
}

enum Step<'a> {
    Wait(tokio::sync::futures::Notified<'a>),
    Fetch { epoch: u64, session: Session },
}

/// 客户端路由守卫。
///
/// 多个导航任务可以共享同一个守卫（`Arc<RouteGuard<_>>`）。每个会话最多拉取
/// 一次菜单；拉取进行中的其他导航会等待它的结果。
pub struct RouteGuard<S> {
    source: S,
    whitelist: Whitelist,
    state: Mutex<GuardState>,
    settled: Notify,
}

impl<S: MenuSource> RouteGuard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            whitelist: Whitelist::default(),
            state: Mutex::new(GuardState {
                auth: AuthStatus::Resolving,
                permissions: Permissions::Unauthenticated,
                epoch: 0,
            }),
            settled: Notify::new(),
        }
    }

    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.state.lock().auth.clone()
    }

    pub fn permissions(&self) -> Permissions {
        self.state.lock().permissions.clone()
    }

    /// 认证状态变化时清空权限，重复通知同一状态不做任何事
    pub fn set_auth(&self, auth: AuthStatus) {
        {
            let mut state = self.state.lock();
            if state.auth == auth {
                return;
            }
            state.epoch += 1;
            state.auth = auth;
            state.permissions = Permissions::Unauthenticated;
        }
        self.settled.notify_waiters();
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!("Route guard signed in as {}", session.user_code);
        self.set_auth(AuthStatus::SignedIn(session));
    }

    pub fn sign_out(&self) {
        tracing::info!("Route guard signed out");
        self.set_auth(AuthStatus::SignedOut);
    }

    /// 对一次导航做出裁决
    pub async fn navigate(&self, path: &str) -> Outcome {
        loop {
            let step = {
                let mut guard = self.state.lock();
                let state = &mut *guard;
                let session = match &state.auth {
                    AuthStatus::Resolving => return Outcome::Pending,
                    AuthStatus::SignedOut => {
                        state.permissions = Permissions::Unauthenticated;
                        return Outcome::RedirectToSignIn;
                    }
                    AuthStatus::SignedIn(session) => session.clone(),
                };

                let step = match &state.permissions {
                    Permissions::Loaded(allowed) => return self.decide(path, allowed),
                    Permissions::Error => return Outcome::RedirectToUnauthorized,
                    // 先注册再释放锁，避免错过唤醒
                    Permissions::Loading => Step::Wait(self.settled.notified()),
                    Permissions::Unauthenticated => Step::Fetch {
                        epoch: state.epoch,
                        session,
                    },
                };
                if let Step::Fetch { .. } = step {
                    state.permissions = Permissions::Loading;
                }
                step
            };

            match step {
                Step::Wait(notified) => notified.await,
                Step::Fetch { epoch, session } => {
                    if let Some(outcome) = self.fetch(epoch, &session, path).await {
                        return outcome;
                    }
                }
            }
        }
    }

    /// 结果已过期时返回 `None`，由调用方按最新状态重新裁决
    async fn fetch(&self, epoch: u64, session: &Session, path: &str) -> Option<Outcome> {
        tracing::debug!("Fetching menu permissions for level {}", session.level_code);

        let mut pending = PendingFetch { guard: self, epoch, armed: true };
        let result = self.source.fetch_menus(&session.level_code, &session.token).await;
        pending.armed = false;

        let outcome = self.complete(epoch, result, path);
        self.settled.notify_waiters();
        outcome
    }

    fn complete(&self, epoch: u64, result: Result<MenuMap, FetchError>, path: &str) -> Option<Outcome> {
        let mut state = self.state.lock();
        if state.epoch != epoch || !matches!(state.auth, AuthStatus::SignedIn(_)) {
            tracing::debug!("Discarding menu fetch from a previous session");
            return None;
        }

        match result {
            Ok(menu) => {
                let allowed = AllowedPaths::from_menu(&menu);
                tracing::debug!("Loaded {} allowed paths", allowed.len());
                let outcome = self.decide(path, &allowed);
                state.permissions = Permissions::Loaded(allowed);
                Some(outcome)
            }
            Err(FetchError::Auth(status)) => {
                // 服务端已不认这个会话
                tracing::warn!("Menu fetch rejected with status {}, signing out", status);
                state.epoch += 1;
                state.auth = AuthStatus::SignedOut;
                state.permissions = Permissions::Unauthenticated;
                Some(Outcome::RedirectToSignIn)
            }
            Err(e) => {
                tracing::warn!("{}, denying all paths for this session", e);
                state.permissions = Permissions::Error;
                Some(Outcome::RedirectToUnauthorized)
            }
        }
    }

    fn decide(&self, path: &str, allowed: &AllowedPaths) -> Outcome {
        if is_path_allowed(path, allowed, &self.whitelist) {
            Outcome::Render
        } else {
            Outcome::RedirectToUnauthorized
        }
    }
}

/// 导航 future 在拉取途中被丢弃时，把 `Loading` 复位，等待者不会永远挂起
struct PendingFetch<'a, S: MenuSource> {
    guard: &'a RouteGuard<S>,
    epoch: u64,
    armed: bool,
}

impl<S: MenuSource> Drop for PendingFetch<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        {
            let mut state = self.guard.state.lock();
            if state.epoch == self.epoch && state.permissions == Permissions::Loading {
                state.permissions = Permissions::Unauthenticated;
            }
        }
        self.guard.settled.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::models::{MenuCategory, MenuItem, SubItem};

    fn menu() -> MenuMap {
        MenuMap::new(vec![MenuCategory {
            name: "Utama".into(),
            items: vec![
                MenuItem {
                    name: "Dashboard".into(),
                    path: "/dashboard".into(),
                    sub_items: vec![],
                },
                MenuItem {
                    name: "Pengguna".into(),
                    path: "/user-management".into(),
                    sub_items: vec![SubItem {
                        name: "Level".into(),
                        path: "/user-management/level".into(),
                    }],
                },
            ],
        }])
    }

    fn session() -> Session {
        Session {
            user_code: "U001".into(),
            level_code: "ADM".into(),
            token: "token-1".into(),
        }
    }

    /// 按预设结果应答，记录调用次数；`gate` 可用来挂起拉取
    struct ScriptedSource {
        calls: AtomicUsize,
        result: fn() -> Result<MenuMap, FetchError>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn new(result: fn() -> Result<MenuMap, FetchError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result,
                gate: None,
            }
        }

        fn gated(result: fn() -> Result<MenuMap, FetchError>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(result)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MenuSource for ScriptedSource {
        async fn fetch_menus(&self, _level_code: &str, _token: &str) -> Result<MenuMap, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            (self.result)()
        }
    }

    async fn wait_for_calls(guard: &RouteGuard<ScriptedSource>, n: usize) {
        while guard.source().calls() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn resolving_identity_is_pending() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Ok(menu())));
        assert_eq!(guard.navigate("/dashboard").await, Outcome::Pending);
        assert_eq!(guard.source().calls(), 0);
    }

    #[tokio::test]
    async fn signed_out_redirects_to_signin() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Ok(menu())));
        guard.sign_out();
        let outcome = guard.navigate("/dashboard").await;
        assert_eq!(outcome, Outcome::RedirectToSignIn);
        assert_eq!(outcome.redirect_target(), Some("/signin"));
        assert_eq!(guard.source().calls(), 0);
    }

    #[tokio::test]
    async fn loaded_menu_authorizes_paths() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Ok(menu())));
        guard.sign_in(session());

        assert_eq!(guard.navigate("/").await, Outcome::Render);
        assert_eq!(guard.navigate("/user-management/level/7").await, Outcome::Render);
        assert_eq!(guard.navigate("/user-management/reset-password/XYZ").await, Outcome::Render);
        assert_eq!(guard.navigate("/pasar-management").await, Outcome::RedirectToUnauthorized);
        assert_eq!(guard.source().calls(), 1);
    }

    #[tokio::test]
    async fn forbidden_fetch_signs_out() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Err(FetchError::Auth(403))));
        guard.sign_in(session());

        assert_eq!(guard.navigate("/dashboard").await, Outcome::RedirectToSignIn);
        assert_eq!(guard.auth_status(), AuthStatus::SignedOut);
        assert_eq!(guard.permissions(), Permissions::Unauthenticated);
    }

    #[tokio::test]
    async fn transient_failure_fails_closed_without_retry() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Err(FetchError::Transient("503".into()))));
        guard.sign_in(session());

        assert_eq!(guard.navigate("/dashboard").await, Outcome::RedirectToUnauthorized);
        // 白名单也不放行
        assert_eq!(guard.navigate("/profile").await, Outcome::RedirectToUnauthorized);
        assert_eq!(guard.source().calls(), 1);
        assert_eq!(guard.permissions(), Permissions::Error);
    }

    #[tokio::test]
    async fn concurrent_navigations_share_one_fetch() {
        let gate = Arc::new(Notify::new());
        let guard = Arc::new(RouteGuard::new(ScriptedSource::gated(|| Ok(menu()), gate.clone())));
        guard.sign_in(session());

        let mut tasks = Vec::new();
        for path in ["/dashboard", "/user-management", "/iuran", "/", "/profile"] {
            let guard = guard.clone();
            tasks.push(tokio::spawn(async move { guard.navigate(path).await }));
        }

        wait_for_calls(&guard, 1).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        let outcomes: Vec<Outcome> = futures_util::future::join_all(tasks)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(guard.source().calls(), 1);
        assert_eq!(
            outcomes,
            [
                Outcome::Render,
                Outcome::Render,
                Outcome::RedirectToUnauthorized,
                Outcome::Render,
                Outcome::Render,
            ]
        );
    }

    #[tokio::test]
    async fn fetch_finishing_after_sign_out_is_discarded() {
        let gate = Arc::new(Notify::new());
        let guard = Arc::new(RouteGuard::new(ScriptedSource::gated(|| Ok(menu()), gate.clone())));
        guard.sign_in(session());

        let task = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.navigate("/dashboard").await })
        };
        wait_for_calls(&guard, 1).await;

        guard.sign_out();
        gate.notify_one();

        assert_eq!(task.await.unwrap(), Outcome::RedirectToSignIn);
        assert_eq!(guard.permissions(), Permissions::Unauthenticated);
    }

    #[tokio::test]
    async fn new_session_fetches_again() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Ok(menu())));
        guard.sign_in(session());
        assert_eq!(guard.navigate("/dashboard").await, Outcome::Render);

        guard.sign_out();
        guard.sign_in(Session {
            token: "token-2".into(),
            ..session()
        });
        assert_eq!(guard.navigate("/dashboard").await, Outcome::Render);
        assert_eq!(guard.source().calls(), 2);
    }

    #[tokio::test]
    async fn repeated_sign_in_notification_keeps_permissions() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Ok(menu())));
        guard.sign_in(session());
        guard.navigate("/dashboard").await;

        guard.sign_in(session());
        assert!(matches!(guard.permissions(), Permissions::Loaded(_)));
        assert_eq!(guard.source().calls(), 1);
    }

    #[tokio::test]
    async fn custom_whitelist_replaces_default() {
        let guard = RouteGuard::new(ScriptedSource::new(|| Ok(MenuMap::default())))
            .with_whitelist(Whitelist::new(["/bantuan"], ["/pengumuman/"]));
        guard.sign_in(session());

        assert_eq!(guard.navigate("/bantuan").await, Outcome::Render);
        assert_eq!(guard.navigate("/pengumuman/12").await, Outcome::Render);
        assert_eq!(guard.navigate("/profile").await, Outcome::RedirectToUnauthorized);
    }

    #[tokio::test]
    async fn dropped_navigation_releases_waiters() {
        let gate = Arc::new(Notify::new());
        let guard = Arc::new(RouteGuard::new(ScriptedSource::gated(|| Ok(menu()), gate.clone())));
        guard.sign_in(session());

        let first = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.navigate("/dashboard").await })
        };
        wait_for_calls(&guard, 1).await;
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        assert_eq!(guard.permissions(), Permissions::Unauthenticated);

        // 下一次导航重新拉取
        let second = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.navigate("/dashboard").await })
        };
        wait_for_calls(&guard, 2).await;
        gate.notify_one();
        assert_eq!(second.await.unwrap(), Outcome::Render);
    }
}
