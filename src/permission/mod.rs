//! 客户端路由授权：菜单权限拉取与路径裁决。

mod guard;
mod policy;

pub use guard::{AuthStatus, FetchError, MenuSource, Outcome, Permissions, RouteGuard, Session};
pub use policy::{
    AllowedPaths, DASHBOARD_PATH, SIGNIN_PATH, UNAUTHORIZED_PATH, Whitelist, is_path_allowed, normalize_path,
};
