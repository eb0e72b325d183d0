use std::collections::BTreeSet;

use crate::models::MenuMap;

pub const SIGNIN_PATH: &str = "/signin";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// 任何角色都能访问的账号相关页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new(
            ["/profile", "/reset-password"],
            ["/user-management/reset-password/", "/user-management/detail/"],
        )
    }
}

impl Whitelist {
    /// `prefixes` 按原样做字符串前缀匹配，通常以 `/` 结尾
    pub fn new<E, P>(exact: E, prefixes: P) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            exact: exact.into_iter().map(|p| normalize_path(p.as_ref())).collect(),
            prefixes: prefixes.into_iter().map(|p| p.as_ref().trim().to_string()).collect(),
        }
    }

    pub fn permits(&self, path: &str) -> bool {
        self.exact.iter().any(|p| p == path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// 由角色菜单展开得到的可访问路径集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedPaths(BTreeSet<String>);

impl AllowedPaths {
    /// 展开 分类 -> 菜单项 -> 子项，跳过空路径
    pub fn from_menu(menu: &MenuMap) -> Self {
        menu.paths().collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for AllowedPaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter(|p| !p.as_ref().trim().is_empty())
                .map(|p| normalize_path(p.as_ref()))
                .collect(),
        )
    }
}

/// 统一路径形式：去掉查询串和片段，保证前导 `/`，去掉末尾 `/`
pub fn normalize_path(raw: &str) -> String {
    let path = raw.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// 判断当前路径是否可访问，依次检查：
///
/// 1. 白名单
/// 2. 根路径，只要允许 `/dashboard`
/// 3. 精确匹配
/// 4. 前缀匹配，用于带参数的子路由，只在路径段边界上成立
pub fn is_path_allowed(path: &str, allowed: &AllowedPaths, whitelist: &Whitelist) -> bool {
    let path = normalize_path(path);

    if whitelist.permits(&path) {
        return true;
    }
    if path == "/" && allowed.contains(DASHBOARD_PATH) {
        return true;
    }
    if allowed.contains(&path) {
        return true;
    }

    // "/user" 不能放行 "/user-management"
    allowed.iter().filter(|p| *p != "/").any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    })
}
