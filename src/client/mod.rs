//! 后台 REST 接口的客户端。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::models::{CurrentUser, MenuMap};
use crate::permission::{FetchError, MenuSource};
use crate::result::ApiResponse;
use crate::routes::auth::{LogoutResponse, SignInRequest, SignInResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP {status}: {message}")]
    Status {
        status: StatusCode,
        code: Option<i32>,
        message: String,
    },
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("响应缺少数据")]
    EmptyBody,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401/403：会话无效或无权访问
    pub fn is_auth(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err.status() {
            Some(status) if err.is_auth() => FetchError::Auth(status.as_u16()),
            _ => FetchError::Transient(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` 含 API 前缀，例如 `http://localhost:3000/api`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn sign_in(&self, user_code: &str, password: &str) -> Result<SignInResponse, ClientError> {
        let request = self.http.post(self.url("/auth/signin")).json(&SignInRequest {
            user_code: user_code.to_string(),
            password: password.to_string(),
        });
        send(request).await
    }

    pub async fn logout(&self, token: &str) -> Result<LogoutResponse, ClientError> {
        send(self.http.post(self.url("/auth/logout")).bearer_auth(token)).await
    }

    pub async fn me(&self, token: &str) -> Result<CurrentUser, ClientError> {
        send(self.http.get(self.url("/auth/me")).bearer_auth(token)).await
    }

    pub async fn fetch_menus(&self, level_code: &str, token: &str) -> Result<MenuMap, ClientError> {
        let url = self.url(&format!("/menus/{}", level_code));
        send(self.http.get(url).bearer_auth(token)).await
    }
}

#[async_trait]
impl MenuSource for ApiClient {
    async fn fetch_menus(&self, level_code: &str, token: &str) -> Result<MenuMap, FetchError> {
        ApiClient::fetch_menus(self, level_code, token)
            .await
            .map_err(FetchError::from)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        // 错误体不一定是 JSON（例如框架自带的提取器拒绝）
        let (code, message) = match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes) {
            Ok(body) => (Some(body.code), body.msg),
            Err(_) => (None, String::from_utf8_lossy(&bytes).into_owned()),
        };
        return Err(ClientError::Status { status, code, message });
    }

    let body: ApiResponse<T> = serde_json::from_slice(&bytes)?;
    if !body.is_success() {
        return Err(ClientError::Status {
            status,
            code: Some(body.code),
            message: body.msg,
        });
    }
    body.resp_data.ok_or(ClientError::EmptyBody)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> ClientError {
        ClientError::Status {
            status,
            code: None,
            message: String::new(),
        }
    }

    #[test]
    fn auth_statuses_become_auth_fetch_errors() {
        assert!(matches!(
            FetchError::from(status_error(StatusCode::UNAUTHORIZED)),
            FetchError::Auth(401)
        ));
        assert!(matches!(
            FetchError::from(status_error(StatusCode::FORBIDDEN)),
            FetchError::Auth(403)
        ));
    }

    #[test]
    fn other_failures_are_transient() {
        assert!(matches!(
            FetchError::from(status_error(StatusCode::BAD_GATEWAY)),
            FetchError::Transient(_)
        ));
        assert!(matches!(FetchError::from(ClientError::EmptyBody), FetchError::Transient(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ApiClient::with_client(Client::new(), "http://localhost:3000/api/");
        assert_eq!(client.url("/auth/me"), "http://localhost:3000/api/auth/me");
    }
}
