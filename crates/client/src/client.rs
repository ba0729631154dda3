use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use services::services::auth::{LoginResponse, RefreshResponse};
use tracing::{debug, warn};
use utils::{pagination::PageRequest, response::ApiResponse};

use crate::{
    error::ClientError,
    token::{MemoryTokenStore, TokenStore},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `API_BASE_URL` and `API_TIMEOUT_SECS`, both optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = match lookup("API_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ClientError::Config(format!(
                        "API_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    )));
                }
            },
            None => DEFAULT_TIMEOUT,
        };
        Ok(Self { base_url, timeout })
    }
}

/// HTTP wrapper around the back-office API. Attaches the stored bearer token
/// to every call and clears it when the server answers 401.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Self::with_token_store(base_url, timeout, Arc::new(MemoryTokenStore::new()))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn with_token_store(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.tokens.set(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.get().is_some()
    }

    /// Logs in and keeps the access token for subsequent calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let session: LoginResponse = self.post("/auth/login", &body).await?;
        self.tokens.set(session.token.clone());
        debug!(user_id = %session.user.id, "Logged in");
        Ok(session)
    }

    /// Swaps the stored access token for a fresh one from `refresh_token`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ClientError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let refreshed: RefreshResponse = self.post("/auth/refresh", &body).await?;
        self.tokens.set(refreshed.token.clone());
        Ok(refreshed)
    }

    /// Revokes the server session. The local token is dropped even if the call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.send_empty(self.request(Method::POST, "/auth/logout")).await;
        self.tokens.clear();
        result.map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.tokens.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and unwraps the `{success, data, error}` envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "Unauthorized response, clearing token");
            self.tokens.clear();
            return Err(ClientError::Unauthorized);
        }

        let bytes = response.bytes().await?;
        let envelope = match serde_json::from_slice::<ApiResponse<T>>(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(status_error(status)),
            Err(e) => return Err(ClientError::Decode(e)),
        };

        if !status.is_success() || !envelope.is_success() {
            return Err(match envelope.error_body() {
                Some(error) => ClientError::Api {
                    status: error.status_code,
                    message: error.message.clone(),
                },
                None => status_error(status),
            });
        }
        Ok(envelope)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.execute(request)
            .await?
            .into_data()
            .ok_or(ClientError::MissingData)
    }

    /// For endpoints that answer with only a message.
    async fn send_empty(&self, request: RequestBuilder) -> Result<Option<String>, ClientError> {
        let envelope = self.execute::<serde_json::Value>(request).await?;
        Ok(envelope.message().map(str::to_owned))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    /// GET with `filters` and `page` flattened into one query string.
    pub async fn get_with_query<T, F>(
        &self,
        path: &str,
        filters: &F,
        page: &PageRequest,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(filters).query(page))
            .await
    }

    pub async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        page: &PageRequest,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path).query(page)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    /// PATCH without a body, for state-flip endpoints like `/leer`.
    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::PATCH, path)).await
    }

    /// Returns the server's confirmation message, if any.
    pub async fn delete(&self, path: &str) -> Result<Option<String>, ClientError> {
        self.send_empty(self.request(Method::DELETE, path)).await
    }
}

fn status_error(status: StatusCode) -> ClientError {
    ClientError::Api {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());

        let config = ClientConfig::from_lookup(|key| match key {
            "API_BASE_URL" => Some("https://api.clinica.test/api/v1".to_string()),
            "API_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "https://api.clinica.test/api/v1");
        assert_eq!(config.timeout, Duration::from_secs(3));

        let err = ClientConfig::from_lookup(|key| (key == "API_TIMEOUT_SECS").then(|| "0".to_string()));
        assert!(matches!(err, Err(ClientError::Config(_))));
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let client = ApiClient::new("http://localhost:3001/api/v1/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001/api/v1");
        assert_eq!(client.url("/clientes"), "http://localhost:3001/api/v1/clientes");
        assert_eq!(client.url("sedes/1"), "http://localhost:3001/api/v1/sedes/1");
    }

    #[test]
    fn token_is_shared_between_clones() {
        let client = ApiClient::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT).unwrap();
        let clone = client.clone();
        client.set_token("abc");
        assert!(clone.is_authenticated());
        assert_eq!(clone.token().as_deref(), Some("abc"));
    }
}
