use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{LoginRequest, LoginResponse, Year};
use crate::services::SyncStats;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not authorized")]
    Unauthorized,

    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SyncBody {
    stats: SyncStats,
}

/// The catalog endpoints the admin side talks to.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Year>, ClientError>;
    async fn sync_catalog(&self, years: &[Year]) -> Result<SyncStats, ClientError>;
}

pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Logs in and keeps the returned token for later calls.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&body)
            .send()
            .await?;

        let login: LoginResponse = check(response).await?.json().await?;
        self.token = Some(login.token.clone());
        tracing::debug!("logged in as {}", login.username);
        Ok(login)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_catalog(&self) -> Result<Vec<Year>, ClientError> {
        let response = self.client.get(self.url("/api/years")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn sync_catalog(&self, years: &[Year]) -> Result<SyncStats, ClientError> {
        let request = self.client.post(self.url("/api/years/sync")).json(years);
        let response = self.authorized(request).send().await?;
        let body: SyncBody = check(response).await?.json().await?;
        Ok(body.stats)
    }
}

/// Stand-in that serves nothing and accepts every sync.
pub struct NoopCatalogClient;

#[async_trait]
impl CatalogClient for NoopCatalogClient {
    async fn fetch_catalog(&self) -> Result<Vec<Year>, ClientError> {
        Ok(Vec::new())
    }

    async fn sync_catalog(&self, _years: &[Year]) -> Result<SyncStats, ClientError> {
        Ok(SyncStats::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = HttpCatalogClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.url("/api/years"), "http://localhost:5000/api/years");
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn noop_client_accepts_sync() {
        let client = NoopCatalogClient;
        assert!(client.fetch_catalog().await.unwrap().is_empty());
        assert_eq!(
            client.sync_catalog(&crate::catalog::default_catalog()).await.unwrap(),
            SyncStats::default()
        );
    }
}
