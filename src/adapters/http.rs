use crate::utils::error::{Result, SyncError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest page NetBox serves with its default `MAX_PAGE_SIZE`.
const PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
struct Page<T> {
    next: Option<String>,
    results: Vec<T>,
}

/// Thin NetBox REST client: base URL, token auth, status checks and
/// pagination.
#[derive(Debug, Clone)]
pub struct NetBoxClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl NetBoxClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("Token {}", token)),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::ApiStatusError {
            status: status.as_u16(),
            url,
            body,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.request(Method::GET, &url).query(query).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Like [`get`](Self::get), but a 404 is `Ok(None)`.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(response).await?.json().await?))
    }

    /// Collects every page of a list endpoint by following `next` links.
    pub async fn list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let mut query = query.to_vec();
        query.push(("limit", PAGE_SIZE.to_string()));

        let url = self.url(path);
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.request(Method::GET, &url).query(&query).send().await?;
        let mut page: Page<T> = Self::check(response).await?.json().await?;
        let mut results = std::mem::take(&mut page.results);

        while let Some(next) = page.next.take() {
            tracing::debug!("GET {}", next);
            let response = self.request(Method::GET, &next).send().await?;
            page = Self::check(response).await?.json().await?;
            results.append(&mut page.results);
        }

        Ok(results)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let response = self.request(Method::POST, &url).json(body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        tracing::debug!("PATCH {}", url);
        let response = self.request(Method::PATCH, &url).json(body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);
        let response = self.request(Method::DELETE, &url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
