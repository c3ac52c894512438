//! REST client for the property-management API.

use crate::config::ClientConfig;
use crate::cookies::CookieJar;
use domus_core::{EntityId, FetchError, Paginated, QueryParams};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ApiClientError> for FetchError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Status { status, message } => FetchError::Http { status, message },
            ApiClientError::Http(err) if err.is_decode() => FetchError::Decode(err.to_string()),
            ApiClientError::Http(err) => match err.status() {
                Some(status) => FetchError::Http {
                    status: status.as_u16(),
                    message: err.to_string(),
                },
                None => FetchError::Transport(err.to_string()),
            },
            ApiClientError::Serde(err) => FetchError::Decode(err.to_string()),
            ApiClientError::InvalidResponse(message) => FetchError::UnexpectedResponse(message),
            ApiClientError::Config(message) => FetchError::Transport(message),
        }
    }
}

/// Error payload returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(alias = "detail", alias = "error")]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// List endpoints answer either with a page envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Page(Paginated<T>),
    Items(Vec<T>),
}

impl<T> ListBody<T> {
    fn into_page(self) -> Paginated<T> {
        match self {
            ListBody::Page(page) => page,
            ListBody::Items(items) => {
                let len = items.len();
                Paginated {
                    total: len as u64,
                    page: 1,
                    page_size: u32::try_from(len).unwrap_or(u32::MAX),
                    items,
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    cookies: Arc<CookieJar>,
    token_cookie: String,
}

impl RestClient {
    pub fn new(config: &ClientConfig, cookies: Arc<CookieJar>) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            cookies,
            token_cookie: config.auth.token_cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authorization header built from the token cookie as it is right now.
    pub fn auth_headers(&self) -> Result<HeaderMap, ApiClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self
            .cookies
            .get(&self.token_cookie)
            .filter(|token| !token.is_empty())
        {
            let value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
            );
        }
        Ok(headers)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParams>,
    ) -> Result<RequestBuilder, ApiClientError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "api request");
        let mut request = self
            .client
            .request(method, url)
            .headers(self.auth_headers()?);
        if let Some(params) = params {
            let pairs = params.to_query_pairs();
            if !pairs.is_empty() {
                request = request.query(&pairs);
            }
        }
        Ok(request)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, ApiClientError> {
        let response = self.request(Method::GET, path, Some(params))?.send().await?;
        parse_response(response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiClientError> {
        let response = self.request(Method::DELETE, path, None)?.send().await?;
        parse_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(method, path, None)?
            .json(body)
            .send()
            .await?;
        parse_response(response).await
    }

    /// One page of a collection, normalized to [`Paginated`].
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &QueryParams,
    ) -> Result<Paginated<T>, ApiClientError> {
        let body: ListBody<T> = self.get(collection, params).await?;
        Ok(body.into_page())
    }

    pub async fn get_entity<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: EntityId,
    ) -> Result<T, ApiClientError> {
        self.get(&entity_path(collection, id), &QueryParams::new())
            .await
    }
}

/// `collection/{id}/`.
pub fn entity_path(collection: &str, id: EntityId) -> String {
    format!("{}/{}/", collection.trim_end_matches('/'), id)
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        // 204 No Content
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        Ok(serde_json::from_slice(body)?)
    } else {
        let text = response.text().await?;
        Err(error_from_body(status, &text))
    }
}

fn error_from_body(status: StatusCode, text: &str) -> ApiClientError {
    let message = match serde_json::from_str::<ApiErrorBody>(text) {
        Ok(ApiErrorBody {
            code: Some(code),
            message,
        }) => format!("{}: {}", code, message),
        Ok(ApiErrorBody { message, .. }) => message,
        Err(_) => text.to_string(),
    };
    ApiClientError::Status {
        status: status.as_u16(),
        message,
    }
}
