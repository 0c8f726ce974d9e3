//! HTTP client for the LifeTracker REST API
//!
//! Every resource fetcher goes through [`ApiClient`]: it resolves paths
//! against the configured origin, attaches the bearer token from the
//! injected credentials provider, and decodes both enveloped
//! (`{"status": ..., "data": ...}`) and bare JSON bodies.

use std::sync::Arc;

use reqwest::{multipart::Form, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::credentials::CredentialsProvider;
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};

/// Response payload as sent by the backend
///
/// Most endpoints wrap their result in a `data` field, a few return the
/// record directly.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Enveloped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Payload::Enveloped { data } => data,
            Payload::Bare(data) => data,
        }
    }
}

/// Shared API client
///
/// Cheap to clone; clones share the connection pool and credentials.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialsProvider>,
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialsProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::with_http(http, &config.base_url, credentials))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Same backend, different credentials (e.g. the Spotify token)
    pub fn with_credentials(&self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            credentials,
        }
    }

    /// Backend origin
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server path such as `/api/books` or a stored file path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.credentials.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        tracing::debug!("GET {}", path);
        let response = self.request(Method::GET, path).send().await?;
        decode(response, fallback).await
    }

    /// GET a JSON resource that may legitimately be empty (HTTP 204)
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &str,
    ) -> Result<Option<T>> {
        tracing::debug!("GET {}", path);
        let response = self.request(Method::GET, path).send().await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode(response, fallback).await.map(Some)
    }

    /// Send a JSON body and decode the JSON reply
    pub async fn send<B, T>(&self, method: Method, path: &str, body: &B, fallback: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("{} {}", method, path);
        let response = self.request(method, path).json(body).send().await?;
        decode(response, fallback).await
    }

    /// Send a bodyless request and decode the JSON reply
    pub async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        fallback: &str,
    ) -> Result<T> {
        tracing::debug!("{} {}", method, path);
        let response = self.request(method, path).send().await?;
        decode(response, fallback).await
    }

    /// POST a multipart form
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        fallback: &str,
    ) -> Result<T> {
        tracing::debug!("POST {} (multipart)", path);
        let response = self.request(Method::POST, path).multipart(form).send().await?;
        decode(response, fallback).await
    }

    /// Send a JSON body without credentials (login, sign-up)
    pub async fn send_anonymous<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {} (anonymous)", path);
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        decode(response, fallback).await
    }

    /// Download raw bytes (uploaded book files)
    pub async fn get_bytes(&self, path: &str, fallback: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {} (binary)", path);
        let response = self.request(Method::GET, path).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body, fallback));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!("{}: HTTP {}", fallback, status.as_u16());
        return Err(ApiError::from_response(status.as_u16(), &body, fallback));
    }

    if body.trim().is_empty() {
        return Err(ApiError::Decode(format!("{}: empty response from server", fallback)));
    }

    serde_json::from_str::<Payload<T>>(&body)
        .map(Payload::into_inner)
        .map_err(|e| ApiError::Decode(format!("{}: {}", fallback, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticToken;
    use crate::testing::spawn_server;
    use axum::{
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn test_payload_enveloped_and_bare() {
        let enveloped: Payload<Item> =
            serde_json::from_str(r#"{"status":"success","data":{"name":"a"}}"#).unwrap();
        assert_eq!(enveloped.into_inner(), Item { name: "a".into() });

        let bare: Payload<Item> = serde_json::from_str(r#"{"name":"b"}"#).unwrap();
        assert_eq!(bare.into_inner(), Item { name: "b".into() });

        let list: Payload<Vec<Item>> = serde_json::from_str(r#"[{"name":"c"}]"#).unwrap();
        assert_eq!(list.into_inner().len(), 1);
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::with_http(
            reqwest::Client::new(),
            "http://localhost:5000/",
            Arc::new(StaticToken::anonymous()),
        );
        assert_eq!(client.url("/api/books"), "http://localhost:5000/api/books");
        assert_eq!(client.url("uploads/a.pdf"), "http://localhost:5000/uploads/a.pdf");
        assert_eq!(client.url("https://cdn.example/a.pdf"), "https://cdn.example/a.pdf");
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let app = Router::new().route(
            "/api/echo",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "status": "success", "data": auth }))
            }),
        );
        let base = spawn_server(app).await;

        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::new("abc")));
        let auth: String = client.get("/api/echo", "Failed").await.unwrap();
        assert_eq!(auth, "Bearer abc");

        let anonymous = client.with_credentials(Arc::new(StaticToken::anonymous()));
        let auth: String = anonymous.get("/api/echo", "Failed").await.unwrap();
        assert_eq!(auth, "");
    }

    #[tokio::test]
    async fn test_error_and_no_content() {
        let app = Router::new()
            .route(
                "/api/broken",
                get(|| async {
                    (AxumStatus::UNPROCESSABLE_ENTITY, Json(json!({ "message": "Bad input" })))
                }),
            )
            .route("/api/empty", get(|| async { AxumStatus::NO_CONTENT }));
        let base = spawn_server(app).await;
        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::anonymous()));

        let err = client.get::<Value>("/api/broken", "Failed to fetch").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 422, ref message } if message == "Bad input"));

        let none: Option<Value> = client.get_optional("/api/empty", "Failed").await.unwrap();
        assert!(none.is_none());
    }
}
