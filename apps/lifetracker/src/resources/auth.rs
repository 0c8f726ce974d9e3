//! Login, sign-up and current user

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, Session};
use crate::error::{ApiError, Result};

/// Minimum password length accepted by the forms
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUp {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Reply of the login endpoint
///
/// `status` is required so an enveloped reply is never mistaken for the
/// inner `data` object.
#[derive(Deserialize)]
struct LoginReply {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    #[serde(default)]
    user_token: Option<String>,
}

/// Signed-in user as returned by `GET /api/user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default, deserialize_with = "crate::api::serde_ext::id")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Loose address check: no whitespace, one `@`, and a dot somewhere after it
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Please enter a valid email address".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Authentication endpoints
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Log in and decode the session from the issued token
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        validate_credentials(email, password)?;

        let reply: LoginReply = self
            .client
            .send_anonymous("/api/login", &Credentials { email, password }, "Login failed")
            .await?;

        let token = reply.data.and_then(|d| d.user_token);
        match (reply.status.as_str(), token) {
            ("success", Some(token)) => {
                let session = Session::from_token(&token)?;
                tracing::info!("Logged in as user {}", session.id);
                Ok(session)
            }
            _ => Err(ApiError::Status {
                status: 200,
                message: reply.message.unwrap_or_else(|| "Login failed".to_string()),
            }),
        }
    }

    /// Create an account
    pub async fn sign_up(&self, form: &SignUp) -> Result<serde_json::Value> {
        if form.first_name.trim().is_empty() || form.last_name.trim().is_empty() {
            return Err(ApiError::Validation("First and last name are required".into()));
        }
        validate_credentials(&form.email, &form.password)?;

        self.client
            .send_anonymous("/api/signin", form, "Sign up failed")
            .await
    }

    pub async fn current_user(&self) -> Result<CurrentUser> {
        self.client.get("/api/user", "Failed to fetch user").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fake_jwt, StaticToken};
    use crate::testing::spawn_server;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada @example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(is_valid_email("ada@.example.com"));
        assert!(is_valid_email("ada@example.com."));
        assert!(is_valid_email("ada@mail.example.co.uk"));
    }

    #[tokio::test]
    async fn test_login_rejects_short_password() {
        let client = ApiClient::with_http(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            Arc::new(StaticToken::anonymous()),
        );
        let err = AuthApi::new(&client).login("ada@example.com", "12345").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_decodes_session() {
        let token = fake_jwt(json!({ "id": 42, "first_name": "Ada", "email": "ada@example.com" }));
        let app = Router::new().route(
            "/api/login",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let token = token.clone();
                async move {
                    assert!(headers.get("authorization").is_none());
                    assert_eq!(body["email"], "ada@example.com");
                    Json(json!({ "status": "success", "data": { "user_token": token } }))
                }
            }),
        );
        let base = spawn_server(app).await;
        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::new("stale")));

        let session = AuthApi::new(&client).login("ada@example.com", "secret1").await.unwrap();
        assert_eq!(session.id, "42");
        assert_eq!(session.first_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let app = Router::new().route(
            "/api/login",
            post(|| async { Json(json!({ "status": "fail", "message": "Incorrect password" })) }),
        );
        let base = spawn_server(app).await;
        let client = ApiClient::with_http(reqwest::Client::new(), &base, Arc::new(StaticToken::anonymous()));

        let err = AuthApi::new(&client).login("ada@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "Incorrect password (HTTP 200)");
    }

    #[tokio::test]
    async fn test_sign_up_requires_names() {
        let client = ApiClient::with_http(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            Arc::new(StaticToken::anonymous()),
        );
        let err = AuthApi::new(&client)
            .sign_up(&SignUp {
                first_name: "".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
