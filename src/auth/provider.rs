use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::errors::AuthError;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ERROR: &str = "error";

/// Normalised reply to a login request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginResponse {
    /// `success`, `pending` or `error`.
    pub status: String,
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub username: Option<String>,
    pub access_token: Option<String>,
    pub requires_2fa: bool,
    /// Response body as received, kept for error display.
    pub raw: String,
}

impl LoginResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}

/// Remote auth backend.
/// Real implementation: [`HttpAuthProvider`]. Tests use in-memory fakes.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Only transport failures are errors; business rejections come back as a
    /// [`LoginResponse`] with a non-success status.
    async fn login(
        &self,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<LoginResponse, AuthError>;

    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize, Default)]
struct WireLoginResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default, alias = "accessToken")]
    access_token: Option<String>,
    #[serde(default)]
    requires2fa: Option<bool>,
}

/// Auth provider speaking the `/api/auth/*` JSON API.
pub struct HttpAuthProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("lodestone/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/auth/{}", self.base_url, path)
    }
}

fn transport(err: reqwest::Error) -> AuthError {
    AuthError::Transport {
        message: err.to_string(),
    }
}

/// Map a response body onto [`LoginResponse`]. Bodies without a `status`
/// field are successes when the HTTP status is.
fn normalise_login(http_ok: bool, body: String) -> LoginResponse {
    let wire: WireLoginResponse = serde_json::from_str(&body).unwrap_or_default();

    let status = wire.status.unwrap_or_else(|| {
        if http_ok {
            STATUS_SUCCESS.to_string()
        } else {
            STATUS_ERROR.to_string()
        }
    });
    let requires_2fa = wire.requires2fa.unwrap_or(false) || wire.reason.as_deref() == Some("2fa");
    let id = wire.id.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    LoginResponse {
        status,
        id,
        uuid: wire.uuid,
        username: wire.username,
        access_token: wire.access_token.or(wire.token),
        requires_2fa,
        raw: body,
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn login(
        &self,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<LoginResponse, AuthError> {
        let mut payload = serde_json::json!({ "email": email, "password": password });
        if let Some(code) = code {
            payload["code"] = Value::String(code.to_string());
        }

        let resp = self
            .client
            .post(self.endpoint("authenticate"))
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        let http_ok = resp.status().is_success();
        let body = resp.text().await.map_err(transport)?;

        Ok(normalise_login(http_ok, body))
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.endpoint("logout"))
            .json(&serde_json::json!({ "access_token": access_token }))
            .send()
            .await
            .map_err(transport)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let raw = resp.text().await.unwrap_or_default();
            Err(AuthError::Rejected { raw })
        }
    }
}
