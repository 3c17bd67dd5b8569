use crate::error::Result;
use crate::protocol::Request;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_PATH: &str = "/api.php";

/// Low-level HTTP connection to a Calaos server
///
/// Every API exchange is a JSON object POSTed to the server's single
/// endpoint, answered by a JSON object. The connection owns the
/// credentials and injects them into each request; it has no retry
/// policy of its own.
pub struct Connection {
    url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl Connection {
    /// Create a connection for the given base URI (usually `http[s]://A.B.C.D`)
    ///
    /// Calaos servers ship with self-signed certificates, so certificate
    /// verification is disabled for the HTTPS case.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), API_PATH),
            username: username.into(),
            password: password.into(),
            http,
        })
    }

    /// Send a request and return the parsed JSON response
    pub(crate) async fn send(&self, request: Request) -> Result<Value> {
        let mut body = serde_json::to_value(&request)?;
        tracing::debug!("Sending: {}", body);

        // Credentials are injected after the debug line so they never land in logs.
        if let Some(object) = body.as_object_mut() {
            object.insert("cn_user".to_string(), Value::String(self.username.clone()));
            object.insert("cn_pass".to_string(), Value::String(self.password.clone()));
        }

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let value: Value = response.json().await?;
        tracing::debug!("Received: {}", value);

        Ok(value)
    }
}
