use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::gateway::types::{Endpoint, Envelope, FormBody};
use crate::gateway::Gateway;

use super::identity::DeviceIdentity;

/// HTTP gateway speaking for a single account.
pub struct KurobbsClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl KurobbsClient {
    pub fn new(base_url: &str, token: &str, uid: &str, timeout: Duration) -> Result<Self> {
        let identity = DeviceIdentity::for_uid(uid);
        let headers = identity_headers(token, &identity)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl Gateway for KurobbsClient {
    async fn call(&self, endpoint: Endpoint, form: FormBody) -> Result<Envelope> {
        let response = self
            .client
            .post(self.url(endpoint))
            .form(&form)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| AppError::Transport {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        // The service reports business outcomes in the body, so the HTTP
        // status only matters for diagnostics.
        let status = response.status();
        let body = response.bytes().await.map_err(|e| AppError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let envelope: Envelope = serde_json::from_slice(&body).map_err(|e| AppError::Decode {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            endpoint = %endpoint,
            code = envelope.code,
            msg = %envelope.msg,
            success = ?envelope.success,
            "Remote call completed"
        );

        Ok(envelope)
    }
}

fn identity_headers(token: &str, identity: &DeviceIdentity) -> Result<HeaderMap> {
    let pairs: [(&'static str, &str); 13] = [
        ("osversion", "Android"),
        ("devcode", &identity.device_code),
        ("countrycode", "CN"),
        ("ip", &identity.ip),
        ("model", "2211133C"),
        ("source", "android"),
        ("lang", "zh-Hans"),
        ("version", "1.0.9"),
        ("versioncode", "1090"),
        ("token", token),
        (
            "content-type",
            "application/x-www-form-urlencoded; charset=utf-8",
        ),
        ("accept-encoding", "gzip"),
        ("user-agent", "okhttp/3.10.0"),
    ];

    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::Config(format!("Invalid value for header {name}: {e}")))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}
