use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::core::moderation::{ModerationTransport, TransportError};

/// JSON-over-HTTP binding of the moderation service.
///
/// Every call is a POST of `{"service", "method", "args"}` to `<endpoint>/rpc`; the service
/// answers `{"ok": <value>}` or `{"err": <message>}`.
pub struct HttpModerationTransport {
    client: Client,
    rpc_url: String,
    service_identifier: String,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    service: &'a str,
    method: &'a str,
    args: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RpcReply {
    Ok(Value),
    Err(String),
}

impl HttpModerationTransport {
    pub fn new(
        endpoint_address: &str,
        service_identifier: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("EcoKindConsole/0.1"),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url: format!("{}/rpc", endpoint_address.trim_end_matches('/')),
            service_identifier: service_identifier.to_string(),
        })
    }

    #[cfg(test)]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl ModerationTransport for HttpModerationTransport {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        let request = RpcRequest {
            service: &self.service_identifier,
            method,
            args,
        };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let reply: RpcReply = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        match reply {
            RpcReply::Ok(value) => Ok(value),
            RpcReply::Err(message) => Err(TransportError::Remote(message)),
        }
    }

    async fn probe(&self) -> Result<(), TransportError> {
        // Read-only: listing an inbox never changes remote state.
        self.call("receiveMessages", vec![json!(self.service_identifier)])
            .await
            .map(|_| ())
    }
}
