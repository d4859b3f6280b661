//! JSON transport against the node's HTTP API.
//!
//! One attempt per call: no retries, no timeouts. A hung request stalls the
//! refresh cycle that issued it and nothing else.

use std::future::Future;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::NodeError;
use crate::protocol::{Action, ACTION_RESOURCE};

/// The three verbs the panel needs. `resource` is relative to `/json/`.
pub trait Transport {
    fn get(&self, resource: &str) -> impl Future<Output = Result<Value, NodeError>>;

    fn post_action(&self, action: &Action) -> impl Future<Output = Result<(), NodeError>>;

    fn delete_action(&self, action: &Action) -> impl Future<Output = Result<(), NodeError>>;
}

/// GET `resource` and decode it as `T`.
pub async fn get_json<T, X>(transport: &X, resource: &str) -> Result<T, NodeError>
where
    T: DeserializeOwned,
    X: Transport,
{
    let value = transport.get(resource).await?;
    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: String,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nodepanel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: format!("http://{}:{}/json", host, port),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base, resource.trim_start_matches('/'))
    }
}

fn check(method: &str, url: &str, status: StatusCode) -> Result<(), NodeError> {
    if status.is_success() {
        return Ok(());
    }
    warn!("{} {} -> {}", method, url, status);
    Err(NodeError::Status(status.as_u16()))
}

impl Transport for HttpTransport {
    async fn get(&self, resource: &str) -> Result<Value, NodeError> {
        let url = self.url(resource);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        check("GET", &url, response.status())?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_action(&self, action: &Action) -> Result<(), NodeError> {
        let url = self.url(ACTION_RESOURCE);
        debug!("POST {} {:?}", url, action);
        let response = self.client.post(&url).json(action).send().await?;
        check("POST", &url, response.status())
    }

    async fn delete_action(&self, action: &Action) -> Result<(), NodeError> {
        let url = self.url(ACTION_RESOURCE);
        debug!("DELETE {} {:?}", url, action);
        let response = self.client.delete(&url).json(action).send().await?;
        check("DELETE", &url, response.status())
    }
}
