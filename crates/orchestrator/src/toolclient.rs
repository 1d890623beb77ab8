//! Thin REST client against the tool-gateway-server process
//! (`TOOL_SERVER_URL`), used by the orchestrator for every tool dispatch —
//! both the shortcut path and the `USE_TOOL` LLM path.

use std::time::Duration;

use tg_domain::error::{Error, Result};
use tg_domain::tool::{ToolCall, ToolDescriptor, ToolResult};

#[derive(Debug, Clone)]
pub struct ToolServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ToolServerClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let url = format!("{}/v1/tools/list", self.base_url);
        let resp = self.http.get(&url).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UpstreamRejected(format!(
                "tool server returned {status} for {url}"
            )));
        }
        resp.json().await.map_err(from_reqwest)
    }

    pub async fn call_tool(&self, call: ToolCall) -> Result<ToolResult> {
        let url = format!("{}/v1/tools/call", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&call)
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UpstreamRejected(format!(
                "tool server returned {status} for {url}"
            )));
        }
        resp.json().await.map_err(from_reqwest)
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
