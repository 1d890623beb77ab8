//! Minimal OpenAI-compatible chat client. This is the "oracle" the
//! orchestrator consults when the router decides a message isn't a direct
//! shortcut — it is not itself an LLM implementation, just a thin HTTP
//! adapter against any OpenAI-compatible `/chat/completions` endpoint
//! (OpenAI, Ollama, vLLM, LM Studio, ...).

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tg_domain::config::LlmConfig;
use tg_domain::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Single-turn, non-streaming chat completion. Returns the assistant
    /// message's raw text content, which may itself be a `USE_TOOL:...`
    /// line for the router/orchestrator to interpret.
    pub async fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message},
            ],
            "temperature": 0.2,
            "stream": false,
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::UpstreamRejected(format!(
                "LLM endpoint returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Other(format!("failed to parse LLM response: {e}: {text}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Other("LLM response contained no choices".into()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_chat_completion_shape() {
        let raw = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "hello there"}}
            ]
        });
        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello there");
    }
}
