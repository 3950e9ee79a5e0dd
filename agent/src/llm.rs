//! HTTP oracle backed by an LLM chat API
//!
//! Two wire formats are supported: Anthropic's `/v1/messages` and the
//! OpenAI-compatible `/v1/chat/completions` used by most other providers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::oracle::Oracle;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Instructions sent with every request
pub const SYSTEM_PROMPT: &str = "You are an expert competitive Pokemon battler playing on Pokemon Showdown. \
You read the battle situation carefully, weigh type matchups, speed, remaining HP, hazards and \
your opponent's likely sets, and pick the action that gives the best chance to win the game, \
not just the current turn. Always answer in the format you are asked for.";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("LLM_API_KEY is not set")]
    MissingApiKey,

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response contained no text")]
    EmptyResponse,
}

/// Which wire format to speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[value(name = "openai")]
    OpenAi,
}

impl LlmProvider {
    fn default_url(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => ANTHROPIC_API_URL,
            LlmProvider::OpenAi => OPENAI_API_URL,
        }
    }

    fn path(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "/v1/messages",
            LlmProvider::OpenAi => "/v1/chat/completions",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-3-5-haiku-latest",
            LlmProvider::OpenAi => "gpt-4o-mini",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    /// Full endpoint or base URL, `None` for the provider default
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            api_url: None,
            model: None,
            max_tokens: 4096,
        }
    }

    /// Endpoint requests are posted to
    ///
    /// A base URL such as `https://api.deepseek.com` gets the provider's
    /// path appended.
    pub fn endpoint(&self) -> String {
        match self.api_url.as_deref().map(|url| url.trim_end_matches('/')) {
            None | Some("") => self.provider.default_url().to_string(),
            Some(url) if url.ends_with("/messages") || url.ends_with("/chat/completions") => url.to_string(),
            Some(url) => {
                let path = self.provider.path();
                match url.strip_suffix("/v1") {
                    Some(base) => format!("{}{}", base, path),
                    None => format!("{}{}", url, path),
                }
            }
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(self.provider.default_model())
    }
}

/// Oracle that asks an LLM
pub struct LlmOracle {
    client: Client,
    config: LlmConfig,
    endpoint: String,
}

impl LlmOracle {
    pub fn new(config: LlmConfig) -> Result<Self, OracleError> {
        if config.api_key.is_empty() {
            return Err(OracleError::MissingApiKey);
        }

        let endpoint = config.endpoint();
        tracing::info!(provider = ?config.provider, endpoint = %endpoint, model = config.model(), "using LLM oracle");

        Ok(Self {
            client: Client::new(),
            config,
            endpoint,
        })
    }

    /// Send one system + user exchange and return the reply text
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
        let request = match self.config.provider {
            LlmProvider::Anthropic => self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&anthropic_request(&self.config, system, user)),
            LlmProvider::OpenAi => self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&openai_request(&self.config, system, user)),
        };

        let response = request.send().await.map_err(|source| OracleError::Http {
            url: self.endpoint.clone(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| OracleError::Http {
            url: self.endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(bytes = body.len(), "LLM response received");
        extract_text(self.config.provider, &body)
    }
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn decide(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.complete(SYSTEM_PROMPT, prompt).await?)
    }
}

// Anthropic API format
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

// OpenAI-compatible API format
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn anthropic_request<'a>(config: &'a LlmConfig, system: &'a str, user: &'a str) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model: config.model(),
        max_tokens: config.max_tokens,
        system,
        messages: vec![ChatMessage {
            role: "user",
            content: user,
        }],
    }
}

fn openai_request<'a>(config: &'a LlmConfig, system: &'a str, user: &'a str) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model: config.model(),
        max_tokens: config.max_tokens,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
    }
}

fn extract_text(provider: LlmProvider, body: &str) -> Result<String, OracleError> {
    let malformed = |e: serde_json::Error| OracleError::Api {
        status: 200,
        body: format!("malformed response: {}", e),
    };

    let text = match provider {
        LlmProvider::Anthropic => {
            let response: AnthropicResponse = serde_json::from_str(body).map_err(malformed)?;
            response
                .content
                .into_iter()
                .filter(|block| block.kind.is_empty() || block.kind == "text")
                .map(|block| block.text)
                .collect::<Vec<_>>()
                .join("")
        }
        LlmProvider::OpenAi => {
            let response: OpenAiResponse = serde_json::from_str(body).map_err(malformed)?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default()
        }
    };

    if text.trim().is_empty() {
        return Err(OracleError::EmptyResponse);
    }
    Ok(text)
}
