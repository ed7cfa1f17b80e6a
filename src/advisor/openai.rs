//! OpenAI Chat Completions client
//!
//! The base URL is configurable so any OpenAI-compatible endpoint works.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::llm::Llm;
use crate::common::errors::{AgentError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const GEMINI_MODEL: &str = "gemini-2.5-flash";
const MAX_TOKENS: u32 = 500;

/// OpenAI API client
#[derive(Debug)]
pub struct OpenAiLlm {
    client: Client,
    provider: &'static str,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiLlm {
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: Option<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            provider: "openai",
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature,
        }
    }

    /// Gemini served through Google's Chat Completions compatible API
    pub fn gemini(
        api_key: impl Into<String>,
        model: Option<String>,
        base_url: Option<String>,
        temperature: f32,
    ) -> Self {
        Self {
            provider: "gemini",
            ..Self::new(
                api_key,
                Some(model.unwrap_or_else(|| GEMINI_MODEL.to_string())),
                Some(base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string())),
                temperature,
            )
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Llm for OpenAiLlm {
    fn name(&self) -> &'static str {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = Request {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AgentError::Advisory(e.to_string()))?
            .json::<Response>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AgentError::Advisory("OpenAI returned no choices".to_string()))
    }
}
