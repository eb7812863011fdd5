use crate::config::{Credential, LLMConfig, LLMProvider};
use crate::error::{Error, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// A text-generation backend: one prompt in, one response out.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    /// Name shown in error messages, e.g. "Groq".
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// HTTP client for the supported chat-completion providers.
pub struct LLMClient {
    config: LLMConfig,
    credential: Credential,
    client: Client,
    name: String,
}

impl LLMClient {
    pub fn new(config: LLMConfig, credential: Credential) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(Error::HttpClient)?;
        let name = config.provider.to_string();

        Ok(Self {
            config,
            credential,
            client,
            name,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.config.provider.default_base_url())
            .trim_end_matches('/')
    }

    fn api_key(&self) -> Result<&str, ServiceError> {
        self.credential
            .api_key()
            .ok_or_else(|| ServiceError::MissingCredential(self.name.clone()))
    }

    async fn complete_openai_compatible(&self, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self.api_key()?;

        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        });
        trace!(provider = %self.name, payload = %payload, "chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url()))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&payload)
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        extract_content(self.config.provider, &body)
    }

    async fn complete_anthropic(&self, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self.api_key()?;

        let payload = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });
        trace!(provider = %self.name, payload = %payload, "messages request");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url()))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        extract_content(LLMProvider::Anthropic, &body)
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<String, ServiceError> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            }
        });
        trace!(provider = %self.name, payload = %payload, "generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url()))
            .json(&payload)
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        extract_content(LLMProvider::Ollama, &body)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        trace!(response = %body, "raw response");
        Ok(body)
    }
}

#[async_trait]
impl NarrativeService for LLMClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        match self.config.provider {
            LLMProvider::Groq | LLMProvider::OpenAI => self.complete_openai_compatible(prompt).await,
            LLMProvider::Anthropic => self.complete_anthropic(prompt).await,
            LLMProvider::Ollama => self.complete_ollama(prompt).await,
        }
    }
}

/// Pull the generated text out of a provider's response body.
pub fn extract_content(provider: LLMProvider, body: &Value) -> Result<String, ServiceError> {
    let content = match provider {
        LLMProvider::Groq | LLMProvider::OpenAI => body["choices"][0]["message"]["content"].as_str(),
        LLMProvider::Anthropic => body["content"][0]["text"].as_str(),
        LLMProvider::Ollama => body["response"].as_str(),
    };

    let content = content.ok_or_else(|| {
        ServiceError::MalformedResponse(format!("no completion text in {} response", provider))
    })?;

    if content.trim().is_empty() {
        return Err(ServiceError::EmptyResponse);
    }
    Ok(content.to_string())
}
