//! OpenAI-compatible HTTP client for embeddings and chat completion
//!
//! Works against any endpoint speaking the OpenAI wire format, which covers
//! the providers in the resolver's defaults table. No retries live here:
//! rate limiting and timeouts surface as typed errors and the caller owns
//! the retry decision.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

use super::chat::ChatProvider;
use super::embedding::EmbeddingProvider;
use super::resolver::ProviderConfig;

/// OpenAI-compatible API client
pub struct OpenAiClient {
    client: Client,
    provider: ProviderConfig,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiClient {
    /// Create a client for the resolved provider
    pub fn new(provider: ProviderConfig, http: &HttpConfig) -> Result<Self> {
        let timeout = Duration::from_secs(http.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider,
            temperature: http.temperature,
            max_tokens: http.max_tokens,
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.provider.api_base_url.trim_end_matches('/'), path)
    }

    /// Map a transport error to a typed error
    fn transport_error(context: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(format!("{context}: {e}"))
        } else {
            Error::Provider(format!("{context}: {e}"))
        }
    }

    /// Map a non-success HTTP status to a typed error
    async fn status_error(context: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                Error::RateLimit(format!("{context}: HTTP 429 - {body}"))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Error::Timeout(format!("{context}: HTTP {status}"))
            }
            _ => Error::Provider(format!("{context}: HTTP {status} - {body}")),
        }
    }

    /// POST a JSON body and decode the response, bounded by the configured
    /// time budget so a hung connection becomes `Error::Timeout`.
    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        context: &str,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let request = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.provider.api_key)
            .json(body)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "{context}: no response within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| Self::transport_error(context, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(context, response).await);
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| Error::Provider(format!("{context}: failed to parse response: {e}")))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::EmptyInput("no texts to embed".to_string()));
        }

        tracing::debug!(
            count = texts.len(),
            model = %self.provider.embedding_model,
            "requesting embeddings"
        );

        let request = EmbeddingRequest {
            model: &self.provider.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse =
            self.post_json("embedding request", "embeddings", &request).await?;

        if response.data.len() != texts.len() {
            return Err(Error::Provider(format!(
                "embedding endpoint returned {} vectors for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }

        // The API may return entries out of order; restore input order.
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        &self.provider.provider
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.provider.chat_model, "requesting completion");

        let request = ChatRequest {
            model: &self.provider.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response: ChatResponse = self
            .post_json("chat request", "chat/completions", &request)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::provider("chat endpoint returned no choices"))
    }

    fn name(&self) -> &str {
        &self.provider.provider
    }

    fn model(&self) -> &str {
        &self.provider.chat_model
    }
}
