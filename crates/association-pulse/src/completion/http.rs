use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};
use crate::config::CompletionConfig;

const USER_AGENT: &str = concat!("association-pulse/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed client for the hosted completion endpoint.
pub struct HttpCompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    prompt: &'a super::PromptPair,
    context: serde_json::Value,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CompletionError::MissingCredentials)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        let mut context = request.context.clone();
        if let Some(map) = context.as_object_mut() {
            map.entry("model")
                .or_insert_with(|| serde_json::Value::String(self.model.clone()));
        }

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&WireRequest {
                prompt: &request.prompt,
                context,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(self.timeout)
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        parse_success_body(&body)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn generate_analysis(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionResponse, CompletionError> {
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CompletionError::Cancelled),
            result = self.send(request) => result,
        };

        match &outcome {
            Ok(response) => tracing::debug!(
                model = response.model.as_deref().unwrap_or(&self.model),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "completion request succeeded"
            ),
            Err(err) => tracing::warn!(
                error = %err,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "completion request failed"
            ),
        }

        outcome
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub(crate) fn parse_success_body(body: &str) -> Result<CompletionResponse, CompletionError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedBody(e.to_string()))?;

    if parsed.content.trim().is_empty() {
        return Err(CompletionError::MalformedBody(
            "response content was empty".to_string(),
        ));
    }

    Ok(parsed)
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<WireError>(body) {
        Ok(WireError {
            error: Some(serde_json::Value::String(message)),
            ..
        }) => message,
        Ok(WireError {
            error: Some(serde_json::Value::Object(map)),
            ..
        }) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Ok(WireError {
            message: Some(message),
            ..
        }) => message,
        _ if body.trim().is_empty() => "no error body".to_string(),
        _ => body.to_string(),
    }
}
