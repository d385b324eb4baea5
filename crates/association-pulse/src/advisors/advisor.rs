use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::fallback::fallback_insight;
use super::insight::{AdvisorInsight, InsightSource};
use super::kind::{AdvisorConfig, AdvisorKind};
use super::parser::parse_response;
use super::prompt::{build_request, PromptError};
use crate::completion::{CompletionClient, CompletionError};
use crate::scoring::PerformanceSnapshot;

pub const DEFAULT_ADVISOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("advisor run cancelled")]
    Cancelled,
}

/// One configured advisor bound to an optional completion client.
#[derive(Clone)]
pub struct Advisor {
    config: AdvisorConfig,
    client: Option<Arc<dyn CompletionClient>>,
    timeout: Duration,
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("config", &self.config)
            .field("has_client", &self.client.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Advisor {
    pub fn new(config: AdvisorConfig, client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            config,
            client,
            timeout: DEFAULT_ADVISOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn kind(&self) -> AdvisorKind {
        self.config.kind
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Produces an insight from the completion service, or from fallback rules
    /// when no client is configured, the call fails, or its text is unusable.
    ///
    /// Only a broken prompt template or cancellation is an error.
    pub async fn analyze(
        &self,
        snapshot: &PerformanceSnapshot,
        cancel: &CancellationToken,
    ) -> Result<AdvisorInsight, AdvisorError> {
        if cancel.is_cancelled() {
            return Err(AdvisorError::Cancelled);
        }

        let request = build_request(&self.config, snapshot)?;

        let Some(client) = &self.client else {
            tracing::debug!(advisor = %self.config.id, "no completion client configured");
            return Ok(self.fallback(snapshot));
        };

        let started = Instant::now();
        let outcome = match tokio::time::timeout(
            self.timeout,
            client.generate_analysis(&request, cancel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.timeout)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                let parsed = parse_response(&response.content);
                if parsed.is_usable() {
                    let model = response
                        .model
                        .unwrap_or_else(|| client.model_name().to_string());
                    tracing::info!(
                        advisor = %self.config.id,
                        source = InsightSource::CompletionService.label(),
                        elapsed_ms,
                        "advisor analysis complete"
                    );
                    return Ok(AdvisorInsight {
                        advisor_id: self.config.id.clone(),
                        executive_summary: parsed.executive_summary,
                        key_insights: parsed.key_insights,
                        recommended_actions: parsed.recommended_actions,
                        success_metrics: parsed.success_metrics,
                        special_considerations: parsed.special_considerations,
                        source: InsightSource::CompletionService,
                        model: Some(model),
                    });
                }
                tracing::warn!(
                    advisor = %self.config.id,
                    elapsed_ms,
                    "completion output could not be parsed; using fallback rules"
                );
            }
            Err(CompletionError::Cancelled) => return Err(AdvisorError::Cancelled),
            Err(error) => {
                tracing::warn!(
                    advisor = %self.config.id,
                    elapsed_ms,
                    %error,
                    "completion call failed; using fallback rules"
                );
            }
        }

        if cancel.is_cancelled() {
            return Err(AdvisorError::Cancelled);
        }
        Ok(self.fallback(snapshot))
    }

    fn fallback(&self, snapshot: &PerformanceSnapshot) -> AdvisorInsight {
        fallback_insight(&self.config.id, self.config.kind, snapshot)
    }
}
