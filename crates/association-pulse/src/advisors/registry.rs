use std::sync::Arc;

use serde::Serialize;

use super::advisor::Advisor;
use super::kind::{AdvisorConfig, AdvisorKind};
use crate::completion::CompletionClient;

/// Wiring mistakes in the advisor catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown advisor id `{0}`")]
    UnknownAdvisor(String),
    #[error("advisor id `{0}` is already registered")]
    DuplicateAdvisor(String),
}

/// Registered advisor as exposed to API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorSummary {
    pub id: String,
    pub kind: AdvisorKind,
    pub display_name: String,
    pub focus: &'static str,
    pub focus_metrics: &'static [&'static str],
}

/// Ordered catalog of advisor configurations. Lookup and instantiation only.
#[derive(Debug, Clone, Default)]
pub struct AdvisorRegistry {
    configs: Vec<AdvisorConfig>,
}

impl AdvisorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All five standard advisors in catalog order.
    pub fn standard() -> Self {
        Self {
            configs: AdvisorKind::ordered()
                .into_iter()
                .map(AdvisorConfig::standard)
                .collect(),
        }
    }

    pub fn register(&mut self, config: AdvisorConfig) -> Result<(), ConfigurationError> {
        if self.configs.iter().any(|existing| existing.id == config.id) {
            return Err(ConfigurationError::DuplicateAdvisor(config.id));
        }
        self.configs.push(config);
        Ok(())
    }

    pub fn get(
        &self,
        id: &str,
        client: Option<Arc<dyn CompletionClient>>,
    ) -> Result<Advisor, ConfigurationError> {
        self.configs
            .iter()
            .find(|config| config.id == id)
            .map(|config| Advisor::new(config.clone(), client))
            .ok_or_else(|| ConfigurationError::UnknownAdvisor(id.to_string()))
    }

    pub fn list(&self) -> Vec<&str> {
        self.configs.iter().map(|config| config.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn summaries(&self) -> Vec<AdvisorSummary> {
        self.configs
            .iter()
            .map(|config| AdvisorSummary {
                id: config.id.clone(),
                kind: config.kind,
                display_name: config.display_name.clone(),
                focus: config.kind.focus(),
                focus_metrics: config.kind.focus_metrics(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_lists_every_kind_in_order() {
        let registry = AdvisorRegistry::standard();
        assert_eq!(
            registry.list(),
            vec![
                "financial",
                "staff-retention",
                "membership-growth",
                "member-engagement",
                "risk-governance"
            ]
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = AdvisorRegistry::standard();
        let error = registry
            .register(AdvisorConfig::standard(AdvisorKind::Financial))
            .expect_err("duplicate");
        assert_eq!(error, ConfigurationError::DuplicateAdvisor("financial".into()));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn unknown_ids_are_configuration_errors() {
        let registry = AdvisorRegistry::standard();
        let error = registry.get("marketing", None).expect_err("unknown id");
        assert_eq!(error, ConfigurationError::UnknownAdvisor("marketing".into()));

        let advisor = registry.get("risk-governance", None).expect("known id");
        assert_eq!(advisor.kind(), AdvisorKind::RiskGovernance);
    }

    #[test]
    fn custom_configs_keep_their_own_id() {
        let mut registry = AdvisorRegistry::new();
        let mut config = AdvisorConfig::standard(AdvisorKind::Financial);
        config.id = "financial-board".to_string();
        registry.register(config).expect("registers");

        assert_eq!(registry.list(), vec!["financial-board"]);
        assert_eq!(registry.summaries()[0].focus, "financial sustainability");
    }
}
