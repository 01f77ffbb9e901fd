//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; [`FileConfig::resolve`] turns them into
//! the domain and application types the orchestrator runs with.

mod admission;
mod agents;
mod impact;
mod logging;
mod orchestrator;

pub use admission::{FileAdmissionConfig, FileLedgerConfig};
pub use agents::FileAgentEntry;
pub use impact::FileImpactConfig;
pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;

use diligence_application::{AdmissionParams, LedgerParams, OrchestratorParams};
use diligence_domain::{AgentRegistry, ConfigIssue, ConfigIssueCode, ImpactPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration that cannot be used at all.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Run lifecycle and batch execution
    pub orchestrator: FileOrchestratorConfig,
    /// Materiality threshold and tag aliases
    pub impact: FileImpactConfig,
    /// Re-analysis rate limit
    pub admission: FileAdmissionConfig,
    /// Credit conversion
    pub ledger: FileLedgerConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
    /// Custom agent catalog (built-in catalog when empty)
    pub agents: Vec<FileAgentEntry>,
}

/// Validated configuration ready to wire into use cases.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub registry: AgentRegistry,
    pub policy: ImpactPolicy,
    pub orchestrator: OrchestratorParams,
    pub admission: AdmissionParams,
    pub ledger: LedgerParams,
    /// Non-fatal issues; defaults were substituted.
    pub warnings: Vec<ConfigIssue>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks:
    /// 1. Numeric ranges for every section
    /// 2. The custom agent catalog (tiers, duplicates, empty names)
    /// 3. Aliases pointing at tags no agent covers
    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.resolve_parts().5
    }

    /// Convert to runtime types, failing if any issue is an error.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigValidationError> {
        let (registry, policy, orchestrator, admission, ledger, issues) = self.resolve_parts();

        let errors: Vec<String> = issues
            .iter()
            .filter(|i| i.is_error())
            .map(|i| i.message.clone())
            .collect();
        if !errors.is_empty() {
            return Err(ConfigValidationError::Invalid(errors));
        }

        Ok(ResolvedConfig {
            registry,
            policy,
            orchestrator,
            admission,
            ledger,
            warnings: issues,
        })
    }

    #[allow(clippy::type_complexity)]
    fn resolve_parts(
        &self,
    ) -> (
        AgentRegistry,
        ImpactPolicy,
        OrchestratorParams,
        AdmissionParams,
        LedgerParams,
        Vec<ConfigIssue>,
    ) {
        let mut issues = Vec::new();

        let (orchestrator, found) = self.orchestrator.to_params();
        issues.extend(found);
        let (admission, found) = self.admission.to_params();
        issues.extend(found);
        let (ledger, found) = self.ledger.to_params();
        issues.extend(found);
        let (registry, found) = agents::to_registry(&self.agents);
        issues.extend(found);
        let (policy, found) = self.impact.to_policy();
        issues.extend(found);

        let known = registry.known_tags();
        for (from, to) in &self.impact.tag_aliases {
            let target = policy.canonical_tag(to);
            if !known.contains(&target) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnknownTag {
                        field: format!("impact.tag_aliases.{}", from),
                        tag: target.to_string(),
                    },
                    format!(
                        "alias '{}' maps to '{}', which no agent covers",
                        from, target
                    ),
                ));
            }
        }

        (registry, policy, orchestrator, admission, ledger, issues)
    }
}
