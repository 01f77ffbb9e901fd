//! Orchestrator configuration from TOML (`[orchestrator]` section)

use diligence_application::OrchestratorParams;
use diligence_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Run lifecycle settings.
///
/// # Example
///
/// ```toml
/// [orchestrator]
/// timeout_minutes = 30
/// agent_timeout_secs = 300
/// max_parallel_agents = 6
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// An active run older than this is failed on its next read.
    pub timeout_minutes: u64,
    /// Per-agent execution timeout inside a batch.
    pub agent_timeout_secs: u64,
    /// Agents executed concurrently by one batch.
    pub max_parallel_agents: usize,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        let params = OrchestratorParams::default();
        Self {
            timeout_minutes: params.run_timeout.as_secs() / 60,
            agent_timeout_secs: params.agent_timeout.as_secs(),
            max_parallel_agents: params.max_parallel_agents,
        }
    }
}

impl FileOrchestratorConfig {
    /// Convert to [`OrchestratorParams`]. Zero values fall back to the
    /// default with a warning.
    pub fn to_params(&self) -> (OrchestratorParams, Vec<ConfigIssue>) {
        let mut params = OrchestratorParams::default();
        let mut issues = Vec::new();

        if self.timeout_minutes == 0 {
            issues.push(zero_warning("orchestrator.timeout_minutes"));
        } else {
            params = params.with_run_timeout(Duration::from_secs(self.timeout_minutes * 60));
        }

        if self.agent_timeout_secs == 0 {
            issues.push(zero_warning("orchestrator.agent_timeout_secs"));
        } else {
            params = params.with_agent_timeout(Duration::from_secs(self.agent_timeout_secs));
        }

        if self.max_parallel_agents == 0 {
            issues.push(zero_warning("orchestrator.max_parallel_agents"));
        } else {
            params = params.with_max_parallel_agents(self.max_parallel_agents);
        }

        (params, issues)
    }
}

pub(super) fn zero_warning(field: &str) -> ConfigIssue {
    ConfigIssue::warning(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
        },
        format!("{} must be greater than 0, using the default", field),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_params() {
        let (params, issues) = FileOrchestratorConfig::default().to_params();
        assert!(issues.is_empty());
        assert_eq!(params, OrchestratorParams::default());
    }

    #[test]
    fn test_deserialize_section() {
        let toml_str = r#"
[orchestrator]
timeout_minutes = 45
max_parallel_agents = 3
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (params, issues) = config.orchestrator.to_params();
        assert!(issues.is_empty());
        assert_eq!(params.run_timeout, Duration::from_secs(45 * 60));
        assert_eq!(params.max_parallel_agents, 3);
        assert_eq!(params.agent_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_zero_values_fall_back_with_warnings() {
        let config = FileOrchestratorConfig {
            timeout_minutes: 0,
            agent_timeout_secs: 0,
            max_parallel_agents: 0,
        };
        let (params, issues) = config.to_params();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| !i.is_error()));
        assert_eq!(params, OrchestratorParams::default());
    }
}
