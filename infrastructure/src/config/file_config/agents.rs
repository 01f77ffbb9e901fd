//! Agent catalog from TOML (`[[agents]]` tables)

use diligence_domain::{
    AgentDefinition, AgentRegistry, AgentTier, ConfigIssue, ConfigIssueCode,
};
use serde::{Deserialize, Serialize};

/// One custom catalog entry.
///
/// ```toml
/// [[agents]]
/// name = "financial-auditor"
/// tier = 1
/// tags = ["financial", "metrics"]
/// description = "Audits revenue, burn and runway claims"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAgentEntry {
    pub name: String,
    pub tier: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Build the registry from `[[agents]]`, or the built-in catalog when none
/// are configured.
///
/// A broken catalog is an error: running with a different agent set than
/// the operator configured would silently change what gets analyzed.
pub fn to_registry(entries: &[FileAgentEntry]) -> (AgentRegistry, Vec<ConfigIssue>) {
    if entries.is_empty() {
        return (AgentRegistry::builtin(), Vec::new());
    }

    let mut issues = Vec::new();
    let mut definitions = Vec::with_capacity(entries.len());

    for entry in entries {
        let tier = match AgentTier::try_from(entry.tier) {
            Ok(tier) => tier,
            Err(e) => {
                issues.push(catalog_error(format!("agent '{}': {}", entry.name, e)));
                continue;
            }
        };
        if entry.name.trim().is_empty() {
            issues.push(catalog_error("agent name cannot be empty"));
            continue;
        }
        if entry.tags.iter().all(|t| t.trim().is_empty()) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidCatalog,
                format!("agent '{}' has no tags and is only reachable by full runs", entry.name),
            ));
        }

        let tags = entry
            .tags
            .iter()
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty());
        let mut definition = AgentDefinition::new(entry.name.trim(), tier, tags);
        if let Some(description) = &entry.description {
            definition = definition.with_description(description.clone());
        }
        definitions.push(definition);
    }

    if issues.iter().any(ConfigIssue::is_error) {
        return (AgentRegistry::builtin(), issues);
    }

    match AgentRegistry::new(definitions) {
        Ok(registry) => (registry, issues),
        Err(e) => {
            issues.push(catalog_error(e.to_string()));
            (AgentRegistry::builtin(), issues)
        }
    }
}

fn catalog_error(message: impl Into<String>) -> ConfigIssue {
    ConfigIssue::error(ConfigIssueCode::InvalidCatalog, message)
}
