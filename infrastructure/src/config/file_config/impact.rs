//! Impact configuration from TOML (`[impact]` section)

use diligence_domain::{ConfigIssue, ConfigIssueCode, DomainTag, ImpactPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Materiality threshold and topic vocabulary.
///
/// Configured aliases are merged over the built-in ones, so a deployment
/// only lists what it adds or overrides.
///
/// # Example
///
/// ```toml
/// [impact]
/// materiality_threshold = 0.15
///
/// [impact.tag_aliases]
/// "unit economics" = "pricing"
/// burn = "financial"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileImpactConfig {
    /// Minimum absolute confidence change that counts as material.
    pub materiality_threshold: f64,
    /// Extra topic → tag aliases.
    pub tag_aliases: BTreeMap<String, String>,
}

impl Default for FileImpactConfig {
    fn default() -> Self {
        Self {
            materiality_threshold: ImpactPolicy::default().materiality_threshold(),
            tag_aliases: BTreeMap::new(),
        }
    }
}

impl FileImpactConfig {
    /// Convert to the domain [`ImpactPolicy`].
    ///
    /// An invalid threshold or alias falls back to the default policy with a
    /// warning.
    pub fn to_policy(&self) -> (ImpactPolicy, Vec<ConfigIssue>) {
        let mut aliases = ImpactPolicy::default().tag_aliases().clone();
        for (from, to) in &self.tag_aliases {
            aliases.insert(from.trim().to_lowercase(), DomainTag::new(to));
        }

        match ImpactPolicy::try_new(self.materiality_threshold, aliases) {
            Ok(policy) => (policy, Vec::new()),
            Err(errors) => {
                let issues = errors
                    .into_iter()
                    .map(|message| {
                        ConfigIssue::warning(
                            ConfigIssueCode::OutOfRange {
                                field: "impact".to_string(),
                            },
                            message,
                        )
                    })
                    .collect();
                (ImpactPolicy::default(), issues)
            }
        }
    }
}
