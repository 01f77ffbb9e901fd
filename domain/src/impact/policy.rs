//! Impact policy: when does a change matter, and which tag does a topic mean.

use crate::agent::entities::DomainTag;
use std::collections::BTreeMap;

const DEFAULT_MATERIALITY_THRESHOLD: f64 = 0.1;

/// Tolerance so that a delta written as `0.1` counts at a `0.1` threshold.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Policy used by the impact analyzer and the delta report.
///
/// Constraints:
/// - `0.0 < materiality_threshold <= 1.0`
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactPolicy {
    materiality_threshold: f64,
    tag_aliases: BTreeMap<String, DomainTag>,
}

impl Default for ImpactPolicy {
    fn default() -> Self {
        let aliases = [
            ("finance", "financial"),
            ("finances", "financial"),
            ("revenue", "financial"),
            ("burn", "financial"),
            ("runway", "financial"),
            ("valuation", "financial"),
            ("founders", "team"),
            ("founder", "team"),
            ("hiring", "team"),
            ("compliance", "regulatory"),
            ("ip", "legal"),
            ("contracts", "legal"),
            ("competitors", "competition"),
            ("tech", "technical"),
            ("technology", "technical"),
            ("customer", "customers"),
            ("churn", "customers"),
            ("go-to-market", "gtm"),
            ("sales", "gtm"),
        ];
        Self {
            materiality_threshold: DEFAULT_MATERIALITY_THRESHOLD,
            tag_aliases: aliases
                .into_iter()
                .map(|(from, to)| (from.to_string(), DomainTag::new(to)))
                .collect(),
        }
    }
}

impl ImpactPolicy {
    /// Create a policy, returning every constraint violation found.
    pub fn try_new(
        materiality_threshold: f64,
        tag_aliases: BTreeMap<String, DomainTag>,
    ) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        if !(materiality_threshold > 0.0 && materiality_threshold <= 1.0) {
            errors.push(format!(
                "materiality_threshold ({}) must be in (0, 1]",
                materiality_threshold
            ));
        }
        for (from, to) in &tag_aliases {
            if from.trim().is_empty() || to.is_empty() {
                errors.push(format!("tag alias '{}' -> '{}' must not be empty", from, to));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            materiality_threshold,
            tag_aliases: tag_aliases
                .into_iter()
                .map(|(from, to)| (from.trim().to_lowercase(), to))
                .collect(),
        })
    }

    pub fn materiality_threshold(&self) -> f64 {
        self.materiality_threshold
    }

    pub fn tag_aliases(&self) -> &BTreeMap<String, DomainTag> {
        &self.tag_aliases
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.materiality_threshold = threshold;
        self
    }

    /// Whether a confidence change is large enough to act on.
    pub fn is_material(&self, delta: f64) -> bool {
        delta.is_finite() && delta.abs() + THRESHOLD_EPSILON >= self.materiality_threshold
    }

    /// Normalize a raw topic or domain to the catalog's tag vocabulary.
    pub fn canonical_tag(&self, raw: &str) -> DomainTag {
        let tag = DomainTag::new(raw);
        self.tag_aliases.get(tag.as_str()).cloned().unwrap_or(tag)
    }
}
