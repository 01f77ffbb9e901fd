//! Impact Analyzer
//!
//! Computes which agents must re-run after a call:
//!
//! 1. Collect domain tags from `new_information`, `contradictions`, and every
//!    `confidence_delta` topic whose change is material.
//! 2. Resolve those tags against the [`AgentRegistry`].
//! 3. If nothing resolved but the call raised contradictions, fall back to
//!    every Tier 1 agent.
//!
//! The computation is pure and never fails; an empty or malformed report
//! yields an empty set.

use crate::agent::entities::{AgentName, DomainTag};
use crate::agent::registry::AgentRegistry;
use crate::call::report::PostCallReport;
use crate::impact::policy::ImpactPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of an impact analysis, with the reasoning kept for display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactAssessment {
    /// Canonical tags the report touched.
    pub tags: BTreeSet<DomainTag>,
    /// Impacted agents, in registry order.
    pub agents: Vec<AgentName>,
    /// `true` when the contradiction fallback selected the Tier 1 sweep.
    pub fallback_applied: bool,
}

impl ImpactAssessment {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent_set(&self) -> BTreeSet<AgentName> {
        self.agents.iter().cloned().collect()
    }
}

/// Maps a post-call report to impacted agents.
pub struct ImpactAnalyzer<'a> {
    registry: &'a AgentRegistry,
    policy: &'a ImpactPolicy,
}

impl<'a> ImpactAnalyzer<'a> {
    pub fn new(registry: &'a AgentRegistry, policy: &'a ImpactPolicy) -> Self {
        Self { registry, policy }
    }

    /// The set of agents whose domain is impacted by `report`.
    pub fn identify_impacted_agents(&self, report: &PostCallReport) -> BTreeSet<AgentName> {
        self.assess(report).agent_set()
    }

    /// Full assessment including the tags that drove the selection.
    pub fn assess(&self, report: &PostCallReport) -> ImpactAssessment {
        let tags = self.impacted_tags(report);

        let resolved: Vec<AgentName> = self
            .registry
            .resolve_tags(&tags)
            .into_iter()
            .map(|a| a.name.clone())
            .collect();

        if resolved.is_empty() && !report.contradictions.is_empty() {
            return ImpactAssessment {
                tags,
                agents: self
                    .registry
                    .tier_one()
                    .into_iter()
                    .map(|a| a.name.clone())
                    .collect(),
                fallback_applied: true,
            };
        }

        ImpactAssessment {
            tags,
            agents: resolved,
            fallback_applied: false,
        }
    }

    /// Canonical tags referenced by the report's actionable content.
    pub fn impacted_tags(&self, report: &PostCallReport) -> BTreeSet<DomainTag> {
        let from_findings = report
            .new_information
            .iter()
            .flat_map(|f| f.domains.iter());
        let from_contradictions = report.contradictions.iter().flat_map(|c| c.domains.iter());
        let from_confidence = report
            .confidence_delta
            .iter()
            .filter(|(_, delta)| self.policy.is_material(**delta))
            .map(|(topic, _)| topic);

        from_findings
            .chain(from_contradictions)
            .map(|tag| self.policy.canonical_tag(tag.as_str()))
            .chain(from_confidence.map(|topic| self.policy.canonical_tag(topic)))
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::report::{Contradiction, Finding};
    use std::collections::BTreeMap;

    fn analyze(report: &PostCallReport) -> ImpactAssessment {
        let registry = AgentRegistry::builtin();
        let policy = ImpactPolicy::default();
        ImpactAnalyzer::new(&registry, &policy).assess(report)
    }

    fn names(assessment: &ImpactAssessment) -> Vec<String> {
        assessment.agents.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn empty_report_impacts_nothing() {
        let assessment = analyze(&PostCallReport::default());
        assert!(assessment.is_empty());
        assert!(!assessment.fallback_applied);
    }

    #[test]
    fn immaterial_confidence_delta_impacts_nothing() {
        let report = PostCallReport {
            confidence_delta: BTreeMap::from([("legal".to_string(), 0.05)]),
            ..Default::default()
        };
        assert!(analyze(&report).is_empty());
    }

    #[test]
    fn material_confidence_delta_selects_domain_agents() {
        let report = PostCallReport {
            confidence_delta: BTreeMap::from([("legal".to_string(), -0.1)]),
            ..Default::default()
        };
        assert_eq!(names(&analyze(&report)), vec!["cap-table-auditor", "legal-regulatory"]);
    }

    #[test]
    fn new_information_tags_are_aliased() {
        let report = PostCallReport {
            new_information: vec![Finding::tagged("Hired VP Eng", ["Founders"])],
            ..Default::default()
        };
        let assessment = analyze(&report);
        assert_eq!(names(&assessment), vec!["team-investigator"]);
        assert!(assessment.tags.contains(&DomainTag::new("team")));
    }

    #[test]
    fn synthesizers_are_selected_by_their_own_tags() {
        let report = PostCallReport {
            new_information: vec![Finding::tagged("Acquirer interest", ["exit"])],
            ..Default::default()
        };
        assert_eq!(names(&analyze(&report)), vec!["exit-strategist"]);
    }

    #[test]
    fn unresolvable_contradiction_falls_back_to_all_tier_one() {
        let report = PostCallReport {
            contradictions: vec![Contradiction::new("Office is in Berlin, not Paris")],
            ..Default::default()
        };
        let registry = AgentRegistry::builtin();
        let assessment = analyze(&report);

        assert!(assessment.fallback_applied);
        let expected: Vec<_> = registry.tier_one().into_iter().map(|a| a.name.clone()).collect();
        assert_eq!(assessment.agents, expected);
    }

    #[test]
    fn contradiction_with_unknown_domain_still_falls_back() {
        let report = PostCallReport {
            contradictions: vec![Contradiction::new("x").with_domains(["astrology"])],
            ..Default::default()
        };
        let assessment = analyze(&report);
        assert!(assessment.fallback_applied);
        assert_eq!(assessment.agents.len(), 13);
    }

    #[test]
    fn resolvable_contradiction_does_not_fall_back() {
        let report = PostCallReport {
            contradictions: vec![Contradiction::new("Churn is 8%").with_domains(["customers"])],
            ..Default::default()
        };
        let assessment = analyze(&report);
        assert!(!assessment.fallback_applied);
        assert_eq!(names(&assessment), vec!["customer-intel"]);
    }

    #[test]
    fn identify_impacted_agents_unions_sources() {
        let registry = AgentRegistry::builtin();
        let policy = ImpactPolicy::default();
        let report = PostCallReport {
            new_information: vec![Finding::tagged("Patent filed", ["ip"])],
            confidence_delta: BTreeMap::from([
                ("team".to_string(), 0.4),
                ("market".to_string(), 0.01),
            ]),
            ..Default::default()
        };
        let agents = ImpactAnalyzer::new(&registry, &policy).identify_impacted_agents(&report);
        let expected: BTreeSet<AgentName> = ["cap-table-auditor", "legal-regulatory", "team-investigator"]
            .into_iter()
            .map(AgentName::from)
            .collect();
        assert_eq!(agents, expected);
    }

    #[test]
    fn custom_threshold_is_respected() {
        let registry = AgentRegistry::builtin();
        let policy = ImpactPolicy::default().with_threshold(0.5);
        let report = PostCallReport {
            confidence_delta: BTreeMap::from([("team".to_string(), 0.4)]),
            ..Default::default()
        };
        assert!(ImpactAnalyzer::new(&registry, &policy)
            .identify_impacted_agents(&report)
            .is_empty());
    }
}
