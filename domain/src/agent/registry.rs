//! Agent Registry
//!
//! The [`AgentRegistry`] is the static catalog of analysis agents. It keeps a
//! deterministic order: Tier 1 agents first, then Tier 3, and catalog order
//! within a tier. Every consumer (full dispatch, impact analysis, display)
//! sees agents in that order.
//!
//! # Tag resolution
//!
//! [`AgentRegistry::resolve_tags`] returns the agents whose domain tags
//! intersect the requested set. Unknown tags simply match nothing.

use super::entities::{AgentDefinition, AgentName, AgentTier, DomainTag};
use crate::core::error::DomainError;
use std::collections::{BTreeSet, HashSet};

/// Static catalog of analysis agents
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
}

impl AgentRegistry {
    /// Build a registry from catalog entries.
    ///
    /// Entries are stably sorted by tier; duplicate names are rejected.
    pub fn new(mut agents: Vec<AgentDefinition>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.name.clone()) {
                return Err(DomainError::DuplicateAgent(agent.name.to_string()));
            }
        }
        agents.sort_by_key(|a| a.tier);
        Ok(Self { agents })
    }

    /// The built-in catalog: 13 domain specialists and 5 synthesizers.
    pub fn builtin() -> Self {
        use AgentTier::{DomainSpecialist as T1, Synthesizer as T3};

        let agents = vec![
            AgentDefinition::new("financial-auditor", T1, ["financial", "metrics"])
                .with_description("Audits revenue, burn and runway claims"),
            AgentDefinition::new("unit-economics", T1, ["financial", "pricing"])
                .with_description("CAC, LTV, margins and payback"),
            AgentDefinition::new("cap-table-auditor", T1, ["financial", "legal", "fundraising"])
                .with_description("Ownership, dilution and round terms"),
            AgentDefinition::new("market-intelligence", T1, ["market"])
                .with_description("Market size and growth assumptions"),
            AgentDefinition::new("competitive-mapper", T1, ["market", "competition"])
                .with_description("Competitor landscape and positioning"),
            AgentDefinition::new("team-investigator", T1, ["team"])
                .with_description("Founder backgrounds and team gaps"),
            AgentDefinition::new("legal-regulatory", T1, ["legal", "regulatory"])
                .with_description("Legal exposure and regulatory risk"),
            AgentDefinition::new("tech-stack-dd", T1, ["technical", "product"])
                .with_description("Architecture, scalability and technical debt"),
            AgentDefinition::new("product-analyst", T1, ["product"])
                .with_description("Product maturity and roadmap credibility"),
            AgentDefinition::new("customer-intel", T1, ["customers", "traction"])
                .with_description("Customer concentration, churn and references"),
            AgentDefinition::new("gtm-analyst", T1, ["gtm", "traction", "sales"])
                .with_description("Go-to-market motion and pipeline quality"),
            AgentDefinition::new("deck-forensics", T1, ["pitch", "metrics"])
                .with_description("Consistency of pitch deck claims"),
            AgentDefinition::new("esg-impact", T1, ["esg"])
                .with_description("Environmental, social and governance factors"),
            AgentDefinition::new("contradiction-detector", T3, ["contradictions"])
                .with_description("Cross-checks specialist findings for conflicts"),
            AgentDefinition::new("scenario-modeler", T3, ["financial", "scenarios"])
                .with_description("Bull, base and bear outcome modeling"),
            AgentDefinition::new("exit-strategist", T3, ["exit", "market"])
                .with_description("Exit paths and return potential"),
            AgentDefinition::new("devils-advocate", T3, ["risk"])
                .with_description("Strongest case against the deal"),
            AgentDefinition::new("memo-generator", T3, ["thesis"])
                .with_description("Investment memo synthesis"),
        ];

        Self { agents }
    }

    /// All agents in deterministic order (tier 1 before tier 3).
    pub fn list_all(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// Names of all agents, in catalog order.
    pub fn names(&self) -> Vec<AgentName> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }

    /// Agents whose domain tags intersect `tags`.
    pub fn resolve_tags(&self, tags: &BTreeSet<DomainTag>) -> Vec<&AgentDefinition> {
        if tags.is_empty() {
            return Vec::new();
        }
        self.agents.iter().filter(|a| a.covers_any(tags)).collect()
    }

    /// All Tier 1 (domain specialist) agents.
    pub fn tier_one(&self) -> Vec<&AgentDefinition> {
        self.agents.iter().filter(|a| a.is_tier_one()).collect()
    }

    pub fn get(&self, name: &AgentName) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| &a.name == name)
    }

    pub fn contains(&self, name: &AgentName) -> bool {
        self.get(name).is_some()
    }

    /// Every tag known to the catalog.
    pub fn known_tags(&self) -> BTreeSet<DomainTag> {
        self.agents
            .iter()
            .flat_map(|a| a.domain_tags.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
