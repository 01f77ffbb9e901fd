//! Agent catalog entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique name of an agent in the catalog (e.g. `financial-auditor`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A topic an agent covers (e.g. `financial`, `legal`, `team`).
///
/// Tags are normalized to trimmed lower-case so that `"Legal "` from a
/// session summary matches `legal` in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DomainTag(String);

impl DomainTag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for DomainTag {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for DomainTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<DomainTag> for String {
    fn from(tag: DomainTag) -> Self {
        tag.0
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agent tier.
///
/// Tier 1 agents are domain specialists. Tier 3 agents synthesize across
/// Tier 1 outputs. There is no Tier 2 in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AgentTier {
    DomainSpecialist,
    Synthesizer,
}

impl AgentTier {
    pub fn as_number(&self) -> u8 {
        match self {
            AgentTier::DomainSpecialist => 1,
            AgentTier::Synthesizer => 3,
        }
    }
}

impl TryFrom<u8> for AgentTier {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AgentTier::DomainSpecialist),
            3 => Ok(AgentTier::Synthesizer),
            other => Err(DomainError::InvalidTier(other)),
        }
    }
}

impl From<AgentTier> for u8 {
    fn from(tier: AgentTier) -> Self {
        tier.as_number()
    }
}

impl fmt::Display for AgentTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.as_number())
    }
}

/// Immutable catalog entry for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: AgentName,
    pub tier: AgentTier,
    pub domain_tags: BTreeSet<DomainTag>,
    #[serde(default)]
    pub description: String,
}

impl AgentDefinition {
    pub fn new<I, T>(name: impl Into<AgentName>, tier: AgentTier, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DomainTag>,
    {
        Self {
            name: name.into(),
            tier,
            domain_tags: tags.into_iter().map(Into::into).collect(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns `true` if this agent covers any of the given tags.
    pub fn covers_any(&self, tags: &BTreeSet<DomainTag>) -> bool {
        !self.domain_tags.is_disjoint(tags)
    }

    pub fn is_tier_one(&self) -> bool {
        self.tier == AgentTier::DomainSpecialist
    }
}
