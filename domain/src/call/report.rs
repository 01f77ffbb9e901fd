//! Post-call report value objects.
//!
//! A [`PostCallReport`] is the structured outcome of one call session. The
//! post-call pipeline persists it as a loosely-typed JSON payload inside a
//! [`SessionSummary`](super::summary::SessionSummary); this module rebuilds the
//! typed view from that payload. Parsing is tolerant: missing or malformed
//! fields become empty collections instead of errors.

use crate::agent::entities::DomainTag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One structured finding from a call (key point, new fact, question, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Finding {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<DomainTag>,
}

impl Finding {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            domains: Vec::new(),
        }
    }

    pub fn tagged<I, T>(text: impl Into<String>, domains: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DomainTag>,
    {
        Self {
            text: text.into(),
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self::new(s.trim())),
            Value::Object(map) => {
                let text = ["text", "content", "description", "point", "question"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::trim)
                    .unwrap_or_default();
                let domains = domains_from(map);
                if text.is_empty() && domains.is_empty() {
                    return None;
                }
                Some(Self {
                    text: text.to_string(),
                    domains,
                })
            }
            _ => None,
        }
    }
}

/// A statement from the call that conflicts with previously known information.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contradiction {
    /// What was said on the call.
    pub statement: String,
    /// The earlier claim it conflicts with, when the pipeline captured it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_claim: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<DomainTag>,
}

impl Contradiction {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            previous_claim: None,
            domains: Vec::new(),
        }
    }

    pub fn with_previous_claim(mut self, claim: impl Into<String>) -> Self {
        self.previous_claim = Some(claim.into());
        self
    }

    pub fn with_domains<I, T>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DomainTag>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Identity used to match the same contradiction across sessions.
    pub fn key(&self) -> String {
        self.statement
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self::new(s.trim())),
            Value::Object(map) => {
                let statement = ["statement", "text", "content", "description", "claim"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::trim)
                    .unwrap_or_default();
                if statement.is_empty() {
                    return None;
                }
                let previous_claim = ["previous_claim", "previousClaim", "original"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::to_string);
                Some(Self {
                    statement: statement.to_string(),
                    previous_claim,
                    domains: domains_from(map),
                })
            }
            _ => None,
        }
    }
}

/// Call statistics as reported by the post-call pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub questions_asked: usize,
    #[serde(default)]
    pub questions_answered: usize,
}

/// Structured summary of what a call session surfaced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostCallReport {
    pub executive_summary: String,
    pub key_points: Vec<Finding>,
    pub action_items: Vec<Finding>,
    pub new_information: Vec<Finding>,
    pub contradictions: Vec<Contradiction>,
    pub questions_asked: Vec<Finding>,
    pub remaining_questions: Vec<Finding>,
    /// Topic → signed change on a 0–1 confidence scale.
    pub confidence_delta: BTreeMap<String, f64>,
    pub session_stats: SessionStats,
}

impl PostCallReport {
    /// Rebuild a report from a persisted JSON payload.
    ///
    /// Accepts both `snake_case` and `camelCase` keys. Anything that does not
    /// have the expected shape is skipped.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(map) = payload.as_object() else {
            return Self::default();
        };
        let field = |snake: &str, camel: &str| map.get(snake).or_else(|| map.get(camel));

        let findings = |snake: &str, camel: &str| -> Vec<Finding> {
            field(snake, camel)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Finding::from_value).collect())
                .unwrap_or_default()
        };

        let contradictions = field("contradictions", "contradictions")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Contradiction::from_value).collect())
            .unwrap_or_default();

        let confidence_delta = field("confidence_delta", "confidenceDelta")
            .and_then(Value::as_object)
            .map(|deltas| {
                deltas
                    .iter()
                    .filter_map(|(topic, v)| {
                        let delta = v.as_f64()?;
                        delta.is_finite().then(|| (topic.trim().to_lowercase(), delta))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let session_stats = field("session_stats", "sessionStats")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        Self {
            executive_summary: field("executive_summary", "executiveSummary")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            key_points: findings("key_points", "keyPoints"),
            action_items: findings("action_items", "actionItems"),
            new_information: findings("new_information", "newInformation"),
            contradictions,
            questions_asked: findings("questions_asked", "questionsAsked"),
            remaining_questions: findings("remaining_questions", "remainingQuestions"),
            confidence_delta,
            session_stats,
        }
    }

    /// Serialize back into the payload shape used by session summaries.
    pub fn to_payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// `true` if the report carries nothing that could trigger re-analysis.
    pub fn is_empty(&self) -> bool {
        self.new_information.is_empty()
            && self.contradictions.is_empty()
            && self.confidence_delta.is_empty()
    }

    /// Contradiction keys raised by this report.
    pub fn contradiction_keys(&self) -> BTreeSet<String> {
        self.contradictions.iter().map(Contradiction::key).collect()
    }
}

fn domains_from(map: &serde_json::Map<String, Value>) -> Vec<DomainTag> {
    let mut domains = Vec::new();
    for key in ["domain", "category", "topic"] {
        if let Some(tag) = map.get(key).and_then(Value::as_str) {
            domains.push(DomainTag::new(tag));
        }
    }
    for key in ["domains", "tags", "categories"] {
        if let Some(items) = map.get(key).and_then(Value::as_array) {
            domains.extend(items.iter().filter_map(Value::as_str).map(DomainTag::new));
        }
    }
    domains.retain(|d| !d.is_empty());
    domains.dedup();
    domains
}
