//! Deal entity

use crate::core::ids::{DealId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A startup investment opportunity under evaluation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub name: String,
    pub owner_id: UserId,
    /// Last recorded confidence per topic, on a 0–1 scale.
    #[serde(default)]
    pub confidence_baseline: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl Deal {
    pub fn new(id: DealId, name: impl Into<String>, owner_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            confidence_baseline: BTreeMap::new(),
            created_at,
        }
    }

    pub fn with_baseline(mut self, topic: impl Into<String>, confidence: f64) -> Self {
        self.confidence_baseline
            .insert(topic.into().trim().to_lowercase(), confidence.clamp(0.0, 1.0));
        self
    }

    pub fn baseline_for(&self, topic: &str) -> Option<f64> {
        self.confidence_baseline.get(topic).copied()
    }
}
