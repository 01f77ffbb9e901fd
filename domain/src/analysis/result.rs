//! Per-agent execution result.

use crate::agent::entities::AgentName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one agent execution (immutable once recorded).
///
/// Only the envelope (`success`, `cost`, `execution_time_ms`, `error`) is
/// meaningful to the orchestrator; `data` is the agent's own payload and is
/// stored without inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_name: AgentName,
    pub success: bool,
    pub execution_time_ms: u64,
    /// Cost in USD.
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AgentResult {
    /// Creates a successful result.
    pub fn success(agent_name: impl Into<AgentName>, execution_time_ms: u64, cost: f64) -> Self {
        Self {
            agent_name: agent_name.into(),
            success: true,
            execution_time_ms,
            cost,
            error: None,
            data: None,
        }
    }

    /// Creates a failed result. Failed executions are not billed.
    pub fn failure(
        agent_name: impl Into<AgentName>,
        execution_time_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            success: false,
            execution_time_ms,
            cost: 0.0,
            error: Some(error.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Cost is finite and non-negative.
    pub fn has_valid_cost(&self) -> bool {
        self.cost.is_finite() && self.cost >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_is_free() {
        let result = AgentResult::failure("legal-regulatory", 1200, "rate limited");
        assert!(!result.success);
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_cost_validation() {
        assert!(AgentResult::success("a", 1, 0.42).has_valid_cost());
        assert!(!AgentResult::success("a", 1, -1.0).has_valid_cost());
        assert!(!AgentResult::success("a", 1, f64::INFINITY).has_valid_cost());
    }

    #[test]
    fn test_serialization_skips_empty_optionals() {
        let json = serde_json::to_value(AgentResult::success("a", 10, 0.1)).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("data").is_none());

        let with_data = AgentResult::success("a", 10, 0.1).with_data(json!({"score": 7}));
        assert_eq!(with_data.data, Some(json!({"score": 7})));
    }
}
