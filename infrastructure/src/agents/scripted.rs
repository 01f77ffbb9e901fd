//! Deterministic local agent executor

use async_trait::async_trait;
use diligence_application::ports::agent_executor::{
    AgentExecutor, AgentInvocation, AgentOutput, ExecutorError,
};
use diligence_domain::{AgentName, AgentRegistry, AgentTier};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// USD billed per successful execution, by tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierCosts {
    pub domain_specialist: f64,
    pub synthesizer: f64,
}

impl Default for TierCosts {
    fn default() -> Self {
        Self {
            domain_specialist: 0.12,
            synthesizer: 0.30,
        }
    }
}

impl TierCosts {
    fn for_tier(&self, tier: AgentTier) -> f64 {
        match tier {
            AgentTier::DomainSpecialist => self.domain_specialist,
            AgentTier::Synthesizer => self.synthesizer,
        }
    }
}

/// Executes catalog agents without a model: each agent sleeps for the
/// configured latency, then returns a fixed-shape finding. Agents listed as
/// failing return an error instead.
pub struct ScriptedAgentExecutor {
    registry: Arc<AgentRegistry>,
    costs: TierCosts,
    latency: Duration,
    failing: HashSet<AgentName>,
}

impl ScriptedAgentExecutor {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            costs: TierCosts::default(),
            latency: Duration::from_millis(50),
            failing: HashSet::new(),
        }
    }

    pub fn with_costs(mut self, costs: TierCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failing<I, T>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AgentName>,
    {
        self.failing.extend(agents.into_iter().map(Into::into));
        self
    }
}

/// Stable 1–10 score per agent and deal.
fn score(agent: &AgentName, invocation: &AgentInvocation) -> u64 {
    let seed = agent
        .as_str()
        .bytes()
        .chain(invocation.deal_id.as_str().bytes())
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
    seed % 10 + 1
}

#[async_trait]
impl AgentExecutor for ScriptedAgentExecutor {
    async fn execute(&self, invocation: &AgentInvocation) -> Result<AgentOutput, ExecutorError> {
        let definition = self
            .registry
            .get(&invocation.agent)
            .ok_or_else(|| ExecutorError::Unavailable(invocation.agent.to_string()))?;

        debug!(
            analysis_id = %invocation.analysis_id,
            agent = %invocation.agent,
            tier = %definition.tier,
            "Running scripted agent"
        );
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing.contains(&invocation.agent) {
            return Err(ExecutorError::Failed(format!(
                "{} could not produce a finding",
                invocation.agent
            )));
        }

        let data = json!({
            "agent": invocation.agent,
            "deal_id": invocation.deal_id,
            "session_id": invocation.session_id,
            "tags": definition.domain_tags,
            "score": score(&invocation.agent, invocation),
        });
        Ok(AgentOutput::new(self.costs.for_tier(definition.tier)).with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diligence_domain::{AnalysisId, DealId};

    fn invocation(agent: &str) -> AgentInvocation {
        AgentInvocation {
            analysis_id: AnalysisId::generate(),
            deal_id: DealId::new("deal-1"),
            agent: AgentName::new(agent),
            session_id: None,
        }
    }

    fn executor() -> ScriptedAgentExecutor {
        ScriptedAgentExecutor::new(Arc::new(AgentRegistry::builtin())).with_latency(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_cost_follows_tier() {
        let executor = executor();
        let registry = AgentRegistry::builtin();
        for definition in registry.list_all() {
            let output = executor
                .execute(&invocation(definition.name.as_str()))
                .await
                .unwrap();
            let expected = match definition.tier {
                AgentTier::DomainSpecialist => 0.12,
                AgentTier::Synthesizer => 0.30,
            };
            assert_eq!(output.cost, expected);
            assert!(output.data.is_some());
        }
    }

    #[tokio::test]
    async fn test_failing_and_unknown_agents() {
        let executor = executor().with_failing(["team-investigator"]);
        assert!(matches!(
            executor.execute(&invocation("team-investigator")).await,
            Err(ExecutorError::Failed(_))
        ));
        assert!(matches!(
            executor.execute(&invocation("nobody")).await,
            Err(ExecutorError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_output_is_deterministic() {
        let executor = executor();
        let a = executor.execute(&invocation("financial-auditor")).await.unwrap();
        let b = executor.execute(&invocation("financial-auditor")).await.unwrap();
        assert_eq!(a.data, b.data);
    }
}
