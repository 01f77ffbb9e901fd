//! Console output formatter for orchestration results

use colored::Colorize;
use diligence_application::AnalysisStatusView;
use diligence_domain::{
    AgentDefinition, AgentName, AnalysisId, AnalysisStatus, DealCostSummary, DeltaReport,
    ImpactAssessment, TopicShift, UserCostStats,
};
use serde::Serialize;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format any result as pretty JSON
    pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    // ==================== Catalog ====================

    pub fn format_agents(agents: &[&AgentDefinition]) -> String {
        let mut output = Self::section_header(&format!("Agents ({})", agents.len()));
        for agent in agents {
            let tags: Vec<&str> = agent.domain_tags.iter().map(|t| t.as_str()).collect();
            output.push_str(&format!(
                "  {:<24} {}  {}\n",
                agent.name.as_str().bold(),
                format!("T{}", agent.tier.as_number()).yellow(),
                tags.join(", ").dimmed()
            ));
            if !agent.description.is_empty() {
                output.push_str(&format!("  {:<24}     {}\n", "", agent.description));
            }
        }
        output
    }

    pub fn format_assessment(assessment: &ImpactAssessment) -> String {
        let mut output = Self::section_header("Impact Assessment");
        let tags: Vec<&str> = assessment.tags.iter().map(|t| t.as_str()).collect();
        output.push_str(&format!(
            "{} {}\n",
            "Touched domains:".cyan().bold(),
            if tags.is_empty() { "none".to_string() } else { tags.join(", ") }
        ));
        if assessment.fallback_applied {
            output.push_str(&format!(
                "{}\n",
                "Untagged contradictions: all Tier 1 agents selected".yellow()
            ));
        }
        if assessment.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                "No material change; a delta report is sufficient.".green()
            ));
        } else {
            output.push_str(&Self::agent_list("Agents to run:", &assessment.agents));
        }
        output
    }

    // ==================== Runs ====================

    pub fn format_accepted(analysis_id: &AnalysisId, agents: &[AgentName]) -> String {
        let mut output = format!(
            "{} {}\n",
            "Analysis accepted:".green().bold(),
            analysis_id
        );
        output.push_str(&Self::agent_list("Dispatched agents:", agents));
        output
    }

    pub fn format_status(view: &AnalysisStatusView) -> String {
        let mut output = Self::header(&format!("Analysis {}", view.analysis_id));
        output.push('\n');

        let status = match view.status {
            AnalysisStatus::Completed => view.status.as_str().green().bold(),
            AnalysisStatus::Failed => view.status.as_str().red().bold(),
            _ => view.status.as_str().yellow().bold(),
        };
        output.push_str(&format!("{} {}\n", "Deal:".cyan().bold(), view.deal_id));
        output.push_str(&format!(
            "{} {} ({})\n",
            "Mode:".cyan().bold(),
            view.mode,
            match view.session_id.as_ref() {
                Some(session) => format!("session {}", session),
                None => "initial".to_string(),
            }
        ));
        output.push_str(&format!("{} {}\n", "Status:".cyan().bold(), status));
        output.push_str(&format!(
            "{} {}/{} agents ({}%)\n",
            "Progress:".cyan().bold(),
            view.completed_agents,
            view.total_agents,
            view.progress_percent()
        ));
        if let Some(summary) = &view.summary {
            output.push_str(&format!("{} {}\n", "Summary:".cyan().bold(), summary));
        }
        output.push_str(&format!("{} ${:.2}\n", "Cost:".cyan().bold(), view.total_cost));
        if let Some(ms) = view.timings.total_time_ms {
            output.push_str(&format!("{} {} ms\n", "Duration:".cyan().bold(), ms));
        }

        if let Some(results) = &view.results {
            output.push_str(&Self::section_header("Agent Results"));
            for result in results.values() {
                if result.success {
                    output.push_str(&format!(
                        "  {} {:<24} ${:.2}  {} ms\n",
                        "v".green(),
                        result.agent_name.as_str(),
                        result.cost,
                        result.execution_time_ms
                    ));
                } else {
                    output.push_str(&format!(
                        "  {} {:<24} {}\n",
                        "x".red(),
                        result.agent_name.as_str(),
                        result.error.as_deref().unwrap_or("Unknown").red()
                    ));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    // ==================== Delta ====================

    pub fn format_delta(report: &DeltaReport) -> String {
        let mut output = Self::header(&format!("Delta Report: {}", report.session_id));
        output.push('\n');
        output.push_str(&format!("{}\n", report.executive_summary));
        if let Some(previous) = &report.compared_to_session {
            output.push_str(&format!(
                "{} {}\n",
                "Compared to session:".dimmed(),
                previous
            ));
        }

        Self::push_shifts(&mut output, "Improved", &report.improved);
        Self::push_shifts(&mut output, "Worsened", &report.worsened);
        Self::push_shifts(&mut output, "Stable", &report.stable);

        if !report.newly_unresolved.is_empty() {
            output.push_str(&format!("\n{}\n", "Newly Unresolved:".red().bold()));
            for contradiction in &report.newly_unresolved {
                output.push_str(&format!("  * {}\n", contradiction.statement));
                if let Some(claim) = &contradiction.previous_claim {
                    output.push_str(&format!("    {} {}\n", "was:".dimmed(), claim));
                }
            }
        }
        if !report.recurring.is_empty() {
            output.push_str(&format!("\n{}\n", "Recurring Contradictions:".yellow().bold()));
            for contradiction in &report.recurring {
                output.push_str(&format!("  * {}\n", contradiction.statement));
            }
        }
        if !report.new_information.is_empty() {
            output.push_str(&format!("\n{}\n", "New Information:".cyan().bold()));
            for finding in &report.new_information {
                output.push_str(&format!("  * {}\n", finding.text));
            }
        }
        if !report.remaining_questions.is_empty() {
            output.push_str(&format!("\n{}\n", "Open Questions:".cyan().bold()));
            for finding in &report.remaining_questions {
                output.push_str(&format!("  * {}\n", finding.text));
            }
        }
        if !report.suggested_agents.is_empty() {
            output.push('\n');
            output.push_str(&Self::agent_list(
                "A targeted re-analysis would run:",
                &report.suggested_agents,
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    fn push_shifts(output: &mut String, title: &str, shifts: &[TopicShift]) {
        if shifts.is_empty() {
            return;
        }
        let title = format!("{}:", title);
        let title = match title.as_str() {
            "Improved:" => title.green().bold(),
            "Worsened:" => title.red().bold(),
            _ => title.dimmed().bold(),
        };
        output.push_str(&format!("\n{}\n", title));
        for shift in shifts {
            let movement = match (shift.baseline, shift.current) {
                (Some(before), Some(after)) => format!("{:.2} -> {:.2}", before, after),
                _ => "no baseline".to_string(),
            };
            output.push_str(&format!(
                "  {:<16} {:+.2}  ({})\n",
                shift.topic, shift.delta, movement
            ));
        }
    }

    // ==================== Costs ====================

    pub fn format_costs(summary: &DealCostSummary) -> String {
        let mut output = Self::section_header(&format!("Costs for {}", summary.deal_id));
        output.push_str(&format!(
            "{} ${:.2} over {} executions\n",
            "Total:".cyan().bold(),
            summary.total_cost,
            summary.event_count
        ));
        for (agent, totals) in &summary.by_agent {
            output.push_str(&format!(
                "  {:<24} {:>3}x  ${:.2}\n",
                agent.as_str(),
                totals.calls,
                totals.cost
            ));
        }
        output
    }

    pub fn format_user_stats(stats: &UserCostStats) -> String {
        format!(
            "{} {} spent ${:.2} ({} credits) on {} agent runs across {} analyses and {} deals in the last {} days\n",
            "Usage:".cyan().bold(),
            stats.user_id,
            stats.total_cost,
            stats.credits,
            stats.agent_calls,
            stats.analyses,
            stats.deals,
            stats.window_days
        )
    }

    // ==================== Helpers ====================

    fn agent_list(title: &str, agents: &[AgentName]) -> String {
        let mut output = format!("{} {}\n", title.cyan().bold(), agents.len());
        for agent in agents {
            output.push_str(&format!("  * {}\n", agent));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use diligence_domain::{
        AgentRegistry, Analysis, AnalysisMode, Contradiction, DealId, SessionId, ShiftDirection,
    };

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_agents_lists_tiers() {
        plain();
        let registry = AgentRegistry::builtin();
        let agents: Vec<&AgentDefinition> = registry.list_all().iter().collect();
        let output = ConsoleFormatter::format_agents(&agents);
        assert!(output.contains("Agents (18)"));
        assert!(output.contains("memo-generator"));
        assert!(output.contains("T3"));
    }

    #[test]
    fn test_empty_assessment_suggests_delta() {
        plain();
        let output = ConsoleFormatter::format_assessment(&ImpactAssessment::default());
        assert!(output.contains("delta report is sufficient"));
    }

    #[test]
    fn test_format_status_of_pending_run() {
        plain();
        let analysis = Analysis::pending(
            DealId::new("acme"),
            AnalysisMode::Full,
            None,
            vec![AgentName::new("a"), AgentName::new("b")],
            Utc::now(),
        );
        let output = ConsoleFormatter::format_status(&AnalysisStatusView::from(&analysis));
        assert!(output.contains("PENDING"));
        assert!(output.contains("0/2 agents (0%)"));
        assert!(!output.contains("Agent Results"));
    }

    #[test]
    fn test_format_delta_sections() {
        plain();
        let report = DeltaReport {
            deal_id: DealId::new("acme"),
            session_id: SessionId::new("call-2"),
            generated_at: Utc::now(),
            executive_summary: "Financial confidence dropped.".to_string(),
            improved: vec![],
            worsened: vec![TopicShift {
                topic: "financial".to_string(),
                baseline: Some(0.6),
                current: Some(0.4),
                delta: -0.2,
                direction: ShiftDirection::Worsened,
            }],
            stable: vec![],
            newly_unresolved: vec![Contradiction::new("Runway is 9 months").with_previous_claim("18 months")],
            recurring: vec![],
            new_information: vec![],
            remaining_questions: vec![],
            suggested_agents: vec![AgentName::new("financial-auditor")],
            compared_to_session: Some(SessionId::new("call-1")),
        };
        let output = ConsoleFormatter::format_delta(&report);
        assert!(output.contains("Worsened:"));
        assert!(output.contains("-0.20"));
        assert!(output.contains("0.60 -> 0.40"));
        assert!(output.contains("was: 18 months"));
        assert!(output.contains("financial-auditor"));
        assert!(!output.contains("Improved:"));
    }

    #[test]
    fn test_format_json_of_view_has_type() {
        let analysis = Analysis::pending(
            DealId::new("acme"),
            AnalysisMode::Targeted,
            Some(SessionId::new("call-1")),
            vec![AgentName::new("a")],
            Utc::now(),
        );
        let json = ConsoleFormatter::format_json(&AnalysisStatusView::from(&analysis));
        assert!(json.contains("\"type\": \"reanalysis\""));
    }
}
