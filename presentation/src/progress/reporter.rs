//! Progress reporting for agent batch execution

use colored::Colorize;
use diligence_application::ports::progress::RunProgressNotifier;
use diligence_domain::{AgentName, Analysis, AnalysisId, AnalysisStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports batch progress with a progress bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn short_id(analysis_id: AnalysisId) -> String {
        analysis_id.to_string().chars().take(8).collect()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunProgressNotifier for ProgressReporter {
    fn on_batch_start(&self, analysis_id: AnalysisId, total_agents: usize) {
        let pb = ProgressBar::new(total_agents as u64);
        pb.set_style(Self::batch_style());
        pb.set_prefix(format!("Analysis {}", Self::short_id(analysis_id)));
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_complete(&self, agent: &AgentName, success: bool, completed: usize, _total: usize) {
        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), agent)
            } else {
                format!("{} {}", "x".red(), agent)
            };
            pb.set_message(status);
            pb.set_position(completed as u64);
        }
    }

    fn on_batch_complete(&self, analysis: &Analysis) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(pb) = bar.take()
        {
            let message = match analysis.status() {
                AnalysisStatus::Completed => "complete!".green().to_string(),
                status => status.as_str().yellow().to_string(),
            };
            pb.finish_with_message(message);
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl RunProgressNotifier for SimpleProgress {
    fn on_batch_start(&self, analysis_id: AnalysisId, total_agents: usize) {
        println!(
            "{} {} ({} agents)",
            "->".cyan(),
            format!("Analysis {}", analysis_id).bold(),
            total_agents
        );
    }

    fn on_agent_complete(&self, agent: &AgentName, success: bool, completed: usize, total: usize) {
        if success {
            println!("  {} {} [{}/{}]", "v".green(), agent, completed, total);
        } else {
            println!("  {} {} (failed) [{}/{}]", "x".red(), agent, completed, total);
        }
    }

    fn on_batch_complete(&self, analysis: &Analysis) {
        println!(
            "{} {}\n",
            "->".cyan(),
            analysis.summary().unwrap_or(analysis.status().as_str())
        );
    }
}
