//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Analysis mode accepted by `reanalyze`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Compare against the baseline; no agents run
    Delta,
    /// Run only the agents the session impacted
    Targeted,
    /// Run the whole catalog
    Full,
}

impl ModeArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeArg::Delta => "delta",
            ModeArg::Targeted => "targeted",
            ModeArg::Full => "full",
        }
    }
}

/// CLI arguments for diligence
#[derive(Parser, Debug)]
#[command(name = "diligence")]
#[command(author, version, about = "Due-diligence analysis orchestrator")]
#[command(long_about = r#"
Diligence dispatches catalogs of analysis agents against a startup deal and
tracks each batch as an analysis run.

After a call with the founders, `reanalyze` decides how much work the new
information warrants:
  delta     compare against what was known before (no agents run)
  targeted  run only the agents whose domains the call touched
  full      run the whole catalog

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./diligence.toml    Project-level config
3. ~/.config/diligence/config.toml   Global config
Environment variables prefixed with DILIGENCE_ override all files
(e.g. DILIGENCE_ORCHESTRATOR__TIMEOUT_MINUTES=10).

Example:
  diligence --fixture demos/fixture.json agents
  diligence --fixture demos/fixture.json analyze acme
  diligence --fixture demos/fixture.json reanalyze acme call-2 --mode targeted
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Deals and session summaries to seed the store with (JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the agent catalog, optionally only agents covering some tags
    Agents {
        /// Domain tag filter (can be specified multiple times)
        #[arg(short, long, value_name = "TAG")]
        tag: Vec<String>,
    },

    /// Show which agents a post-call report would trigger
    Impact {
        /// Post-call report as JSON
        #[arg(value_name = "REPORT")]
        report: PathBuf,
    },

    /// Run the full catalog against a deal (initial due diligence)
    Analyze {
        #[arg(value_name = "DEAL")]
        deal: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Re-analyze a deal after a call session
    Reanalyze {
        #[arg(value_name = "DEAL")]
        deal: String,

        #[arg(value_name = "SESSION")]
        session: String,

        /// How much to re-run
        #[arg(short, long, value_enum, default_value = "targeted")]
        mode: ModeArg,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Compare a session against the deal's baseline (alias for `reanalyze --mode delta`)
    Delta {
        #[arg(value_name = "DEAL")]
        deal: String,

        #[arg(value_name = "SESSION")]
        session: String,
    },

    /// Show configuration file locations and the effective configuration
    ShowConfig,
}

/// Options shared by commands that execute agents
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// User the request is made on behalf of
    #[arg(long, value_name = "USER", default_value = "cli")]
    pub caller: String,

    /// Treat the caller as an admin (bypasses the rate limit)
    #[arg(long)]
    pub admin: bool,

    /// Make the scripted executor fail this agent (can be specified multiple times)
    #[arg(long, value_name = "AGENT")]
    pub fail_agent: Vec<String>,

    /// Simulated latency per agent, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 50)]
    pub latency_ms: u64,

    /// Return right after dispatch instead of waiting for the run
    #[arg(long)]
    pub no_wait: bool,
}
