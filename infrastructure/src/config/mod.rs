//! Configuration file loading for diligence
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DILIGENCE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./diligence.toml` or `./.diligence.toml`
//! 4. Global: `$XDG_CONFIG_HOME/diligence/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAdmissionConfig, FileAgentEntry, FileConfig, FileImpactConfig,
    FileLedgerConfig, FileLoggingConfig, FileOrchestratorConfig, ResolvedConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
