//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_FILES: [&str; 2] = ["diligence.toml", ".diligence.toml"];

/// Prefix for environment overrides (`DILIGENCE_ORCHESTRATOR__TIMEOUT_MINUTES=10`).
pub const ENV_PREFIX: &str = "DILIGENCE_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `DILIGENCE_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./diligence.toml` or `./.diligence.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/diligence/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::project_config_path().as_deref())
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&PathBuf>, project: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("diligence").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Config file locations in priority order, with whether each exists.
    pub fn config_sources() -> Vec<(String, Option<PathBuf>, bool)> {
        let mut sources = Vec::new();
        match Self::project_config_path() {
            Some(path) => sources.push(("Project".to_string(), Some(path), true)),
            None => sources.push(("Project".to_string(), None, false)),
        }
        if let Some(path) = Self::global_config_path() {
            let exists = path.exists();
            sources.push(("Global".to_string(), Some(path), exists));
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.orchestrator.timeout_minutes, 30);
        assert!(config.agents.is_empty());
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("diligence"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[orchestrator]\ntimeout_minutes = 12\n\n[admission]\nmax_requests = 9\n",
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&path), None).extract().unwrap();
        assert_eq!(config.orchestrator.timeout_minutes, 12);
        assert_eq!(config.orchestrator.agent_timeout_secs, 300);
        assert_eq!(config.admission.max_requests, 9);
    }

    #[test]
    fn test_project_file_is_overridden_by_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("diligence.toml");
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&project, "[ledger]\ncredits_per_usd = 10.0\n[impact]\nmateriality_threshold = 0.3\n").unwrap();
        std::fs::write(&explicit, "[ledger]\ncredits_per_usd = 20.0\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), Some(&project))
            .extract()
            .unwrap();
        assert_eq!(config.ledger.credits_per_usd, 20.0);
        assert_eq!(config.impact.materiality_threshold, 0.3);
    }

    #[test]
    fn test_env_overrides_files() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DILIGENCE_ORCHESTRATOR__MAX_PARALLEL_AGENTS", "2");
            let config: FileConfig = ConfigLoader::figment(None, None).extract()?;
            assert_eq!(config.orchestrator.max_parallel_agents, 2);
            Ok(())
        });
    }
}
