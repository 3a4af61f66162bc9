//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `CONDUCTOR_ROUTER__MIN_SAMPLE_SIZE`
pub const ENV_PREFIX: &str = "CONDUCTOR_";

const PROJECT_CONFIG_FILES: [&str; 2] = ["conductor.toml", ".conductor.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `CONDUCTOR_` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./conductor.toml` or `./.conductor.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/agent-conductor/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(Box::new(figment::Error::from(format!(
                "config file not found: {}",
                path.display()
            ))));
        }

        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// File layers without the environment
    fn figment(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project, explicit].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/agent-conductor/config.toml if set,
    /// otherwise falls back to ~/.config/agent-conductor/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("agent-conductor").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for --show-config)
    pub fn describe_sources(explicit: Option<&PathBuf>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        lines.push(format!("  [ENV  ] {}*", ENV_PREFIX));

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("  [{mark}] Explicit: {}", path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./conductor.toml or ./.conductor.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{mark}] Global:  {}", path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.router.min_sample_size, 10);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("agent-conductor"));
    }

    #[test]
    fn test_layers_override_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("conductor.toml");
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&global, "[router]\nmin_sample_size = 3\nlookback_days = 30\n").unwrap();
        std::fs::write(&project, "[router]\nmin_sample_size = 5\n").unwrap();
        std::fs::write(&explicit, "[cache]\nenabled = false\n").unwrap();

        let config: FileConfig =
            ConfigLoader::figment(Some(&global), Some(&project), Some(&explicit))
                .extract()
                .unwrap();

        assert_eq!(config.router.min_sample_size, 5);
        assert_eq!(config.router.lookback_days, 30);
        assert!(!config.cache.enabled);
        assert_eq!(config.orchestrator.plan_timeout_seconds, 600);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ConfigLoader::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_project_config_discovery_prefers_plain_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::project_config_in(dir.path()).is_none());

        std::fs::write(dir.path().join(".conductor.toml"), "").unwrap();
        assert!(ConfigLoader::project_config_in(dir.path()).unwrap().ends_with(".conductor.toml"));

        std::fs::write(dir.path().join("conductor.toml"), "").unwrap();
        assert!(ConfigLoader::project_config_in(dir.path()).unwrap().ends_with("conductor.toml"));
    }
}
