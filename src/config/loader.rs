//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/codeverdict/config.toml)
//! 3. Project config (.codeverdict/config.toml)
//! 4. Environment variables (CODEVERDICT_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, ReviewError};

const ENV_PREFIX: &str = "CODEVERDICT_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_layers(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Resolve the layer chain from explicit file locations
    pub fn load_layers(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global_path
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(project_path));
        }

        // e.g. CODEVERDICT_REVIEW__BATCH_SIZE -> review.batch_size
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ReviewError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ReviewError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/codeverdict/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("codeverdict"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".codeverdict")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| ReviewError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            ReviewError::Config("Cannot determine global config directory".to_string())
        })?;

        Self::write_default_config(&global_dir, force)?;
        Ok(global_dir)
    }

    /// Initialize project configuration in the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        Self::write_default_config(&project_dir, force)?;
        Ok(project_dir)
    }

    /// Write the rendered defaults to `<dir>/config.toml`
    pub fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_toml()?)?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_config_toml() -> Result<String> {
        let body = toml::to_string_pretty(&Config::default())
            .map_err(|e| ReviewError::Config(e.to_string()))?;
        Ok(format!(
            "# codeverdict configuration\n\
             # Secrets (llm.api_key, github.token) are read from OPENAI_API_KEY / GITHUB_TOKEN\n\
             # or CODEVERDICT_LLM__API_KEY / CODEVERDICT_GITHUB__TOKEN.\n\n{}",
            body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_layers(None, &temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.llm.provider, "openai");
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");

        fs::write(&global, "[review]\nbatch_size = 5\nmax_tokens = 300\n").unwrap();
        fs::write(&project, "[review]\nbatch_size = 4\n").unwrap();

        let config = ConfigLoader::load_layers(Some(&global), &project).unwrap();
        assert_eq!(config.review.batch_size, 4);
        assert_eq!(config.review.max_tokens, 300);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[review]\nbatch_size = 1\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
    }

    #[test]
    fn test_written_defaults_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::write_default_config(temp_dir.path(), false).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.review.batch_size, 7);
        assert_eq!(config.prompts.summary, Config::default().prompts.summary);
    }

    #[test]
    fn test_env_override() {
        // SAFETY: no other test reads this variable
        unsafe {
            std::env::set_var("CODEVERDICT_LLM__MODEL", "test-model");
        }
        let temp_dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_layers(None, &temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.llm.model, "test-model");
        unsafe {
            std::env::remove_var("CODEVERDICT_LLM__MODEL");
        }
    }
}
