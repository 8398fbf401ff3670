use crate::models::DialyzerConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Configuration manager for loading and saving the YAML configuration file.
///
/// Manages a single file, `autoplt.yaml`, holding the analysis settings, the
/// project description (applications, dependencies, artifact directories),
/// and the backend executable location.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at the specified directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `autoplt.yaml` (e.g., the
    ///   project root)
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join("autoplt.yaml"),
            config_dir,
        })
    }

    /// Load the configuration file.
    ///
    /// # Returns
    /// The loaded DialyzerConfig, or defaults if the file doesn't exist
    pub fn load_config(&self) -> Result<DialyzerConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(DialyzerConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: DialyzerConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save the configuration file.
    ///
    /// # Arguments
    /// * `config` - The DialyzerConfig to save
    pub fn save_config(&self, config: &DialyzerConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (_manager, _temp_dir) = create_test_config_manager();
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let config = manager.load_config().unwrap();
        assert!(config.analysis.update_plt);
        assert!(config.analysis.succ_typings);
        assert!(config.project.apps.is_empty());
    }

    #[test]
    fn test_load_save_round_trip() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = DialyzerConfig::default();
        config.analysis.get_warnings = true;
        config.analysis.warnings = vec!["unmatched_returns".to_string()];
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config().unwrap();
        assert!(loaded.analysis.get_warnings);
        assert_eq!(loaded.analysis.warnings, vec!["unmatched_returns"]);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.config_path(), "analysis: [not, a, mapping]").unwrap();

        let err = manager.load_config().unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
