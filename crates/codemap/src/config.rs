use codegraph::settings::{AUTO_UPDATE_INTERVAL, BuilderSettings, LayoutSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "codemap.json";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup configuration. Every field may be omitted in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root whose `.codemap/` directory holds the scan caches.
    pub project_root: Option<PathBuf>,
    pub spacing: f32,
    pub auto_update_secs: u64,
    pub layout: LayoutSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            spacing: BuilderSettings::default().spacing,
            auto_update_secs: AUTO_UPDATE_INTERVAL.as_secs(),
            layout: LayoutSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like `load`, but any failure yields the defaults. A missing file is
    /// expected and not worth a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::debug!("no {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn builder_settings(&self) -> BuilderSettings {
        BuilderSettings::new(self.spacing)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.auto_update_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"spacing": 80, "layout": {"margin": 5}}"#)
            .unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.spacing, 80.0);
        assert_eq!(config.layout.margin, 5.0);
        assert_eq!(config.layout.rank_separation, 100.0);
        assert_eq!(config.auto_update_secs, 60);
        assert_eq!(config.project_root, None);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());

        let missing = dir.path().join("absent.json");
        assert_eq!(AppConfig::load_or_default(&missing), AppConfig::default());
    }

    #[test]
    fn spacing_is_clamped_and_interval_never_zero() {
        let config = AppConfig {
            spacing: 900.0,
            auto_update_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.builder_settings().spacing, 200.0);
        assert_eq!(config.rescan_interval(), Duration::from_secs(1));
    }
}
