use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "snapshot.ron";

pub const ENV_RECORD: &str = "SNAPSHOT_RECORD";
pub const ENV_REFERENCE_DIR: &str = "SNAPSHOT_REFERENCE_DIR";
pub const ENV_BUNDLE_DIR: &str = "SNAPSHOT_BUNDLE_DIR";
pub const ENV_DIFF_DIR: &str = "SNAPSHOT_DIFF_DIR";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the crate's events (e.g. "info", "debug")
    pub level: String,
    /// Per-module overrides, e.g. `{"tui_state_snapshots::internal::runner": "debug"}`
    pub module_levels: HashMap<String, String>,
    /// Directory for the daily rolling log file. Defaults to "logs".
    pub log_directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            module_levels: HashMap::new(),
            log_directory: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// When true, captures are written as new references instead of compared.
    pub recording: bool,
    /// Writable directory that receives references while recording.
    pub reference_image_directory: Option<PathBuf>,
    /// Packaged, read-only references used when comparing (e.g. `tests/snapshots`).
    pub bundle_directory: Option<PathBuf>,
    /// Where reference/failed/diff files are written on mismatch.
    pub image_diff_directory: Option<PathBuf>,
    /// Fraction of cells (0.0..=1.0) allowed to differ before a capture fails.
    pub tolerance: f64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u16,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u16,
    /// Append the viewport size to reference file names so several sizes can coexist.
    #[serde(default = "default_agnostic_screen_size")]
    pub agnostic_screen_size: bool,
    pub logging: LoggingConfig,
}

fn default_viewport_width() -> u16 {
    80
}

fn default_viewport_height() -> u16 {
    24
}

fn default_agnostic_screen_size() -> bool {
    true
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            recording: false,
            reference_image_directory: None,
            bundle_directory: None,
            image_diff_directory: None,
            tolerance: 0.0,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            agnostic_screen_size: default_agnostic_screen_size(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SnapshotConfig {
    /// Load `snapshot.ron` from the usual locations and apply environment overrides.
    pub fn load() -> Self {
        Self::load_file().apply_env_overrides(|key| std::env::var(key).ok())
    }

    fn load_file() -> Self {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(CONFIG_FILE_NAME));
        }

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("tui-state-snapshots").join(CONFIG_FILE_NAME));
        }

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(config) => {
                    tracing::info!("Loaded snapshot config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::error!("Failed to load snapshot config at {}: {:#}", path.display(), e);
                }
            }
        }

        tracing::info!("No snapshot config file found, using defaults");
        Self::default()
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = fs::read_to_string(path).context("Failed to read snapshot config")?;
        ron::from_str(&content).context("Failed to parse snapshot config")
    }

    /// Apply `SNAPSHOT_*` overrides read through `lookup`.
    pub fn apply_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_RECORD) {
            self.recording = parse_flag(&value);
        }
        if let Some(dir) = lookup(ENV_REFERENCE_DIR).filter(|v| !v.is_empty()) {
            self.reference_image_directory = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(ENV_BUNDLE_DIR).filter(|v| !v.is_empty()) {
            self.bundle_directory = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(ENV_DIFF_DIR).filter(|v| !v.is_empty()) {
            self.image_diff_directory = Some(PathBuf::from(dir));
        }
        self
    }

    /// Reference directory for the active mode: the writable one while
    /// recording, the packaged one while comparing.
    pub fn resolved_reference_directory(&self) -> Option<&Path> {
        if self.recording {
            self.reference_image_directory.as_deref()
        } else {
            self.bundle_directory.as_deref()
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let pretty = ron::ser::PrettyConfig::default()
            .depth_limit(2)
            .separate_tuple_members(true);
        let content = ron::ser::to_string_pretty(self, pretty).context("Failed to serialize snapshot config")?;
        fs::write(path, content).with_context(|| format!("Failed to write snapshot config to {}", path.display()))?;
        tracing::info!("Saved snapshot config to {}", path.display());
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_compare_mode() {
        let config = SnapshotConfig::default();
        assert!(!config.recording);
        assert_eq!(config.tolerance, 0.0);
        assert_eq!((config.viewport_width, config.viewport_height), (80, 24));
        assert!(config.resolved_reference_directory().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = SnapshotConfig::default().apply_env_overrides(env(&[
            (ENV_RECORD, "true"),
            (ENV_REFERENCE_DIR, "/tmp/refs"),
            (ENV_DIFF_DIR, "/tmp/diffs"),
        ]));

        assert!(config.recording);
        assert_eq!(config.reference_image_directory, Some(PathBuf::from("/tmp/refs")));
        assert_eq!(config.image_diff_directory, Some(PathBuf::from("/tmp/diffs")));
    }

    #[test]
    fn test_record_flag_parsing() {
        for (raw, expected) in [("1", true), ("YES", true), (" on ", true), ("0", false), ("nope", false)] {
            let config = SnapshotConfig::default().apply_env_overrides(env(&[(ENV_RECORD, raw)]));
            assert_eq!(config.recording, expected, "value {raw:?}");
        }
    }

    #[test]
    fn test_reference_directory_depends_on_mode() {
        let mut config = SnapshotConfig {
            reference_image_directory: Some(PathBuf::from("writable")),
            bundle_directory: Some(PathBuf::from("bundle")),
            ..Default::default()
        };
        assert_eq!(config.resolved_reference_directory(), Some(Path::new("bundle")));

        config.recording = true;
        assert_eq!(config.resolved_reference_directory(), Some(Path::new("writable")));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: SnapshotConfig = ron::from_str(r#"(recording: true, viewport_width: 40)"#).unwrap();
        assert!(config.recording);
        assert_eq!(config.viewport_width, 40);
        assert_eq!(config.viewport_height, 24);
        assert!(config.agnostic_screen_size);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = SnapshotConfig {
            bundle_directory: Some(PathBuf::from("tests/snapshots")),
            tolerance: 0.05,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let loaded = SnapshotConfig::from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
