use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::layout_engine::geometry::DEFAULT_EDGE_BAND;

const DEFAULT_CONFIG: &str = include_str!("../../tabtile.default.toml");

/// Deepest `max_depth` that is still accepted.
const MAX_DEPTH_LIMIT: usize = 64;

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".config").join("tabtile").join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub drop_zones: DropZoneSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Deepest layout level a drop may create. Unlimited when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Skip adding a tab whose data equals a tab already in the layout.
    #[serde(default = "yes")]
    pub dedupe_tabs: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self { LayoutSettings { max_depth: None, dedupe_tabs: yes() } }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DropZoneSettings {
    /// Fraction of a layout's width or height, from each edge, that counts as
    /// an edge drop.
    #[serde(default = "default_edge_band")]
    pub edge_band: f64,
}

impl Default for DropZoneSettings {
    fn default() -> Self { DropZoneSettings { edge_band: default_edge_band() } }
}

fn yes() -> bool { true }

fn default_edge_band() -> f64 { DEFAULT_EDGE_BAND }

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.layout.validate());
        issues.extend(self.drop_zones.validate());
        issues
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self.max_depth {
            Some(0) => issues.push("layout.max_depth must be at least 1".to_string()),
            Some(depth) if depth > MAX_DEPTH_LIMIT => issues.push(format!(
                "layout.max_depth should not exceed {MAX_DEPTH_LIMIT}, got {depth}"
            )),
            _ => {}
        }
        issues
    }
}

impl DropZoneSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !(self.edge_band > 0.0 && self.edge_band < 0.5) {
            issues.push(format!(
                "drop_zones.edge_band must be between 0 and 0.5 (exclusive), got {}",
                self.edge_band
            ));
        }
        issues
    }
}

impl Default for Config {
    fn default() -> Self { Self::parse(DEFAULT_CONFIG).expect("bundled default config must parse") }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&buf)
    }

    /// Reads `path` when it exists, otherwise falls back to the bundled
    /// defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Self::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_file = ConfigFile { settings: self.settings.clone() };
        let toml_string = toml::to_string_pretty(&config_file)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<ConfigFile>(buf) {
            Ok(file) => Ok(Config { settings: file.settings }),
            Err(e) => bail!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bundled_default_matches_code_defaults() {
        let config = Config::default();
        assert_eq!(config.settings, Settings::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = Config::parse(
            r#"
            [settings.layout]
            max_depth = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.layout.max_depth, Some(4));
        assert!(config.settings.layout.dedupe_tabs);
        assert_eq!(config.settings.drop_zones.edge_band, DEFAULT_EDGE_BAND);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::parse("[settings.layout]\nmax_dpth = 3\n").err().unwrap();
        assert!(err.to_string().contains("max_dpth"), "{err}");
    }

    #[test]
    fn validate_reports_out_of_range_values() {
        let mut config = Config::default();
        config.settings.layout.max_depth = Some(0);
        config.settings.drop_zones.edge_band = 0.5;
        let issues = config.validate();
        assert_eq!(issues.len(), 2, "{issues:?}");
        assert!(issues[0].contains("max_depth"));
        assert!(issues[1].contains("edge_band"));
    }

    #[test]
    fn save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.settings.layout.max_depth = Some(5);
        config.settings.layout.dedupe_tabs = false;
        config.settings.drop_zones.edge_band = 0.25;
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(Config::read(&dir.path().join("absent.toml")).is_err());
    }
}
