use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::analysis::CategoryOrder;

#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug, Default)]
pub enum Theme {
    #[default]
    System,
    Dark,
    Light,
}

impl Theme {
    pub fn all() -> &'static [Theme] {
        &[Theme::System, Theme::Dark, Theme::Light]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::System => "System",
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub data_source: Option<String>,
    #[serde(default = "default_true")]
    pub cache_bust: bool,
    #[serde(default)]
    pub category_order: CategoryOrder,
    #[serde(default = "default_true")]
    pub show_cards: bool,
    #[serde(default)]
    pub recent_sources: Vec<String>,
    #[serde(default = "default_max_recent")]
    pub max_recent_sources: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_recent() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            data_source: None,
            cache_bust: true,
            category_order: CategoryOrder::Descending,
            show_cards: true,
            recent_sources: Vec::new(),
            max_recent_sources: 10,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "complaint-dash").map(|dirs| dirs.config_dir().join("config.json"))
}

impl Settings {
    pub fn load() -> Self {
        config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("ignoring malformed settings at {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                warn!("failed to read settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn add_recent_source(&mut self, source: &str) {
        self.recent_sources.retain(|s| s != source);
        self.recent_sources.insert(0, source.to_string());
        self.recent_sources.truncate(self.max_recent_sources);
    }

    pub fn save(&self) {
        if let Some(path) = config_path() {
            if let Err(e) = self.save_to(&path) {
                warn!("failed to save settings: {:#}", e);
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn reset() {
        if let Some(path) = config_path() {
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("failed to remove settings: {}", e);
                }
            }
        }
    }
}
