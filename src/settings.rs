//! Persistent settings for the visualizer.

use crate::anomaly::AnomalyConfig;
use crate::feed::FeedConfig;
use crate::graph::SimulationConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// All persistable settings. Missing fields fall back to their defaults,
/// so older files keep loading as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub simulation: SimulationConfig,
    pub feed: FeedConfig,
    pub anomaly: AnomalyConfig,

    // Display
    pub show_legend: bool,
    pub show_anomalies: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            feed: FeedConfig::default(),
            anomaly: AnomalyConfig::default(),
            show_legend: true,
            show_anomalies: true,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("ledger-visualizer");
            p.push("settings.json");
            p
        })
    }

    pub fn try_load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("invalid settings file {}", path.display()))
    }

    /// Load settings from disk, returning defaults if the file is missing or invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("could not determine config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            // First run
            return Self::default();
        }

        match Self::try_load(&path) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "loaded settings");
                settings
            }
            Err(e) => {
                tracing::warn!("{e:#}, using default settings");
                Self::default()
            }
        }
    }

    pub fn try_save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        std::fs::write(path, json).with_context(|| format!("failed to write settings to {}", path.display()))
    }

    /// Save settings to disk, logging instead of failing
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("could not determine config directory, settings not saved");
            return;
        };
        match self.try_save(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "saved settings"),
            Err(e) => tracing::warn!("{e:#}"),
        }
    }
}
