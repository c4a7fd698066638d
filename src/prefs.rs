//! Preference persistence.
//!
//! Preferences live in a single JSON file (`[preferences].path`). A missing
//! file means defaults. An unreadable or malformed file is logged and also
//! treated as defaults, so a damaged blob never blocks reading. Every change
//! rewrites the whole file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use lectio_core::preferences::Preferences;

use crate::config::Config;

pub struct PreferenceFile {
    path: PathBuf,
}

impl PreferenceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.preferences.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore saved preferences, falling back to defaults.
    pub fn load(&self) -> Preferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no preference file, using defaults");
                return Preferences::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read preferences");
                return Preferences::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed preferences");
                Preferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }

    /// Load, apply `change`, and save.
    pub fn update<F>(&self, change: F) -> Result<Preferences>
    where
        F: FnOnce(&mut Preferences) -> Result<()>,
    {
        let mut prefs = self.load();
        change(&mut prefs)?;
        self.save(&prefs)?;
        Ok(prefs)
    }
}
