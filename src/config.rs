//! TOML configuration parsing and validation.
//!
//! ```toml
//! [content]
//! source = "fs"                 # or "http"
//! root = "./bibles"
//! # base_url = "https://example.org"
//!
//! [db]
//! path = "./data/lectio.sqlite"
//!
//! [preferences]
//! path = "./data/preferences.json"
//!
//! [speech]
//! words_per_minute = 160
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    pub db: DbConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    #[serde(default = "default_source")]
    pub source: String,
    /// Directory holding `translations.json` (fs source).
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Site serving `/bibles/...` (http source).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_source() -> String {
    "fs".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/preferences.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Speaking pace of the terminal engine at rate 1.0.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
        }
    }
}

fn default_words_per_minute() -> u32 {
    160
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    match config.content.source.as_str() {
        "fs" => {
            if config.content.root.is_none() {
                anyhow::bail!("content.root must be set when content.source is 'fs'");
            }
        }
        "http" => match &config.content.base_url {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
            Some(url) => anyhow::bail!("content.base_url must be an http(s) URL, got '{}'", url),
            None => anyhow::bail!("content.base_url must be set when content.source is 'http'"),
        },
        other => anyhow::bail!(
            "Unknown content source: '{}'. Must be fs or http.",
            other
        ),
    }

    if config.content.timeout_secs == 0 {
        anyhow::bail!("content.timeout_secs must be > 0");
    }

    if config.speech.words_per_minute == 0 {
        anyhow::bail!("speech.words_per_minute must be > 0");
    }

    Ok(())
}
