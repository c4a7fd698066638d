//! `lectio settings`: show and change reader preferences.
//!
//! Works on the preference file alone, so it runs even when the content
//! source is unreachable. The one exception is adding a favorite, which
//! checks the id against the translation list.

use anyhow::Result;

use lectio_core::preferences::{FontSize, Preferences, TTS_RATES};

use crate::config::Config;
use crate::prefs::PreferenceFile;
use crate::session::Session;

#[derive(Debug, Clone, clap::Subcommand)]
pub enum SettingsAction {
    /// Print every preference.
    Show,
    /// Toggle dark mode.
    DarkMode,
    /// Set the text size.
    FontSize { size: FontSize },
    /// Set the read-aloud speed multiplier.
    TtsRate { rate: f32 },
    /// Toggle a favorite translation, or list favorites when none is given.
    Favorites { translation: Option<String> },
}

fn print_preferences(prefs: &Preferences) {
    println!("Location:     {}", prefs.location());
    println!("Dark mode:    {}", if prefs.dark_mode { "on" } else { "off" });
    println!("Font size:    {}", prefs.font_size);
    println!("TTS rate:     {}", prefs.tts_rate);
    if prefs.favorite_translations.is_empty() {
        println!("Favorites:    (none, all translations shown)");
    } else {
        println!("Favorites:    {}", prefs.favorite_translations.join(", "));
    }
}

pub async fn run_settings(config: &Config, action: SettingsAction) -> Result<()> {
    let file = PreferenceFile::from_config(config);

    match action {
        SettingsAction::Show => print_preferences(&file.load()),
        SettingsAction::DarkMode => {
            let prefs = file.update(|p| {
                p.toggle_dark_mode();
                Ok(())
            })?;
            println!("Dark mode {}", if prefs.dark_mode { "on" } else { "off" });
        }
        SettingsAction::FontSize { size } => {
            file.update(|p| {
                p.font_size = size;
                Ok(())
            })?;
            println!("Font size set to {}", size);
        }
        SettingsAction::TtsRate { rate } => {
            file.update(|p| p.set_tts_rate(rate).map_err(anyhow::Error::msg))?;
            if !TTS_RATES.contains(&rate) {
                eprintln!(
                    "Note: {} is not one of the usual rates {:?}",
                    rate, TTS_RATES
                );
            }
            println!("TTS rate set to {}", rate);
        }
        SettingsAction::Favorites { translation: None } => {
            let prefs = file.load();
            for id in &prefs.favorite_translations {
                println!("{}", id);
            }
        }
        SettingsAction::Favorites {
            translation: Some(id),
        } => {
            // Removing a favorite works even if the translation is gone.
            let existing = file
                .load()
                .favorite_translations
                .into_iter()
                .find(|f| f.eq_ignore_ascii_case(&id));
            let id = match existing {
                Some(existing) => existing,
                None => Session::open_unloaded(config)?
                    .resolve_translation(&id)
                    .await?,
            };
            let prefs = file.update(|p| {
                p.toggle_favorite(&id);
                Ok(())
            })?;
            if prefs.favorite_translations.contains(&id) {
                println!("Added {} to favorites", id);
            } else {
                println!("Removed {} from favorites", id);
            }
        }
    }
    Ok(())
}
