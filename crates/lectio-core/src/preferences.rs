//! Reader preferences: last location plus display and speech settings.
//!
//! Serialized as a flat camelCase JSON object. Missing keys fall back to
//! their defaults so older preference files keep loading.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Location, Translation};

/// Speech rates offered by the settings surface.
pub const TTS_RATES: [f32; 5] = [0.75, 1.0, 1.25, 1.5, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Sm,
    #[default]
    Base,
    Lg,
    Xl,
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sm" => Ok(FontSize::Sm),
            "base" => Ok(FontSize::Base),
            "lg" => Ok(FontSize::Lg),
            "xl" => Ok(FontSize::Xl),
            other => Err(format!(
                "unknown font size '{}': expected sm, base, lg, or xl",
                other
            )),
        }
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontSize::Sm => "sm",
            FontSize::Base => "base",
            FontSize::Lg => "lg",
            FontSize::Xl => "xl",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub translation_id: String,
    pub book_id: String,
    pub chapter_index: u32,
    pub dark_mode: bool,
    /// Empty means "show every translation".
    pub favorite_translations: Vec<String>,
    pub font_size: FontSize,
    pub tts_rate: f32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            translation_id: "KRV".to_string(),
            book_id: "GEN".to_string(),
            chapter_index: 0,
            dark_mode: false,
            favorite_translations: Vec::new(),
            font_size: FontSize::Base,
            tts_rate: 1.0,
        }
    }
}

impl Preferences {
    pub fn location(&self) -> Location {
        Location::new(
            self.translation_id.clone(),
            self.book_id.clone(),
            self.chapter_index,
        )
    }

    pub fn set_location(&mut self, location: &Location) {
        self.translation_id = location.translation_id.clone();
        self.book_id = location.book_id.clone();
        self.chapter_index = location.chapter_index;
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    /// Add the translation to favorites, or remove it if already there.
    pub fn toggle_favorite(&mut self, translation_id: &str) {
        match self
            .favorite_translations
            .iter()
            .position(|f| f == translation_id)
        {
            Some(i) => {
                self.favorite_translations.remove(i);
            }
            None => self.favorite_translations.push(translation_id.to_string()),
        }
    }

    /// Reject rates outside `(0, 10]`.
    pub fn set_tts_rate(&mut self, rate: f32) -> Result<(), String> {
        if !(rate > 0.0 && rate <= 10.0) {
            return Err(format!("tts rate must be in (0, 10], got {}", rate));
        }
        self.tts_rate = rate;
        Ok(())
    }

    /// Translations to offer: the favorites if any are set, else all.
    pub fn visible_translations<'a>(&self, all: &'a [Translation]) -> Vec<&'a Translation> {
        if self.favorite_translations.is_empty() {
            return all.iter().collect();
        }
        all.iter()
            .filter(|t| self.favorite_translations.contains(&t.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn translation(id: &str) -> Translation {
        Translation {
            id: id.to_string(),
            name: id.to_string(),
            language: "ko".to_string(),
            direction: Direction::Ltr,
        }
    }

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.location(), Location::new("KRV", "GEN", 0));
        assert_eq!(prefs.font_size, FontSize::Base);
        assert_eq!(prefs.tts_rate, 1.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"bookId": "EXO", "darkMode": true, "fontSize": "xl"}"#)
                .unwrap();
        assert_eq!(prefs.translation_id, "KRV");
        assert_eq!(prefs.book_id, "EXO");
        assert!(prefs.dark_mode);
        assert_eq!(prefs.font_size, FontSize::Xl);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["translationId"], "KRV");
        assert_eq!(json["favoriteTranslations"], serde_json::json!([]));
        assert_eq!(json["ttsRate"], 1.0);
    }

    #[test]
    fn test_favorites_filter() {
        let all = vec![translation("KRV"), translation("NIV"), translation("EASY")];
        let mut prefs = Preferences::default();
        assert_eq!(prefs.visible_translations(&all).len(), 3);

        prefs.toggle_favorite("NIV");
        let visible: Vec<_> = prefs
            .visible_translations(&all)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(visible, vec!["NIV"]);

        prefs.toggle_favorite("NIV");
        assert!(prefs.favorite_translations.is_empty());
    }

    #[test]
    fn test_tts_rate_bounds() {
        let mut prefs = Preferences::default();
        assert!(prefs.set_tts_rate(0.0).is_err());
        assert!(prefs.set_tts_rate(f32::NAN).is_err());
        prefs.set_tts_rate(1.25).unwrap();
        assert_eq!(prefs.tts_rate, 1.25);
    }
}
