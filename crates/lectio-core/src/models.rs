//! Core data models used throughout Lectio.
//!
//! Reference content ([`Translation`], [`TranslationMeta`], [`BookData`]) is
//! deserialized straight from the static JSON resources, so field names
//! follow the camelCase layout of those files. Annotation records
//! ([`Bookmark`], [`Highlight`], [`Note`]) are addressed by a
//! [`VerseLocator`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text direction of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// A distinct rendering of the source text (language or edition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: String,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub direction: Direction,
}

/// Top-level book grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    Old,
    New,
}

impl FromStr for Testament {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "old" | "ot" => Ok(Testament::Old),
            "new" | "nt" => Ok(Testament::New),
            other => Err(format!("unknown testament '{}': expected old or new", other)),
        }
    }
}

impl fmt::Display for Testament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Testament::Old => f.write_str("old"),
            Testament::New => f.write_str("new"),
        }
    }
}

/// Metadata for a single book within a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeta {
    pub id: String,
    pub name: String,
    pub name_en: String,
    pub testament: Testament,
    /// Number of chapters; always > 0.
    pub chapters: u32,
}

/// Ordered book list for a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMeta {
    pub translation_id: String,
    pub books: Vec<BookMeta>,
}

impl TranslationMeta {
    /// Look up a book by id.
    pub fn book(&self, book_id: &str) -> Option<&BookMeta> {
        self.books.iter().find(|b| b.id == book_id)
    }

    /// Position of a book in canonical order.
    pub fn book_position(&self, book_id: &str) -> Option<usize> {
        self.books.iter().position(|b| b.id == book_id)
    }

    /// Books belonging to one testament, in canonical order.
    pub fn books_in(&self, testament: Testament) -> impl Iterator<Item = &BookMeta> {
        self.books.iter().filter(move |b| b.testament == testament)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    /// 1-based, unique within its chapter.
    pub verse: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter: u32,
    pub verses: Vec<Verse>,
}

/// Full text of one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookData {
    pub book_id: String,
    pub book_name: String,
    pub chapters: Vec<Chapter>,
}

impl BookData {
    /// The chapter at a 0-based index, or `None` when out of range.
    pub fn chapter_at(&self, index: u32) -> Option<&Chapter> {
        self.chapters.get(index as usize)
    }
}

/// A reading position: one chapter of one book in one translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub translation_id: String,
    pub book_id: String,
    /// 0-based.
    pub chapter_index: u32,
}

impl Location {
    pub fn new(
        translation_id: impl Into<String>,
        book_id: impl Into<String>,
        chapter_index: u32,
    ) -> Self {
        Self {
            translation_id: translation_id.into(),
            book_id: book_id.into(),
            chapter_index,
        }
    }

    /// 1-based chapter number as used by annotation records.
    pub fn chapter_number(&self) -> u32 {
        self.chapter_index + 1
    }

    pub fn chapter_key(&self) -> ChapterKey {
        ChapterKey {
            translation_id: self.translation_id.clone(),
            book_id: self.book_id.clone(),
            chapter: self.chapter_number(),
        }
    }

    pub fn verse(&self, verse: u32) -> VerseLocator {
        self.chapter_key().verse(verse)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.translation_id,
            self.book_id,
            self.chapter_number()
        )
    }
}

/// (translation, book, 1-based chapter): the shape of every per-chapter
/// annotation query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterKey {
    pub translation_id: String,
    pub book_id: String,
    pub chapter: u32,
}

impl ChapterKey {
    pub fn verse(&self, verse: u32) -> VerseLocator {
        VerseLocator {
            translation_id: self.translation_id.clone(),
            book_id: self.book_id.clone(),
            chapter: self.chapter,
            verse,
        }
    }
}

/// Addresses a single verse's annotation records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseLocator {
    pub translation_id: String,
    pub book_id: String,
    /// 1-based.
    pub chapter: u32,
    pub verse: u32,
}

impl VerseLocator {
    pub fn chapter_key(&self) -> ChapterKey {
        ChapterKey {
            translation_id: self.translation_id.clone(),
            book_id: self.book_id.clone(),
            chapter: self.chapter,
        }
    }
}

impl fmt::Display for VerseLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}",
            self.translation_id, self.book_id, self.chapter, self.verse
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    pub id: i64,
    #[serde(flatten)]
    pub locator: VerseLocator,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Yellow,
    Green,
    Pink,
    Blue,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 4] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Pink,
        HighlightColor::Blue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Pink => "pink",
            HighlightColor::Blue => "blue",
        }
    }
}

impl FromStr for HighlightColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HighlightColor::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown highlight color '{}': expected yellow, green, pink, or blue",
                    s
                )
            })
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub id: i64,
    #[serde(flatten)]
    pub locator: VerseLocator,
    pub color: HighlightColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: i64,
    #[serde(flatten)]
    pub locator: VerseLocator,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}
