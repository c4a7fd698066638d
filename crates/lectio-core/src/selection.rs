//! In-progress verse selection for the current chapter.
//!
//! A [`Selection`] is scoped to one chapter: the reader resets it on every
//! navigation, and every annotation commit clears it.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which annotation tool the user has opened for the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    None,
    Highlight,
    Note,
}

impl FromStr for ToolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ToolMode::None),
            "highlight" => Ok(ToolMode::Highlight),
            "note" => Ok(ToolMode::Note),
            other => Err(format!("unknown tool mode '{}'", other)),
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolMode::None => f.write_str("none"),
            ToolMode::Highlight => f.write_str("highlight"),
            ToolMode::Note => f.write_str("note"),
        }
    }
}

/// Selected verse numbers in the order they were picked, plus the active
/// tool mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    verses: Vec<u32>,
    tool_mode: ToolMode,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `verse` if absent, otherwise remove it.
    pub fn toggle(&mut self, verse: u32) {
        match self.verses.iter().position(|v| *v == verse) {
            Some(i) => {
                self.verses.remove(i);
            }
            None => self.verses.push(verse),
        }
    }

    /// Empty the selection and reset the tool mode.
    pub fn clear(&mut self) {
        self.verses.clear();
        self.tool_mode = ToolMode::None;
    }

    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.tool_mode = mode;
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tool_mode
    }

    pub fn verses(&self) -> &[u32] {
        &self.verses
    }

    pub fn contains(&self, verse: u32) -> bool {
        self.verses.contains(&verse)
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    /// The selected verse when exactly one is selected.
    pub fn single(&self) -> Option<u32> {
        match self.verses.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_keeps_insertion_order() {
        let mut sel = Selection::new();
        sel.toggle(5);
        sel.toggle(2);
        sel.toggle(9);
        assert_eq!(sel.verses(), &[5, 2, 9]);

        sel.toggle(2);
        assert_eq!(sel.verses(), &[5, 9]);
        assert!(!sel.contains(2));
    }

    #[test]
    fn test_clear_resets_tool_mode() {
        let mut sel = Selection::new();
        sel.toggle(1);
        sel.set_tool_mode(ToolMode::Highlight);
        sel.clear();
        assert!(sel.is_empty());
        assert_eq!(sel.tool_mode(), ToolMode::None);
    }

    #[test]
    fn test_single() {
        let mut sel = Selection::new();
        assert_eq!(sel.single(), None);
        sel.toggle(7);
        assert_eq!(sel.single(), Some(7));
        sel.toggle(8);
        assert_eq!(sel.single(), None);
    }
}
