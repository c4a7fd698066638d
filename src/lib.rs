//! # Lectio
//!
//! A local-first scripture reader: navigate translations, books, and
//! chapters; keep bookmarks, highlights, and notes per verse; and have a
//! chapter read aloud.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ ContentSource│──▶│ContentLoader │──▶│    Reader    │
//! │   fs / http  │   │  (memoized)  │   │ (navigation) │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │ selection
//!                    ┌──────────────┐   ┌──────▼───────┐
//!                    │ObservedStore │◀──│  Annotator   │
//!                    │ ─▶ SQLite    │   │              │
//!                    └──────────────┘   └──────────────┘
//! ```
//!
//! Runtime-free types and rules (models, chapter transitions, selection,
//! annotation commands, the read-aloud sequencer) live in `lectio-core`.
//! This crate adds the async plumbing around them.
//!
//! ## Quick Start
//!
//! ```bash
//! lectio init                   # create the annotation database
//! lectio goto GEN 1             # open Genesis 1
//! lectio bookmark 1 3           # bookmark verses 1 and 3
//! lectio highlight yellow 2     # highlight verse 2
//! lectio note 1 "In the beginning"
//! lectio next                   # Genesis 2
//! lectio read                   # read the chapter aloud
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | Content sources and the memoizing loader |
//! | [`reader`] | Navigation state machine and verse selection |
//! | [`annotator`] | Selection-driven annotation commands |
//! | [`observe`] | Change notifications over any annotation store |
//! | [`sqlite_store`] | SQLite annotation store |
//! | [`prefs`] | Preference file persistence |
//! | [`speech`] | Terminal speech engine and read-aloud driver |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod annotator;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod mark;
pub mod migrate;
pub mod navigate;
pub mod observe;
pub mod prefs;
pub mod read_cmd;
pub mod reader;
pub mod saved;
pub mod session;
pub mod settings;
pub mod show;
pub mod speech;
pub mod sqlite_store;
