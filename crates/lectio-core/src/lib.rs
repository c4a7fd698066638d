//! # Lectio Core
//!
//! Shared, runtime-free logic for Lectio: data models, error taxonomy,
//! chapter navigation, verse selection, the annotation store trait, and the
//! read-aloud sequencer.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies.

pub mod annotate;
pub mod error;
pub mod models;
pub mod navigation;
pub mod preferences;
pub mod read_aloud;
pub mod selection;
pub mod store;
