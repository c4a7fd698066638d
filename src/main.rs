//! # Lectio CLI (`lectio`)
//!
//! The `lectio` binary reads scripture from a configured content source and
//! keeps bookmarks, highlights, and notes in a local SQLite database. The
//! reading position and display settings persist in a preference file, so
//! each command picks up where the previous one left off.
//!
//! ## Usage
//!
//! ```bash
//! lectio --config ./config/lectio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lectio init` | Create the annotation database |
//! | `lectio translations [--all]` | List translations (favorites only by default) |
//! | `lectio books [--testament old\|new]` | List books of the current translation |
//! | `lectio show` | Print the current chapter with annotations |
//! | `lectio goto <book> <chapter>` | Jump to a chapter |
//! | `lectio next` / `lectio prev` | Step one chapter |
//! | `lectio bookmark <verses..>` | Toggle bookmarks |
//! | `lectio highlight <color> <verses..>` | Highlight verses |
//! | `lectio unhighlight <verse>` | Remove a highlight |
//! | `lectio note <verse> [text]` | Save a note (no text deletes it) |
//! | `lectio saved [kind]` | List saved items |
//! | `lectio delete <kind> <id>` | Delete a saved item |
//! | `lectio settings ...` | Show or change preferences |
//! | `lectio read` | Read the current chapter aloud |
//!
//! Logging goes to stderr and is controlled by `LECTIO_LOG` (or
//! `RUST_LOG`), e.g. `LECTIO_LOG=lectio=debug`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lectio::annotator::SavedKind;
use lectio::config;
use lectio::settings::SettingsAction;
use lectio::{mark, migrate, navigate, read_cmd, saved, settings, show};
use lectio_core::models::{HighlightColor, Testament};

/// Lectio: a local-first scripture reader.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lectio.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lectio",
    about = "Lectio: a local-first scripture reader with bookmarks, highlights, notes, and read-aloud",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lectio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the annotation database. Safe to run more than once.
    Init,

    /// List translations.
    ///
    /// Only favorites are listed when any are set, unless `--all` is given.
    /// The current translation is marked with `*`.
    Translations {
        #[arg(long)]
        all: bool,
    },

    /// List the books of the current translation.
    Books {
        /// Limit to one testament: `old` or `new`.
        #[arg(long)]
        testament: Option<Testament>,
    },

    /// Print the current chapter.
    ///
    /// Bookmarked verses are marked with `*`; highlights and notes are
    /// shown inline.
    Show,

    /// Jump to a book and chapter.
    Goto {
        /// Book id, e.g. `GEN` or `mat`.
        book: String,
        /// Chapter number, starting at 1.
        chapter: u32,
        /// Switch to this translation as well.
        #[arg(long)]
        translation: Option<String>,
    },

    /// Go to the next chapter, crossing into the next book.
    Next,

    /// Go to the previous chapter, crossing into the previous book.
    Prev,

    /// Toggle bookmarks on verses of the current chapter.
    Bookmark {
        #[arg(required = true)]
        verses: Vec<u32>,
    },

    /// Highlight verses of the current chapter.
    Highlight {
        /// `yellow`, `green`, `pink`, or `blue`.
        color: HighlightColor,
        #[arg(required = true)]
        verses: Vec<u32>,
    },

    /// Remove the highlight from a verse of the current chapter.
    Unhighlight { verse: u32 },

    /// Save a note on a verse. Omit the text to delete the note.
    Note {
        verse: u32,
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// List saved bookmarks, highlights, and notes.
    Saved {
        #[arg(value_enum)]
        kind: Option<SavedKind>,
    },

    /// Delete a saved item by id.
    Delete {
        #[arg(value_enum)]
        kind: SavedKind,
        id: i64,
    },

    /// Show or change preferences.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Read the current chapter aloud.
    Read {
        /// Speed multiplier; defaults to the saved TTS rate.
        #[arg(long)]
        rate: Option<f32>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("LECTIO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Translations { all } => {
            navigate::run_translations(&cfg, all).await?;
        }
        Commands::Books { testament } => {
            navigate::run_books(&cfg, testament).await?;
        }
        Commands::Show => {
            show::run_show(&cfg).await?;
        }
        Commands::Goto {
            book,
            chapter,
            translation,
        } => {
            navigate::run_goto(&cfg, &book, chapter, translation).await?;
        }
        Commands::Next => {
            navigate::run_next(&cfg).await?;
        }
        Commands::Prev => {
            navigate::run_prev(&cfg).await?;
        }
        Commands::Bookmark { verses } => {
            mark::run_bookmark(&cfg, &verses).await?;
        }
        Commands::Highlight { color, verses } => {
            mark::run_highlight(&cfg, color, &verses).await?;
        }
        Commands::Unhighlight { verse } => {
            mark::run_unhighlight(&cfg, verse).await?;
        }
        Commands::Note { verse, text } => {
            mark::run_note(&cfg, verse, &text.join(" ")).await?;
        }
        Commands::Saved { kind } => {
            saved::run_saved(&cfg, kind).await?;
        }
        Commands::Delete { kind, id } => {
            saved::run_delete(&cfg, kind, id).await?;
        }
        Commands::Settings { action } => {
            settings::run_settings(&cfg, action).await?;
        }
        Commands::Read { rate } => {
            read_cmd::run_read(&cfg, rate).await?;
        }
    }

    Ok(())
}
