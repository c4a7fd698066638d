//! Wiring for one CLI invocation.
//!
//! A [`Session`] builds the content source named by the config, restores
//! preferences, and positions a [`Reader`] at the saved location. Commands
//! that touch annotations open the SQLite store on top with
//! [`Session::annotator`].

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use lectio_core::preferences::Preferences;

use crate::annotator::Annotator;
use crate::config::Config;
use crate::db;
use crate::loader::{self, ContentLoader};
use crate::migrate;
use crate::observe::ObservedStore;
use crate::prefs::PreferenceFile;
use crate::reader::Reader;
use crate::sqlite_store::SqliteAnnotationStore;

pub struct Session {
    pub config: Config,
    pub prefs_file: PreferenceFile,
    pub prefs: Preferences,
    pub reader: Arc<Reader>,
}

impl Session {
    /// Load the saved location and its content.
    pub async fn open(config: &Config) -> Result<Self> {
        let session = Self::open_unloaded(config)?;
        session
            .reader
            .init()
            .await
            .with_context(|| format!("Failed to load {}", session.prefs.location()))?;
        Ok(session)
    }

    /// Restore preferences and position the reader without loading any
    /// content. Commands that move away from the saved location, or never
    /// read it, start here.
    pub fn open_unloaded(config: &Config) -> Result<Self> {
        let source = loader::source_from_config(config)?;
        let loader = Arc::new(ContentLoader::new(source));
        let prefs_file = PreferenceFile::from_config(config);
        let prefs = prefs_file.load();
        let reader = Arc::new(Reader::new(loader, prefs.location()));

        Ok(Self {
            config: config.clone(),
            prefs_file,
            prefs,
            reader,
        })
    }

    /// Load the translation list and metadata for the saved location,
    /// falling back to metadata alone when the saved chapter cannot be
    /// loaded.
    pub async fn open_with_meta(config: &Config) -> Result<Self> {
        let session = Self::open_unloaded(config)?;
        if let Err(err) = session.reader.init().await {
            tracing::warn!(error = %err, "saved location unavailable, loading metadata only");
            let location = session.prefs.location();
            session
                .reader
                .load_meta()
                .await
                .with_context(|| format!("Failed to load {}", location.translation_id))?;
        }
        Ok(session)
    }

    /// Open the annotation database (migrating it if needed) and build an
    /// annotator over the current chapter.
    pub async fn annotator(&self) -> Result<(Annotator, SqlitePool)> {
        let pool = open_store(&self.config).await?;
        let store = ObservedStore::new(Arc::new(SqliteAnnotationStore::new(pool.clone())));
        Ok((Annotator::new(self.reader.clone(), Arc::new(store)), pool))
    }

    /// Match `id` against the translation list, ignoring ASCII case, and
    /// return the listed spelling.
    pub async fn resolve_translation(&self, id: &str) -> Result<String> {
        let translations = self.reader.loader().list_translations().await?;
        match translations.iter().find(|t| t.id.eq_ignore_ascii_case(id)) {
            Some(t) => Ok(t.id.clone()),
            None => anyhow::bail!(
                "Unknown translation '{}' (available: {})",
                id,
                translations
                    .iter()
                    .map(|t| t.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Remember the reader's location for the next run.
    pub fn persist_location(&mut self) -> Result<()> {
        let location = self.reader.location();
        if location == self.prefs.location() {
            return Ok(());
        }
        self.prefs.set_location(&location);
        self.prefs_file.save(&self.prefs)
    }
}

pub async fn open_store(config: &Config) -> Result<SqlitePool> {
    let pool = db::connect(config)
        .await
        .with_context(|| format!("Failed to open {}", config.db.path.display()))?;
    migrate::migrate_pool(&pool).await?;
    Ok(pool)
}
