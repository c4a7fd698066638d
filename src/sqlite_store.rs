//! SQLite-backed [`AnnotationStore`] implementation.
//!
//! Wraps a [`SqlitePool`] and maps each store method to a single statement
//! against the schema created by [`crate::migrate`]. Timestamps are stored
//! as unix milliseconds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use lectio_core::error::StorageError;
use lectio_core::models::{Bookmark, ChapterKey, Highlight, HighlightColor, Note, VerseLocator};
use lectio_core::store::{AnnotationStore, StoreResult, HIGHLIGHTS, NOTES};

/// SQLite implementation of the [`AnnotationStore`] trait.
pub struct SqliteAnnotationStore {
    pool: SqlitePool,
}

impl SqliteAnnotationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn query_err(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(e.to_string())
        }
        other => StorageError::Query(other.to_string()),
    }
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn row_locator(row: &SqliteRow) -> Result<VerseLocator, sqlx::Error> {
    Ok(VerseLocator {
        translation_id: row.try_get("translation_id")?,
        book_id: row.try_get("book_id")?,
        chapter: row.try_get::<i64, _>("chapter")? as u32,
        verse: row.try_get::<i64, _>("verse")? as u32,
    })
}

fn row_to_bookmark(row: &SqliteRow) -> StoreResult<Bookmark> {
    Ok(Bookmark {
        id: row.try_get("id").map_err(query_err)?,
        locator: row_locator(row).map_err(query_err)?,
        created_at: millis_to_datetime(row.try_get("created_at").map_err(query_err)?),
    })
}

fn row_to_highlight(row: &SqliteRow) -> StoreResult<Highlight> {
    let color: String = row.try_get("color").map_err(query_err)?;
    Ok(Highlight {
        id: row.try_get("id").map_err(query_err)?,
        locator: row_locator(row).map_err(query_err)?,
        color: color.parse().map_err(StorageError::Query)?,
    })
}

fn row_to_note(row: &SqliteRow) -> StoreResult<Note> {
    Ok(Note {
        id: row.try_get("id").map_err(query_err)?,
        locator: row_locator(row).map_err(query_err)?,
        text: row.try_get("text").map_err(query_err)?,
        updated_at: millis_to_datetime(row.try_get("updated_at").map_err(query_err)?),
    })
}

const LOCATOR_FILTER: &str =
    "translation_id = ? AND book_id = ? AND chapter = ? AND verse = ? ORDER BY id LIMIT 1";
const CHAPTER_FILTER: &str = "translation_id = ? AND book_id = ? AND chapter = ? ORDER BY verse, id";

#[async_trait]
impl AnnotationStore for SqliteAnnotationStore {
    async fn find_bookmark(&self, locator: &VerseLocator) -> StoreResult<Option<Bookmark>> {
        let sql = format!("SELECT * FROM bookmarks WHERE {}", LOCATOR_FILTER);
        let row = sqlx::query(&sql)
            .bind(&locator.translation_id)
            .bind(&locator.book_id)
            .bind(locator.chapter as i64)
            .bind(locator.verse as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;
        row.as_ref().map(row_to_bookmark).transpose()
    }

    async fn insert_bookmark(
        &self,
        locator: &VerseLocator,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Bookmark> {
        let result = sqlx::query(
            "INSERT INTO bookmarks (translation_id, book_id, chapter, verse, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&locator.translation_id)
        .bind(&locator.book_id)
        .bind(locator.chapter as i64)
        .bind(locator.verse as i64)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(Bookmark {
            id: result.last_insert_rowid(),
            locator: locator.clone(),
            created_at: millis_to_datetime(created_at.timestamp_millis()),
        })
    }

    async fn delete_bookmark(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn chapter_bookmarks(&self, key: &ChapterKey) -> StoreResult<Vec<Bookmark>> {
        let sql = format!("SELECT * FROM bookmarks WHERE {}", CHAPTER_FILTER);
        let rows = sqlx::query(&sql)
            .bind(&key.translation_id)
            .bind(&key.book_id)
            .bind(key.chapter as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_bookmark).collect()
    }

    async fn list_bookmarks(&self) -> StoreResult<Vec<Bookmark>> {
        let rows = sqlx::query("SELECT * FROM bookmarks ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_bookmark).collect()
    }

    async fn find_highlight(&self, locator: &VerseLocator) -> StoreResult<Option<Highlight>> {
        let sql = format!("SELECT * FROM highlights WHERE {}", LOCATOR_FILTER);
        let row = sqlx::query(&sql)
            .bind(&locator.translation_id)
            .bind(&locator.book_id)
            .bind(locator.chapter as i64)
            .bind(locator.verse as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;
        row.as_ref().map(row_to_highlight).transpose()
    }

    async fn insert_highlight(
        &self,
        locator: &VerseLocator,
        color: HighlightColor,
    ) -> StoreResult<Highlight> {
        let result = sqlx::query(
            "INSERT INTO highlights (translation_id, book_id, chapter, verse, color) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&locator.translation_id)
        .bind(&locator.book_id)
        .bind(locator.chapter as i64)
        .bind(locator.verse as i64)
        .bind(color.as_str())
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(Highlight {
            id: result.last_insert_rowid(),
            locator: locator.clone(),
            color,
        })
    }

    async fn update_highlight_color(&self, id: i64, color: HighlightColor) -> StoreResult<()> {
        let result = sqlx::query("UPDATE highlights SET color = ? WHERE id = ?")
            .bind(color.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                table: HIGHLIGHTS,
                id,
            });
        }
        Ok(())
    }

    async fn delete_highlight(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_highlights_at(&self, locator: &VerseLocator) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM highlights WHERE translation_id = ? AND book_id = ? AND chapter = ? AND verse = ?",
        )
        .bind(&locator.translation_id)
        .bind(&locator.book_id)
        .bind(locator.chapter as i64)
        .bind(locator.verse as i64)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(result.rows_affected())
    }

    async fn chapter_highlights(&self, key: &ChapterKey) -> StoreResult<Vec<Highlight>> {
        let sql = format!("SELECT * FROM highlights WHERE {}", CHAPTER_FILTER);
        let rows = sqlx::query(&sql)
            .bind(&key.translation_id)
            .bind(&key.book_id)
            .bind(key.chapter as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_highlight).collect()
    }

    async fn list_highlights(&self) -> StoreResult<Vec<Highlight>> {
        let rows = sqlx::query("SELECT * FROM highlights ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_highlight).collect()
    }

    async fn find_note(&self, locator: &VerseLocator) -> StoreResult<Option<Note>> {
        let sql = format!("SELECT * FROM notes WHERE {}", LOCATOR_FILTER);
        let row = sqlx::query(&sql)
            .bind(&locator.translation_id)
            .bind(&locator.book_id)
            .bind(locator.chapter as i64)
            .bind(locator.verse as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;
        row.as_ref().map(row_to_note).transpose()
    }

    async fn insert_note(
        &self,
        locator: &VerseLocator,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Note> {
        let result = sqlx::query(
            "INSERT INTO notes (translation_id, book_id, chapter, verse, text, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&locator.translation_id)
        .bind(&locator.book_id)
        .bind(locator.chapter as i64)
        .bind(locator.verse as i64)
        .bind(text)
        .bind(updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(Note {
            id: result.last_insert_rowid(),
            locator: locator.clone(),
            text: text.to_string(),
            updated_at: millis_to_datetime(updated_at.timestamp_millis()),
        })
    }

    async fn update_note(
        &self,
        id: i64,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE notes SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(updated_at.timestamp_millis())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { table: NOTES, id });
        }
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn chapter_notes(&self, key: &ChapterKey) -> StoreResult<Vec<Note>> {
        let sql = format!("SELECT * FROM notes WHERE {}", CHAPTER_FILTER);
        let rows = sqlx::query(&sql)
            .bind(&key.translation_id)
            .bind(&key.book_id)
            .bind(key.chapter as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_note).collect()
    }

    async fn list_notes(&self) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query("SELECT * FROM notes ORDER BY updated_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.iter().map(row_to_note).collect()
    }
}
