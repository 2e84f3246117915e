//! Whitelist document repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::gateway::{GatewayFuture, WhitelistSource};
use crate::models::whitelist::Whitelist;
use crate::{AppError, EventError, EventResult, Result};

use super::db::Database;

const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Stored document plus its last modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredWhitelist {
    /// Parsed document.
    pub whitelist: Whitelist,
    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    document: String,
    updated_at: String,
}

/// Repository for the whitelist document of one collection.
#[derive(Clone)]
pub struct WhitelistRepo {
    db: Arc<Database>,
    collection: String,
}

impl WhitelistRepo {
    /// Create a repository bound to `collection`.
    #[must_use]
    pub fn new(db: Arc<Database>, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }

    /// Collection this repository reads and writes.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Read the current document without any caching.
    ///
    /// Returns `Ok(None)` when the collection has no row, or when its
    /// document is JSON `null` or blank. Only the document column is read.
    ///
    /// # Errors
    ///
    /// - `EventError::Upstream` if the query fails.
    /// - `EventError::Configuration` if the stored document is not a JSON
    ///   object.
    pub async fn fetch(&self) -> EventResult<Option<Whitelist>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM whitelist_document WHERE collection = ?1")
                .bind(&self.collection)
                .fetch_optional(self.db.as_ref())
                .await
                .map_err(|err| EventError::Upstream(format!("whitelist query failed: {err}")))?;

        let Some(document) = document else {
            debug!(collection = %self.collection, "no whitelist document stored");
            return Ok(None);
        };
        Whitelist::from_document(&document)
    }

    /// Read the current document together with its timestamp.
    ///
    /// `Ok(None)` has the same meaning as for [`WhitelistRepo::fetch`].
    /// `updated_at` may be RFC 3339 or `SQLite`'s `YYYY-MM-DD HH:MM:SS`
    /// (`CURRENT_TIMESTAMP`), read as UTC.
    ///
    /// # Errors
    ///
    /// Same as [`WhitelistRepo::fetch`], plus `EventError::Configuration`
    /// for an unreadable `updated_at` column.
    pub async fn fetch_stored(&self) -> EventResult<Option<StoredWhitelist>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT document, updated_at FROM whitelist_document WHERE collection = ?1",
        )
        .bind(&self.collection)
        .fetch_optional(self.db.as_ref())
        .await
        .map_err(|err| EventError::Upstream(format!("whitelist query failed: {err}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(whitelist) = Whitelist::from_document(&row.document)? else {
            return Ok(None);
        };

        Ok(Some(StoredWhitelist {
            whitelist,
            updated_at: parse_updated_at(&row.updated_at)?,
        }))
    }

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if serialization or the upsert fails.
    pub async fn replace(&self, whitelist: &Whitelist) -> Result<()> {
        let document = whitelist
            .to_document()
            .map_err(|err| AppError::Db(format!("failed to serialize whitelist: {err}")))?;
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO whitelist_document (collection, document, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(collection) DO UPDATE SET
                 document = excluded.document,
                 updated_at = excluded.updated_at",
        )
        .bind(&self.collection)
        .bind(&document)
        .bind(&updated_at)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Delete the stored document entirely, leaving the collection absent.
    ///
    /// Returns `true` if a document existed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM whitelist_document WHERE collection = ?1")
            .bind(&self.collection)
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn parse_updated_at(raw: &str) -> EventResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP)
        .map(|naive| naive.and_utc())
        .map_err(|err| EventError::Configuration(format!("invalid updated_at {raw:?}: {err}")))
}

impl WhitelistSource for WhitelistRepo {
    fn fetch_whitelist(&self) -> GatewayFuture<'_, Option<Whitelist>> {
        Box::pin(self.fetch())
    }
}
