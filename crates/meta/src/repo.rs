//! Repository for file metadata records.
//!
//! Every operation is a single statement against the store; nothing here
//! composes transactions. Consistency of each write is whatever the store
//! guarantees for one statement, which is enough for the one operation that
//! needs it: [`register_download`](FileRepository::register_download)
//! increments the counter inside the `UPDATE` itself.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{File, FileRow, now};
use crate::validate;
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// Classify a failed write: a uniqueness violation means the filename is
/// already taken in the bin, anything else is a store failure.
fn write_error<T>(result: &std::result::Result<T, sqlx::Error>) -> ErrorKind {
    match result {
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => ErrorKind::Conflict,
        _ => ErrorKind::Database,
    }
}

/// Map a fetched row onto the model and fill in its derived fields.
fn hydrate(row: FileRow, now: UtcDateTime, with_url: bool) -> Result<File> {
    let mut file = File::try_from(row)?;
    match with_url {
        true => file.derive_with_url(now),
        false => file.derive(now),
    }
    Ok(file)
}

/// Repository for reading and writing [`File`] records.
///
/// Holds nothing but a handle to the connection pool, so it can be cloned
/// freely and shared between tasks.
///
/// # Not found
///
/// Lookups by key return `Ok(None)` when nothing matches; listing operations
/// return an empty `Vec`. Operations that target a specific record
/// ([`update`](Self::update), [`delete`](Self::delete),
/// [`register_download`](Self::register_download)) fail with
/// [`ErrorKind::NotFound`] instead.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}
impl From<&Database> for FileRepository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl FileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Sanitize the filename of `file` in place. See [`validate::validate_input`].
    pub fn validate_input(file: &mut File) -> Result<()> {
        validate::validate_input(file)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Get a file by its id.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<File>> {
        let row: Option<FileRow> = sqlx::query_as(include_str!("../queries/get_by_id.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let now = UtcDateTime::now();
        row.map(|row| hydrate(row, now, false)).transpose()
    }

    /// Get a file by its (unique) filename within a bin.
    ///
    /// The filename is matched exactly as stored, i.e. already sanitized.
    #[instrument(level = "debug", skip_all, fields(bin = bin.as_ref(), filename = filename.as_ref()))]
    pub async fn get_by_name(&self, bin: impl AsRef<str>, filename: impl AsRef<str>) -> Result<Option<File>> {
        let row: Option<FileRow> = sqlx::query_as(include_str!("../queries/get_by_name.sql"))
            .bind(bin.as_ref())
            .bind(filename.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let now = UtcDateTime::now();
        row.map(|row| hydrate(row, now, false)).transpose()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List the files of a bin that have the given status, ordered by
    /// filename. Each file also gets its `url` populated.
    #[instrument(level = "debug", skip_all, fields(bin = bin.as_ref(), status = status))]
    pub async fn get_by_bin(&self, bin: impl AsRef<str>, status: i32) -> Result<Vec<File>> {
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/get_by_bin.sql"))
            .bind(bin.as_ref())
            .bind(i64::from(status))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let now = UtcDateTime::now();
        rows.into_iter().map(|row| hydrate(row, now, true)).collect()
    }

    /// List every file in the store, in no particular order.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_all(&self) -> Result<Vec<File>> {
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/get_all.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let now = UtcDateTime::now();
        rows.into_iter().map(|row| hydrate(row, now, false)).collect()
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a new file record.
    ///
    /// The filename is sanitized, empty provenance fields default to
    /// [`NOT_AVAILABLE`](crate::NOT_AVAILABLE), the counters and status are
    /// reset to zero, and both timestamps are stamped with the current time.
    /// On success `file` carries the id assigned by the store. On failure
    /// `file` is left exactly as it was passed in.
    ///
    /// Inserting a second file with the same filename into the same bin fails
    /// with [`ErrorKind::Conflict`].
    #[instrument(level = "debug", skip_all, fields(bin = %file.bin, filename = %file.filename))]
    pub async fn insert(&self, file: &mut File) -> Result<()> {
        let mut record = file.clone();
        validate::validate_input(&mut record)?;
        record.default_provenance();
        let now = now()?;
        record.status = 0;
        record.downloads = 0;
        record.updates = 0;
        record.created = now;
        record.updated = now;
        let row = FileRow::try_from(&record)?;
        let result: sqlx::Result<i64> = sqlx::query_scalar(include_str!("../queries/insert.sql"))
            .bind(row.bin_id)
            .bind(row.filename)
            .bind(row.status)
            .bind(row.mime)
            .bind(row.bytes)
            .bind(row.md5)
            .bind(row.sha256)
            .bind(row.downloads)
            .bind(row.updates)
            .bind(row.ip)
            .bind(row.trace)
            .bind(row.nonce)
            .bind(row.updated)
            .bind(row.created)
            .bind(row.deleted)
            .fetch_one(&self.pool)
            .await;
        let kind = write_error(&result);
        record.id = result.or_raise(|| kind)?;
        record.derive(now);
        tracing::debug!(id = record.id, "inserted file");
        *file = record;
        Ok(())
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Write the mutable fields of `file` back to the store and stamp
    /// `updated` with the current time.
    ///
    /// The filename is sanitized again first, so a rename can never bypass
    /// validation. `bin`, `created` and `downloads` are never written by this
    /// operation; `downloads` is instead refreshed from the store, since it may
    /// have been incremented since `file` was read. Renaming onto a filename
    /// already taken in the bin fails with [`ErrorKind::Conflict`].
    #[instrument(level = "debug", skip_all, fields(id = file.id))]
    pub async fn update(&self, file: &mut File) -> Result<()> {
        let mut record = file.clone();
        validate::validate_input(&mut record)?;
        let now = now()?;
        record.updated = now;
        let row = FileRow::try_from(&record)?;
        let result: sqlx::Result<Option<i64>> = sqlx::query_scalar(include_str!("../queries/update.sql"))
            .bind(row.filename)
            .bind(row.status)
            .bind(row.mime)
            .bind(row.bytes)
            .bind(row.md5)
            .bind(row.sha256)
            .bind(row.nonce)
            .bind(row.updates)
            .bind(row.updated)
            .bind(row.deleted)
            .bind(row.ip)
            .bind(row.trace)
            .bind(row.id)
            .fetch_optional(&self.pool)
            .await;
        let kind = write_error(&result);
        let Some(downloads) = result.or_raise(|| kind)? else {
            exn::bail!(ErrorKind::NotFound(record.id));
        };
        record.downloads = u64::try_from(downloads).or_raise(|| ErrorKind::InvalidData("downloads"))?;
        record.derive(now);
        *file = record;
        Ok(())
    }

    /// Mark a file as deleted without removing it, by stamping `deleted` with
    /// the current time and writing it through [`update`](Self::update).
    #[instrument(level = "debug", skip_all, fields(id = file.id))]
    pub async fn soft_delete(&self, file: &mut File) -> Result<()> {
        let mut record = file.clone();
        record.deleted = Some(now()?);
        self.update(&mut record).await?;
        *file = record;
        Ok(())
    }

    /// Atomically increment the download counter of a file, storing the new
    /// count in `file.downloads`.
    ///
    /// The increment happens inside the store, so concurrent downloads of the
    /// same file are never lost.
    #[instrument(level = "debug", skip_all, fields(id = file.id))]
    pub async fn register_download(&self, file: &mut File) -> Result<()> {
        let downloads: Option<i64> = sqlx::query_scalar(include_str!("../queries/register_download.sql"))
            .bind(file.id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(downloads) = downloads else {
            exn::bail!(ErrorKind::NotFound(file.id));
        };
        file.downloads = u64::try_from(downloads).or_raise(|| ErrorKind::InvalidData("downloads"))?;
        tracing::debug!(downloads = file.downloads, "registered download");
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Permanently remove a file record.
    #[instrument(level = "debug", skip_all, fields(id = file.id))]
    pub async fn delete(&self, file: &File) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/delete.sql"))
            .bind(file.id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(file.id));
        }
        tracing::debug!("deleted file");
        Ok(())
    }
}
