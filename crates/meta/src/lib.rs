//! Metadata store for files uploaded to filebin.
//!
//! This crate persists and retrieves the records that describe uploaded
//! files (name, size, checksums, MIME type, download counters, lifecycle
//! timestamps). The bytes of the files themselves live elsewhere; only their
//! metadata is kept here.
//!
//! # Architecture
//! - [`Database`] owns the SQLite connection pool and runs the embedded
//!   migrations on connect.
//! - [`FileRepository`] issues one parameterized statement per operation and
//!   maps rows onto [`File`] models.
//! - Filenames are sanitized by [`validate_input`] before they are written.
//! - Every record handed out carries [`Derived`] display fields (readable
//!   size, relative times, [`Category`]) computed at read/write time.

mod db;
pub mod error;
pub mod humanize;
mod models;
mod repo;
mod validate;

pub use crate::db::Database;
pub use crate::models::{Category, Derived, File, NOT_AVAILABLE};
pub use crate::repo::FileRepository;
pub use crate::validate::{sanitize_filename, validate_input};
