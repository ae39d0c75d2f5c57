//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-collection data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - A parent row and its link rows are written in one transaction.
//! - Lists come back in insertion order.
//! - Deleting a missing id is a silent no-op that returns `None`.
//! - Departments and exemptions that people still reference cannot be deleted.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::RecordId;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod department_repo;
pub mod exemption_repo;
pub mod kv_repo;
pub mod person_repo;
pub mod task_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Target record does not exist.
    NotFound { kind: &'static str, id: RecordId },
    /// Record links to an id that does not exist in the referenced collection.
    MissingReference { kind: &'static str, id: RecordId },
    /// Record id already exists.
    Duplicate { kind: &'static str, id: RecordId },
    /// Record is still referenced by `holders` people and cannot be removed.
    InUse {
        kind: &'static str,
        id: RecordId,
        holders: u64,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::MissingReference { kind, id } => {
                write!(f, "referenced {kind} does not exist: {id}")
            }
            Self::Duplicate { kind, id } => write!(f, "{kind} already exists: {id}"),
            Self::InUse { kind, id, holders } => {
                write!(f, "{kind} {id} is still assigned to {holders} people")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::MissingReference { .. } => None,
            Self::Duplicate { .. } => None,
            Self::InUse { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Returns whether a row with `id` exists in `table`.
///
/// `table` must be one of the crate's own table names, never user input.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Counts rows of one of the crate's own tables.
pub(crate) fn count_rows(conn: &Connection, table: &'static str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count in {table}")))
}

/// Replaces the ordered link list of one owner row.
///
/// Must run inside the caller's transaction.
pub(crate) fn replace_links(
    conn: &Connection,
    table: &'static str,
    owner_column: &'static str,
    value_column: &'static str,
    owner_id: &str,
    values: &[String],
) -> RepoResult<()> {
    conn.execute(
        &format!("DELETE FROM {table} WHERE {owner_column} = ?1;"),
        [owner_id],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} ({owner_column}, {value_column}, position) VALUES (?1, ?2, ?3);"
    ))?;
    for (position, value) in values.iter().enumerate() {
        stmt.execute(params![owner_id, value, position as i64])?;
    }
    Ok(())
}

/// Loads the ordered link list of one owner row.
pub(crate) fn load_links(
    conn: &Connection,
    table: &'static str,
    owner_column: &'static str,
    value_column: &'static str,
    owner_id: &str,
) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {value_column} FROM {table} WHERE {owner_column} = ?1 ORDER BY position ASC;"
    ))?;
    let rows = stmt.query_map([owner_id], |row| row.get::<_, String>(0))?;
    let mut values = Vec::new();
    for value in rows {
        values.push(value?);
    }
    Ok(values)
}

/// Fails with `MissingReference` for the first id absent from `table`.
pub(crate) fn ensure_all_exist(
    conn: &Connection,
    table: &'static str,
    kind: &'static str,
    ids: &[String],
) -> RepoResult<()> {
    for id in ids {
        if !row_exists(conn, table, id)? {
            return Err(RepoError::MissingReference {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(())
}

/// Keeps only the ids that exist in `table`, preserving order.
pub(crate) fn retain_existing(
    conn: &Connection,
    table: &'static str,
    ids: &[String],
) -> RepoResult<Vec<String>> {
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        if row_exists(conn, table, id)? {
            kept.push(id.clone());
        }
    }
    Ok(kept)
}
