//! Exemption type repository contract and SQLite implementation.
//!
//! # Invariants
//! - An exemption held by any person cannot be deleted (`RepoError::InUse`).
//! - Deleting an unheld exemption removes it from every task's prohibited
//!   list (link rows cascade).

use crate::model::exemption::ExemptionType;
use crate::repo::{count_rows, row_exists, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const EXEMPTION_SELECT_SQL: &str = "SELECT id, name, description FROM exemptions";

pub trait ExemptionRepository {
    fn create_exemption(&self, exemption: &ExemptionType) -> RepoResult<()>;
    fn update_exemption(&self, exemption: &ExemptionType) -> RepoResult<()>;
    fn get_exemption(&self, id: &str) -> RepoResult<Option<ExemptionType>>;
    fn list_exemptions(&self) -> RepoResult<Vec<ExemptionType>>;
    fn delete_exemption(&self, id: &str) -> RepoResult<Option<ExemptionType>>;
    fn count_exemptions(&self) -> RepoResult<u64>;
    /// Number of people currently holding the exemption.
    fn count_holders(&self, id: &str) -> RepoResult<u64>;
}

pub struct SqliteExemptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExemptionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ExemptionRepository for SqliteExemptionRepository<'_> {
    fn create_exemption(&self, exemption: &ExemptionType) -> RepoResult<()> {
        insert_exemption(self.conn, exemption)
    }

    fn update_exemption(&self, exemption: &ExemptionType) -> RepoResult<()> {
        exemption.validate()?;

        let changed = self.conn.execute(
            "UPDATE exemptions
             SET
                name = ?1,
                description = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![
                exemption.name.trim(),
                exemption.description.as_str(),
                exemption.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: "exemption",
                id: exemption.id.clone(),
            });
        }
        Ok(())
    }

    fn get_exemption(&self, id: &str) -> RepoResult<Option<ExemptionType>> {
        let exemption = self
            .conn
            .query_row(
                &format!("{EXEMPTION_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_exemption_row,
            )
            .optional()?;
        Ok(exemption)
    }

    fn list_exemptions(&self) -> RepoResult<Vec<ExemptionType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EXEMPTION_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let rows = stmt.query_map([], parse_exemption_row)?;
        let mut exemptions = Vec::new();
        for exemption in rows {
            exemptions.push(exemption?);
        }
        Ok(exemptions)
    }

    fn delete_exemption(&self, id: &str) -> RepoResult<Option<ExemptionType>> {
        let Some(existing) = self.get_exemption(id)? else {
            return Ok(None);
        };
        let holders = self.count_holders(id)?;
        if holders > 0 {
            return Err(RepoError::InUse {
                kind: "exemption",
                id: id.to_string(),
                holders,
            });
        }
        self.conn
            .execute("DELETE FROM exemptions WHERE id = ?1;", [id])?;
        Ok(Some(existing))
    }

    fn count_exemptions(&self) -> RepoResult<u64> {
        count_rows(self.conn, "exemptions")
    }

    fn count_holders(&self, id: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM person_exemptions WHERE exemption_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData("negative holder count".to_string()))
    }
}

pub(crate) fn insert_exemption(conn: &Connection, exemption: &ExemptionType) -> RepoResult<()> {
    exemption.validate()?;
    if row_exists(conn, "exemptions", &exemption.id)? {
        return Err(RepoError::Duplicate {
            kind: "exemption",
            id: exemption.id.clone(),
        });
    }

    conn.execute(
        "INSERT INTO exemptions (id, name, description) VALUES (?1, ?2, ?3);",
        params![
            exemption.id.as_str(),
            exemption.name.trim(),
            exemption.description.as_str(),
        ],
    )?;
    Ok(())
}

fn parse_exemption_row(row: &Row<'_>) -> rusqlite::Result<ExemptionType> {
    Ok(ExemptionType {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}
