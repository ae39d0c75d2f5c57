//! Department repository contract and SQLite implementation.

use crate::model::department::Department;
use crate::repo::{count_rows, row_exists, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const DEPARTMENT_SELECT_SQL: &str = "SELECT id, name, color_code FROM departments";

/// Repository interface for department CRUD operations.
pub trait DepartmentRepository {
    fn create_department(&self, department: &Department) -> RepoResult<()>;
    fn update_department(&self, department: &Department) -> RepoResult<()>;
    fn get_department(&self, id: &str) -> RepoResult<Option<Department>>;
    fn list_departments(&self) -> RepoResult<Vec<Department>>;
    /// Removes a department that has no members.
    fn delete_department(&self, id: &str) -> RepoResult<Option<Department>>;
    fn count_departments(&self) -> RepoResult<u64>;
    fn count_members(&self, id: &str) -> RepoResult<u64>;
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(&self, department: &Department) -> RepoResult<()> {
        insert_department(self.conn, department)
    }

    fn update_department(&self, department: &Department) -> RepoResult<()> {
        department.validate()?;

        let changed = self.conn.execute(
            "UPDATE departments
             SET
                name = ?1,
                color_code = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![
                department.name.trim(),
                department.color_code.as_str(),
                department.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: "department",
                id: department.id.clone(),
            });
        }
        Ok(())
    }

    fn get_department(&self, id: &str) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                &format!("{DEPARTMENT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_department_row,
            )
            .optional()?;
        Ok(department)
    }

    fn list_departments(&self) -> RepoResult<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DEPARTMENT_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let rows = stmt.query_map([], parse_department_row)?;
        let mut departments = Vec::new();
        for department in rows {
            departments.push(department?);
        }
        Ok(departments)
    }

    fn delete_department(&self, id: &str) -> RepoResult<Option<Department>> {
        let Some(existing) = self.get_department(id)? else {
            return Ok(None);
        };
        let holders = self.count_members(id)?;
        if holders > 0 {
            return Err(RepoError::InUse {
                kind: "department",
                id: id.to_string(),
                holders,
            });
        }
        self.conn
            .execute("DELETE FROM departments WHERE id = ?1;", [id])?;
        Ok(Some(existing))
    }

    fn count_departments(&self) -> RepoResult<u64> {
        count_rows(self.conn, "departments")
    }

    fn count_members(&self, id: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM people WHERE department_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData("negative member count".to_string()))
    }
}

/// Inserts one department without opening a transaction.
pub(crate) fn insert_department(conn: &Connection, department: &Department) -> RepoResult<()> {
    department.validate()?;
    if row_exists(conn, "departments", &department.id)? {
        return Err(RepoError::Duplicate {
            kind: "department",
            id: department.id.clone(),
        });
    }

    conn.execute(
        "INSERT INTO departments (id, name, color_code) VALUES (?1, ?2, ?3);",
        params![
            department.id.as_str(),
            department.name.trim(),
            department.color_code.as_str(),
        ],
    )?;
    Ok(())
}

fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        color_code: row.get("color_code")?,
    })
}
