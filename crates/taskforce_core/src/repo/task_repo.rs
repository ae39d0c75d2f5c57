//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks with their ordered skill and prohibited-exemption lists.
//!
//! # Invariants
//! - Task row and both link tables are replaced in one transaction.
//! - Assignee and prohibited exemption ids must reference existing rows.
//! - The repository does not check assignment eligibility; that rule lives
//!   in the task service.

use crate::model::task::{Priority, Status, Task};
use crate::repo::{
    count_rows, ensure_all_exist, load_links, replace_links, row_exists, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    assigned_person_id,
    status,
    priority,
    due_date,
    assigned_by_id
FROM tasks";

pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<()>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: &str) -> RepoResult<Option<Task>>;
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: &str) -> RepoResult<Option<Task>>;
    fn count_tasks(&self) -> RepoResult<u64>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_task(&tx, task)?;
        tx.commit()?;
        Ok(())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;
        let task = task.normalized();

        let tx = self.conn.unchecked_transaction()?;
        ensure_task_references(&tx, &task)?;
        let changed = tx.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                assigned_person_id = ?3,
                status = ?4,
                priority = ?5,
                due_date = ?6,
                assigned_by_id = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8;",
            params![
                task.title.trim(),
                task.description.as_str(),
                task.assigned_person_id.as_deref(),
                task.status.as_code(),
                task.priority.as_code(),
                task.due_date.as_str(),
                task.assigned_by_id.as_deref(),
                task.id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: "task",
                id: task.id.clone(),
            });
        }
        replace_task_links(&tx, &task)?;
        tx.commit()?;
        Ok(())
    }

    fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(self.conn, row)?);
        }
        Ok(tasks)
    }

    fn delete_task(&self, id: &str) -> RepoResult<Option<Task>> {
        let Some(existing) = self.get_task(id)? else {
            return Ok(None);
        };
        self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(Some(existing))
    }

    fn count_tasks(&self) -> RepoResult<u64> {
        count_rows(self.conn, "tasks")
    }
}

/// Inserts one task and its link rows. Runs inside the caller's transaction.
pub(crate) fn insert_task(conn: &Connection, task: &Task) -> RepoResult<()> {
    task.validate()?;
    let task = task.normalized();
    if row_exists(conn, "tasks", &task.id)? {
        return Err(RepoError::Duplicate {
            kind: "task",
            id: task.id.clone(),
        });
    }
    ensure_task_references(conn, &task)?;

    conn.execute(
        "INSERT INTO tasks (
            id,
            title,
            description,
            assigned_person_id,
            status,
            priority,
            due_date,
            assigned_by_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            task.id.as_str(),
            task.title.trim(),
            task.description.as_str(),
            task.assigned_person_id.as_deref(),
            task.status.as_code(),
            task.priority.as_code(),
            task.due_date.as_str(),
            task.assigned_by_id.as_deref(),
        ],
    )?;
    replace_task_links(conn, &task)
}

fn ensure_task_references(conn: &Connection, task: &Task) -> RepoResult<()> {
    if let Some(person_id) = task.assigned_person_id.as_deref() {
        if !row_exists(conn, "people", person_id)? {
            return Err(RepoError::MissingReference {
                kind: "person",
                id: person_id.to_string(),
            });
        }
    }
    ensure_all_exist(
        conn,
        "exemptions",
        "exemption",
        &task.prohibited_exemption_ids,
    )
}

fn replace_task_links(conn: &Connection, task: &Task) -> RepoResult<()> {
    replace_links(
        conn,
        "task_skills",
        "task_id",
        "skill",
        &task.id,
        &task.required_skills,
    )?;
    replace_links(
        conn,
        "task_prohibited_exemptions",
        "task_id",
        "exemption_id",
        &task.id,
        &task.prohibited_exemption_ids,
    )
}

fn parse_task_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Task> {
    let id: String = row.get("id")?;

    let status_code: String = row.get("status")?;
    let status = Status::parse_code(&status_code).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_code}` in tasks.status"))
    })?;
    let priority_code: String = row.get("priority")?;
    let priority = Priority::parse_code(&priority_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid task priority `{priority_code}` in tasks.priority"
        ))
    })?;

    let required_skills = load_links(conn, "task_skills", "task_id", "skill", &id)?;
    let prohibited_exemption_ids = load_links(
        conn,
        "task_prohibited_exemptions",
        "task_id",
        "exemption_id",
        &id,
    )?;

    Ok(Task {
        title: row.get("title")?,
        description: row.get("description")?,
        assigned_person_id: row.get("assigned_person_id")?,
        status,
        priority,
        required_skills,
        prohibited_exemption_ids,
        due_date: row.get("due_date")?,
        assigned_by_id: row.get("assigned_by_id")?,
        id,
    })
}
