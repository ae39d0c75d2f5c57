//! Whole-workspace JSON export, import and reset.
//!
//! # Responsibility
//! - Serialize the four roster/task collections as one JSON document.
//! - Replace every collection from such a document atomically.
//!
//! # Invariants
//! - Import runs in one transaction: either all collections are replaced or
//!   none are.
//! - Imported references to missing records are dropped, not rejected.
//! - Accounts, the session token and settings are never part of a snapshot.

use crate::model::department::Department;
use crate::model::exemption::ExemptionType;
use crate::model::person::Person;
use crate::model::task::Task;
use crate::repo::department_repo::{
    insert_department, DepartmentRepository, SqliteDepartmentRepository,
};
use crate::repo::exemption_repo::{
    insert_exemption, ExemptionRepository, SqliteExemptionRepository,
};
use crate::repo::person_repo::{insert_person, PersonRepository, SqlitePersonRepository};
use crate::repo::task_repo::{insert_task, SqliteTaskRepository, TaskRepository};
use crate::repo::{retain_existing, row_exists, RepoError, RepoResult};
use log::{info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tables cleared by a reset, children first.
const COLLECTION_TABLES: [&str; 4] = ["tasks", "people", "departments", "exemptions"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSnapshot {
    pub departments: Vec<Department>,
    pub exemptions: Vec<ExemptionType>,
    pub people: Vec<Person>,
    pub tasks: Vec<Task>,
}

/// Counts of records written by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub departments: usize,
    pub exemptions: usize,
    pub people: usize,
    pub tasks: usize,
    /// Exemption and assignee references removed because their target was
    /// not part of the document.
    pub dropped_references: usize,
}

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    Repo(RepoError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid snapshot document: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub fn export_snapshot(conn: &Connection) -> RepoResult<DataSnapshot> {
    Ok(DataSnapshot {
        departments: SqliteDepartmentRepository::new(conn).list_departments()?,
        exemptions: SqliteExemptionRepository::new(conn).list_exemptions()?,
        people: SqlitePersonRepository::new(conn).list_people()?,
        tasks: SqliteTaskRepository::new(conn).list_tasks()?,
    })
}

/// Pretty-printed export document.
pub fn export_json(conn: &Connection) -> Result<String, SnapshotError> {
    let snapshot = export_snapshot(conn)?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    info!(
        "event=snapshot_export module=snapshot status=ok departments={} exemptions={} people={} tasks={}",
        snapshot.departments.len(),
        snapshot.exemptions.len(),
        snapshot.people.len(),
        snapshot.tasks.len()
    );
    Ok(json)
}

/// Replaces every collection with the snapshot contents.
pub fn import_snapshot(conn: &Connection, snapshot: &DataSnapshot) -> RepoResult<ImportReport> {
    let tx = conn.unchecked_transaction()?;
    clear_collections(&tx)?;

    let mut report = ImportReport::default();
    for exemption in &snapshot.exemptions {
        insert_exemption(&tx, exemption)?;
        report.exemptions += 1;
    }
    for department in &snapshot.departments {
        insert_department(&tx, department)?;
        report.departments += 1;
    }
    for person in &snapshot.people {
        let mut person = person.normalized();
        let kept = retain_existing(&tx, "exemptions", &person.exemption_ids)?;
        report.dropped_references += person.exemption_ids.len() - kept.len();
        person.exemption_ids = kept;
        insert_person(&tx, &person)?;
        report.people += 1;
    }
    for task in &snapshot.tasks {
        let mut task = task.normalized();
        let kept = retain_existing(&tx, "exemptions", &task.prohibited_exemption_ids)?;
        report.dropped_references += task.prohibited_exemption_ids.len() - kept.len();
        task.prohibited_exemption_ids = kept;
        if let Some(person_id) = task.assigned_person_id.as_deref() {
            if !row_exists(&tx, "people", person_id)? {
                task.assigned_person_id = None;
                report.dropped_references += 1;
            }
        }
        insert_task(&tx, &task)?;
        report.tasks += 1;
    }
    tx.commit()?;

    if report.dropped_references > 0 {
        warn!(
            "event=snapshot_import module=snapshot status=ok dropped_references={}",
            report.dropped_references
        );
    }
    info!(
        "event=snapshot_import module=snapshot status=ok departments={} exemptions={} people={} tasks={}",
        report.departments, report.exemptions, report.people, report.tasks
    );
    Ok(report)
}

/// Parses and imports an export document.
pub fn import_json(conn: &Connection, json: &str) -> Result<ImportReport, SnapshotError> {
    let snapshot: DataSnapshot = serde_json::from_str(json).map_err(|err| {
        warn!(
            "event=snapshot_import module=snapshot status=error error_code=invalid_json line={} column={}",
            err.line(),
            err.column()
        );
        err
    })?;
    Ok(import_snapshot(conn, &snapshot)?)
}

/// Deletes every department, exemption, person and task.
pub fn reset_data(conn: &Connection) -> RepoResult<()> {
    let tx = conn.unchecked_transaction()?;
    clear_collections(&tx)?;
    tx.commit()?;
    info!("event=data_reset module=snapshot status=ok");
    Ok(())
}

fn clear_collections(conn: &Connection) -> RepoResult<()> {
    for table in COLLECTION_TABLES {
        conn.execute(&format!("DELETE FROM {table};"), [])?;
    }
    Ok(())
}
