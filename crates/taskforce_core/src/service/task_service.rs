//! Task use-case service.
//!
//! # Responsibility
//! - Provide task CRUD with the exemption eligibility rule applied on edit.
//! - Serve the assignee selector from the current draft of prohibited ids.
//!
//! # Invariants
//! - Create checks the assignee whenever one is set.
//! - Update checks the assignee only when the assignee or the prohibited
//!   list changed; untouched stale assignments are saved as they are.
//! - Stored tasks are never re-validated in the background.

use crate::eligibility::{
    assignment_conflicts, check_assignment, eligible_assignees, AssignmentConflict,
    AssignmentError,
};
use crate::model::person::Person;
use crate::model::task::Task;
use crate::model::RecordId;
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TaskServiceError {
    Assignment(AssignmentError),
    TaskNotFound(RecordId),
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assignment(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Assignment(err) => Some(err),
            Self::TaskNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind: "task", id } => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<AssignmentError> for TaskServiceError {
    fn from(value: AssignmentError) -> Self {
        Self::Assignment(value)
    }
}

pub struct TaskService<T: TaskRepository, P: PersonRepository> {
    tasks: T,
    people: P,
}

/// Task service bound to one SQLite connection.
pub type SqliteTaskService<'conn> =
    TaskService<SqliteTaskRepository<'conn>, SqlitePersonRepository<'conn>>;

impl<'conn> SqliteTaskService<'conn> {
    pub fn sqlite(conn: &'conn Connection) -> Self {
        TaskService::new(
            SqliteTaskRepository::new(conn),
            SqlitePersonRepository::new(conn),
        )
    }
}

impl<T: TaskRepository, P: PersonRepository> TaskService<T, P> {
    pub fn new(tasks: T, people: P) -> Self {
        Self { tasks, people }
    }

    pub fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.tasks.list_tasks()
    }

    pub fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        self.tasks.get_task(id)
    }

    /// Adds a task after checking its assignee against the roster.
    pub fn add_task(&self, task: &Task) -> Result<Task, TaskServiceError> {
        let task = task.normalized();
        if task.assigned_person_id.is_some() {
            let people = self.people.list_people()?;
            if let Err(err) = check_assignment(&task, &people) {
                warn!(
                    "event=task_create module=task status=error task_id={} error_code=assignment_rejected",
                    task.id
                );
                return Err(err.into());
            }
        }

        self.tasks.create_task(&task)?;
        info!(
            "event=task_create module=task status=ok task_id={} assigned={}",
            task.id,
            task.assigned_person_id.is_some()
        );
        self.read_back(&task.id)
    }

    /// Replaces a stored task.
    pub fn update_task(&self, task: &Task) -> Result<Task, TaskServiceError> {
        let task = task.normalized();
        let stored = self
            .tasks
            .get_task(&task.id)?
            .ok_or_else(|| TaskServiceError::TaskNotFound(task.id.clone()))?;

        let assignment_touched = stored.assigned_person_id != task.assigned_person_id
            || stored.prohibited_exemption_ids != task.prohibited_exemption_ids;
        if assignment_touched && task.assigned_person_id.is_some() {
            let people = self.people.list_people()?;
            if let Err(err) = check_assignment(&task, &people) {
                warn!(
                    "event=task_update module=task status=error task_id={} error_code=assignment_rejected",
                    task.id
                );
                return Err(err.into());
            }
        }

        self.tasks.update_task(&task)?;
        info!("event=task_update module=task status=ok task_id={}", task.id);
        self.read_back(&task.id)
    }

    /// Sets or clears the assignee of a stored task.
    pub fn assign_task(
        &self,
        task_id: &str,
        person_id: Option<&str>,
        assigned_by_id: Option<&str>,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self
            .tasks
            .get_task(task_id)?
            .ok_or_else(|| TaskServiceError::TaskNotFound(task_id.to_string()))?;
        task.assigned_person_id = person_id.map(str::to_string);
        task.assigned_by_id = person_id.and(assigned_by_id).map(str::to_string);
        self.update_task(&task)
    }

    /// Deletes a task. Missing ids are a no-op returning `None`.
    pub fn delete_task(&self, id: &str) -> RepoResult<Option<Task>> {
        let removed = self.tasks.delete_task(id)?;
        if removed.is_some() {
            info!("event=task_delete module=task status=ok task_id={id}");
        }
        Ok(removed)
    }

    /// People the assignee selector should offer for a draft prohibited list.
    pub fn eligible_assignees(
        &self,
        prohibited_exemption_ids: &[RecordId],
    ) -> RepoResult<Vec<Person>> {
        let people = self.people.list_people()?;
        Ok(eligible_assignees(&people, prohibited_exemption_ids)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Stored assignments whose assignee now holds a prohibited exemption.
    pub fn assignment_conflicts(&self) -> RepoResult<Vec<AssignmentConflict>> {
        let tasks = self.tasks.list_tasks()?;
        let people = self.people.list_people()?;
        Ok(assignment_conflicts(&tasks, &people))
    }

    fn read_back(&self, id: &str) -> Result<Task, TaskServiceError> {
        self.tasks.get_task(id)?.ok_or_else(|| {
            TaskServiceError::Repo(RepoError::InvalidData(format!(
                "task `{id}` missing in read-back"
            )))
        })
    }
}
