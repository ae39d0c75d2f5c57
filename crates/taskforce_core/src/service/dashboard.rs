//! Dashboard statistics.
//!
//! Pure aggregation over already loaded collections. People or tasks that
//! point at a deleted department are left out of the per-department rows.

use crate::model::department::Department;
use crate::model::person::Person;
use crate::model::task::{Status, Task};
use crate::model::RecordId;
use crate::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl TaskStatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::InProgress => self.in_progress,
            Status::Completed => self.completed,
            Status::Cancelled => self.cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.cancelled
    }

    fn bump(&mut self, status: Status) {
        match status {
            Status::Pending => self.pending += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Completed => self.completed += 1,
            Status::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentStats {
    pub department_id: RecordId,
    pub name: String,
    pub color_code: String,
    pub people: usize,
    /// Tasks assigned to members of the department.
    pub assigned_tasks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub people_total: usize,
    pub people_available: usize,
    pub tasks: TaskStatusCounts,
    pub departments: Vec<DepartmentStats>,
}

pub fn dashboard_stats(
    departments: &[Department],
    people: &[Person],
    tasks: &[Task],
) -> DashboardStats {
    let mut tasks_by_status = TaskStatusCounts::default();
    for task in tasks {
        tasks_by_status.bump(task.status);
    }

    let department_of: HashMap<&str, &str> = people
        .iter()
        .map(|person| (person.id.as_str(), person.department_id.as_str()))
        .collect();
    let mut assigned_by_department: HashMap<&str, usize> = HashMap::new();
    for task in tasks {
        let department = task
            .assigned_person_id
            .as_deref()
            .and_then(|person_id| department_of.get(person_id))
            .copied();
        if let Some(department) = department {
            *assigned_by_department.entry(department).or_default() += 1;
        }
    }

    let department_rows = departments
        .iter()
        .map(|department| DepartmentStats {
            department_id: department.id.clone(),
            name: department.name.clone(),
            color_code: department.color_code.clone(),
            people: people
                .iter()
                .filter(|person| person.department_id == department.id)
                .count(),
            assigned_tasks: assigned_by_department
                .get(department.id.as_str())
                .copied()
                .unwrap_or(0),
        })
        .collect();

    DashboardStats {
        people_total: people.len(),
        people_available: people.iter().filter(|person| person.available).count(),
        tasks: tasks_by_status,
        departments: department_rows,
    }
}

/// Loads every collection and aggregates it.
pub fn load_dashboard(conn: &Connection) -> RepoResult<DashboardStats> {
    let departments = SqliteDepartmentRepository::new(conn).list_departments()?;
    let people = SqlitePersonRepository::new(conn).list_people()?;
    let tasks = SqliteTaskRepository::new(conn).list_tasks()?;
    Ok(dashboard_stats(&departments, &people, &tasks))
}

#[cfg(test)]
mod tests {
    use super::dashboard_stats;
    use crate::model::department::Department;
    use crate::model::person::Person;
    use crate::model::task::{Status, Task};

    #[test]
    fn counts_ignore_unknown_departments() {
        let department = Department::new("מודיעין", "#F59E0B");
        let mut member = Person::new("יעל ישראלי", department.id.clone());
        member.available = false;
        let stray = Person::new("עומר רוזן", "deleted-department");

        let mut first = Task::new("תרגיל שטח", "2023-06-20");
        first.assigned_person_id = Some(member.id.clone());
        let mut second = Task::new("העברת ציוד", "2023-06-10");
        second.assigned_person_id = Some(stray.id.clone());
        second.status = Status::Cancelled;

        let stats = dashboard_stats(
            std::slice::from_ref(&department),
            &[member, stray],
            &[first, second],
        );

        assert_eq!(stats.people_total, 2);
        assert_eq!(stats.people_available, 1);
        assert_eq!(stats.tasks.get(Status::Pending), 1);
        assert_eq!(stats.tasks.get(Status::Cancelled), 1);
        assert_eq!(stats.tasks.total(), 2);
        assert_eq!(stats.departments.len(), 1);
        assert_eq!(stats.departments[0].people, 1);
        assert_eq!(stats.departments[0].assigned_tasks, 1);
    }
}
