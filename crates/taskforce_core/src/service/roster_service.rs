//! Roster use-case service: departments, exemption types and people.
//!
//! # Responsibility
//! - Forward roster CRUD to the repositories with normalization and logging.
//! - Compute the per-department and per-exemption counts shown on list cards.
//!
//! # Invariants
//! - A department with members cannot be deleted.
//! - An exemption held by any person cannot be deleted; an unheld one is
//!   stripped from every task's prohibited list.
//! - Deleting a person un-assigns their tasks.

use crate::model::department::Department;
use crate::model::exemption::ExemptionType;
use crate::model::person::Person;
use crate::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use crate::repo::exemption_repo::{ExemptionRepository, SqliteExemptionRepository};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use rusqlite::Connection;

/// Department card data: the record plus its head counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentSummary {
    pub department: Department,
    pub people_count: usize,
    /// Tasks whose assignee belongs to the department.
    pub task_count: usize,
}

/// Person detail view with resolved references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDetails {
    pub person: Person,
    /// `None` when the department id does not resolve, e.g. after an import.
    pub department: Option<Department>,
    pub exemptions: Vec<ExemptionType>,
}

pub struct RosterService<D, E, P, T>
where
    D: DepartmentRepository,
    E: ExemptionRepository,
    P: PersonRepository,
    T: TaskRepository,
{
    departments: D,
    exemptions: E,
    people: P,
    tasks: T,
}

pub type SqliteRosterService<'conn> = RosterService<
    SqliteDepartmentRepository<'conn>,
    SqliteExemptionRepository<'conn>,
    SqlitePersonRepository<'conn>,
    SqliteTaskRepository<'conn>,
>;

impl<'conn> SqliteRosterService<'conn> {
    pub fn sqlite(conn: &'conn Connection) -> Self {
        RosterService::new(
            SqliteDepartmentRepository::new(conn),
            SqliteExemptionRepository::new(conn),
            SqlitePersonRepository::new(conn),
            SqliteTaskRepository::new(conn),
        )
    }
}

impl<D, E, P, T> RosterService<D, E, P, T>
where
    D: DepartmentRepository,
    E: ExemptionRepository,
    P: PersonRepository,
    T: TaskRepository,
{
    pub fn new(departments: D, exemptions: E, people: P, tasks: T) -> Self {
        Self {
            departments,
            exemptions,
            people,
            tasks,
        }
    }

    pub fn list_departments(&self) -> RepoResult<Vec<Department>> {
        self.departments.list_departments()
    }

    pub fn get_department(&self, id: &str) -> RepoResult<Option<Department>> {
        self.departments.get_department(id)
    }

    pub fn add_department(&self, department: &Department) -> RepoResult<Department> {
        let department = trimmed_department(department);
        self.departments.create_department(&department)?;
        info!(
            "event=department_create module=roster status=ok department_id={}",
            department.id
        );
        Ok(department)
    }

    pub fn update_department(&self, department: &Department) -> RepoResult<Department> {
        let department = trimmed_department(department);
        self.departments.update_department(&department)?;
        info!(
            "event=department_update module=roster status=ok department_id={}",
            department.id
        );
        Ok(department)
    }

    /// Fails with `RepoError::InUse` while people still belong to it.
    pub fn delete_department(&self, id: &str) -> RepoResult<Option<Department>> {
        let removed = self
            .departments
            .delete_department(id)
            .inspect_err(log_refused_delete)?;
        if removed.is_some() {
            info!("event=department_delete module=roster status=ok department_id={id}");
        }
        Ok(removed)
    }

    /// Departments in list order with their people and task counts.
    pub fn department_summaries(&self) -> RepoResult<Vec<DepartmentSummary>> {
        let departments = self.departments.list_departments()?;
        let people = self.people.list_people()?;
        let tasks = self.tasks.list_tasks()?;

        Ok(departments
            .into_iter()
            .map(|department| {
                let members: Vec<&Person> = people
                    .iter()
                    .filter(|person| person.department_id == department.id)
                    .collect();
                let task_count = tasks
                    .iter()
                    .filter(|task| {
                        task.assigned_person_id.as_deref().is_some_and(|assignee| {
                            members.iter().any(|member| member.id == assignee)
                        })
                    })
                    .count();
                DepartmentSummary {
                    people_count: members.len(),
                    task_count,
                    department,
                }
            })
            .collect())
    }

    pub fn list_exemptions(&self) -> RepoResult<Vec<ExemptionType>> {
        self.exemptions.list_exemptions()
    }

    pub fn get_exemption(&self, id: &str) -> RepoResult<Option<ExemptionType>> {
        self.exemptions.get_exemption(id)
    }

    pub fn add_exemption(&self, exemption: &ExemptionType) -> RepoResult<ExemptionType> {
        let exemption = trimmed_exemption(exemption);
        self.exemptions.create_exemption(&exemption)?;
        info!(
            "event=exemption_create module=roster status=ok exemption_id={}",
            exemption.id
        );
        Ok(exemption)
    }

    pub fn update_exemption(&self, exemption: &ExemptionType) -> RepoResult<ExemptionType> {
        let exemption = trimmed_exemption(exemption);
        self.exemptions.update_exemption(&exemption)?;
        info!(
            "event=exemption_update module=roster status=ok exemption_id={}",
            exemption.id
        );
        Ok(exemption)
    }

    /// Fails with `RepoError::InUse` while any person holds it.
    pub fn delete_exemption(&self, id: &str) -> RepoResult<Option<ExemptionType>> {
        let removed = self
            .exemptions
            .delete_exemption(id)
            .inspect_err(log_refused_delete)?;
        if removed.is_some() {
            info!("event=exemption_delete module=roster status=ok exemption_id={id}");
        }
        Ok(removed)
    }

    /// Number of people currently holding the exemption.
    pub fn exemption_holder_count(&self, id: &str) -> RepoResult<u64> {
        self.exemptions.count_holders(id)
    }

    pub fn list_people(&self) -> RepoResult<Vec<Person>> {
        self.people.list_people()
    }

    pub fn get_person(&self, id: &str) -> RepoResult<Option<Person>> {
        self.people.get_person(id)
    }

    pub fn add_person(&self, person: &Person) -> RepoResult<Person> {
        let person = person.normalized();
        self.people.create_person(&person)?;
        info!(
            "event=person_create module=roster status=ok person_id={} exemptions={}",
            person.id,
            person.exemption_ids.len()
        );
        Ok(person)
    }

    /// Saves a person. Existing task assignments are kept even when the new
    /// exemption list conflicts with them.
    pub fn update_person(&self, person: &Person) -> RepoResult<Person> {
        let person = person.normalized();
        self.people.update_person(&person)?;
        info!(
            "event=person_update module=roster status=ok person_id={} exemptions={}",
            person.id,
            person.exemption_ids.len()
        );
        Ok(person)
    }

    pub fn delete_person(&self, id: &str) -> RepoResult<Option<Person>> {
        let removed = self.people.delete_person(id)?;
        if removed.is_some() {
            info!("event=person_delete module=roster status=ok person_id={id}");
        }
        Ok(removed)
    }

    /// Person with their department and exemption records resolved.
    ///
    /// Exemption ids with no matching record are skipped.
    pub fn person_details(&self, id: &str) -> RepoResult<Option<PersonDetails>> {
        let Some(person) = self.people.get_person(id)? else {
            return Ok(None);
        };
        let department = self.departments.get_department(&person.department_id)?;
        let mut exemptions = Vec::with_capacity(person.exemption_ids.len());
        for exemption_id in &person.exemption_ids {
            if let Some(exemption) = self.exemptions.get_exemption(exemption_id)? {
                exemptions.push(exemption);
            }
        }
        Ok(Some(PersonDetails {
            person,
            department,
            exemptions,
        }))
    }
}

fn log_refused_delete(err: &RepoError) {
    if let RepoError::InUse { kind, id, holders } = err {
        warn!(
            "event={kind}_delete module=roster status=refused {kind}_id={id} holders={holders}"
        );
    }
}

fn trimmed_department(department: &Department) -> Department {
    Department {
        id: department.id.clone(),
        name: department.name.trim().to_string(),
        color_code: department.color_code.trim().to_string(),
    }
}

fn trimmed_exemption(exemption: &ExemptionType) -> ExemptionType {
    ExemptionType {
        id: exemption.id.clone(),
        name: exemption.name.trim().to_string(),
        description: exemption.description.trim().to_string(),
    }
}
