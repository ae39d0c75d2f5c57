//! Demo data and default accounts for a fresh workspace.
//!
//! # Invariants
//! - A collection is seeded only when it is empty; existing data is never
//!   overwritten.
//! - Seeding order follows references: exemptions, departments, people,
//!   tasks.

use crate::model::department::Department;
use crate::model::exemption::ExemptionType;
use crate::model::person::Person;
use crate::model::task::{Priority, Status, Task};
use crate::model::user::{User, UserRole};
use crate::repo::department_repo::insert_department;
use crate::repo::exemption_repo::insert_exemption;
use crate::repo::person_repo::insert_person;
use crate::repo::task_repo::insert_task;
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{count_rows, retain_existing, row_exists, RepoResult};
use crate::service::auth_service::new_credentials;
use log::info;
use rusqlite::Connection;

/// Number of records inserted per collection by one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub departments: usize,
    pub exemptions: usize,
    pub people: usize,
    pub tasks: usize,
    pub users: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.departments + self.exemptions + self.people + self.tasks + self.users
    }
}

/// Seeds every empty collection and the account table.
pub fn seed_workspace(conn: &Connection) -> RepoResult<SeedReport> {
    let mut report = seed_demo_data(conn)?;
    report.users = seed_default_users(conn)?;
    Ok(report)
}

/// Fills empty roster/task collections with the demo data set.
pub fn seed_demo_data(conn: &Connection) -> RepoResult<SeedReport> {
    let tx = conn.unchecked_transaction()?;
    let mut report = SeedReport::default();

    if count_rows(&tx, "exemptions")? == 0 {
        for exemption in initial_exemptions() {
            insert_exemption(&tx, &exemption)?;
            report.exemptions += 1;
        }
    }
    if count_rows(&tx, "departments")? == 0 {
        for department in initial_departments() {
            insert_department(&tx, &department)?;
            report.departments += 1;
        }
    }
    if count_rows(&tx, "people")? == 0 {
        for mut person in initial_people() {
            // Exemptions may have been edited away before people were seeded.
            person.exemption_ids = retain_existing(&tx, "exemptions", &person.exemption_ids)?;
            insert_person(&tx, &person)?;
            report.people += 1;
        }
    }
    if count_rows(&tx, "tasks")? == 0 {
        for mut task in initial_tasks() {
            task.prohibited_exemption_ids =
                retain_existing(&tx, "exemptions", &task.prohibited_exemption_ids)?;
            if let Some(person_id) = task.assigned_person_id.as_deref() {
                if !row_exists(&tx, "people", person_id)? {
                    task.assigned_person_id = None;
                }
            }
            insert_task(&tx, &task)?;
            report.tasks += 1;
        }
    }

    tx.commit()?;
    if report.total() > 0 {
        info!(
            "event=seed_demo module=seed status=ok departments={} exemptions={} people={} tasks={}",
            report.departments, report.exemptions, report.people, report.tasks
        );
    }
    Ok(report)
}

/// Creates the built-in accounts when the account table is empty.
///
/// Returns the number of accounts created.
pub fn seed_default_users(conn: &Connection) -> RepoResult<usize> {
    let repo = SqliteUserRepository::new(conn);
    if repo.count_users()? > 0 {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    let tx_repo = SqliteUserRepository::new(&tx);
    let accounts = default_accounts();
    for (user, password) in &accounts {
        tx_repo.create_user(&new_credentials(user.clone(), password))?;
    }
    tx.commit()?;
    info!(
        "event=seed_users module=seed status=ok count={}",
        accounts.len()
    );
    Ok(accounts.len())
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn default_accounts() -> Vec<(User, &'static str)> {
    [
        ("1", "Admin User", "admin@example.com", "admin123", UserRole::Admin),
        ("2", "Regular User", "user@example.com", "user123", UserRole::User),
        (
            "3",
            "System Administrator",
            "sysadmin@example.com",
            "sysadmin123",
            UserRole::Admin,
        ),
        (
            "4",
            "Task Force Commander",
            "commander@taskforce.com",
            "commander123",
            UserRole::Admin,
        ),
    ]
    .into_iter()
    .map(|(id, name, email, password, role)| {
        (
            User {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                role,
            },
            password,
        )
    })
    .collect()
}

pub fn initial_departments() -> Vec<Department> {
    [
        ("1", "גדוד 123", "#3B82F6"),
        ("2", "פלוגה א", "#10B981"),
        ("3", "מודיעין", "#F59E0B"),
        ("4", "לוגיסטיקה", "#6366F1"),
    ]
    .into_iter()
    .map(|(id, name, color_code)| Department {
        id: id.to_string(),
        name: name.to_string(),
        color_code: color_code.to_string(),
    })
    .collect()
}

pub fn initial_exemptions() -> Vec<ExemptionType> {
    [
        ("1", "פרופיל 21", "פטור מרימת משקל מעל 10 ק\"ג"),
        ("2", "פרופיל 24", "פטור מפעילות גופנית מאומצת"),
        ("3", "פרופיל 45", "פטור מתורנויות לילה"),
        ("4", "פרופיל 64", "פטור מפעילות בשטח"),
    ]
    .into_iter()
    .map(|(id, name, description)| ExemptionType {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    })
    .collect()
}

pub fn initial_people() -> Vec<Person> {
    let rows: [(&str, &str, &str, &str, &str, bool, &str, &[&str]); 4] = [
        (
            "1",
            "דניאל כהן",
            "daniel@example.com",
            "054-1234567",
            "1",
            true,
            "מיכל כהן, 052-7654321",
            &[],
        ),
        (
            "2",
            "גל לוי",
            "gal@example.com",
            "052-2345678",
            "2",
            true,
            "רון לוי, 053-8765432",
            &["1"],
        ),
        (
            "3",
            "יעל ישראלי",
            "yael@example.com",
            "053-3456789",
            "3",
            false,
            "דוד ישראלי, 054-9876543",
            &["3", "4"],
        ),
        (
            "4",
            "עומר רוזן",
            "omer@example.com",
            "058-4567890",
            "4",
            true,
            "שירה רוזן, 050-1234567",
            &["2"],
        ),
    ];
    rows.into_iter()
        .map(
            |(id, name, email, phone, department_id, available, emergency_contact, exemptions)| {
                Person {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: phone.to_string(),
                    department_id: department_id.to_string(),
                    available,
                    emergency_contact: emergency_contact.to_string(),
                    exemption_ids: ids(exemptions),
                    user_id: None,
                }
            },
        )
        .collect()
}

pub fn initial_tasks() -> Vec<Task> {
    vec![
        Task {
            id: "1".to_string(),
            title: "תורנות מטבח".to_string(),
            description: "תורנות במטבח הבסיס מ-8:00 עד 14:00".to_string(),
            assigned_person_id: Some("1".to_string()),
            status: Status::InProgress,
            priority: Priority::Medium,
            required_skills: ids(&["מיומנויות בסיסיות במטבח"]),
            prohibited_exemption_ids: ids(&["1"]),
            due_date: "2023-06-15".to_string(),
            assigned_by_id: None,
        },
        Task {
            id: "2".to_string(),
            title: "אבטחת שער".to_string(),
            description: "אבטחת שער הבסיס משמרת לילה".to_string(),
            assigned_person_id: Some("2".to_string()),
            status: Status::Pending,
            priority: Priority::High,
            required_skills: ids(&["הכשרת שמירה", "רישיון לנשק"]),
            prohibited_exemption_ids: ids(&["3"]),
            due_date: "2023-06-14".to_string(),
            assigned_by_id: None,
        },
        Task {
            id: "3".to_string(),
            title: "תרגיל שטח".to_string(),
            description: "תרגיל ניווט בשטח פתוח".to_string(),
            assigned_person_id: None,
            status: Status::Pending,
            priority: Priority::Urgent,
            required_skills: ids(&["ניווט", "כושר גופני"]),
            prohibited_exemption_ids: ids(&["2", "4"]),
            due_date: "2023-06-20".to_string(),
            assigned_by_id: None,
        },
        Task {
            id: "4".to_string(),
            title: "העברת ציוד".to_string(),
            description: "העברת ציוד צבאי ממחסן א למחסן ב".to_string(),
            assigned_person_id: Some("4".to_string()),
            status: Status::Completed,
            priority: Priority::Low,
            required_skills: Vec::new(),
            prohibited_exemption_ids: ids(&["1"]),
            due_date: "2023-06-10".to_string(),
            assigned_by_id: None,
        },
    ]
}
