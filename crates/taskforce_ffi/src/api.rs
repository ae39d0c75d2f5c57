//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Collapse core errors into toast-ready envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own connection to the workspace DB; the first call
//!   in a process seeds empty collections.
//! - Session state lives in the DB (`authToken`), never in this layer.
//! - Deleting a missing record succeeds with empty toast texts.
//! - Deleting a department with members, or an exemption someone holds,
//!   fails with a message telling the user what to reassign first.

use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;
use taskforce_core::db::open_db;
use taskforce_core::service::dashboard::DepartmentStats;
use taskforce_core::service::roster_service::{DepartmentSummary, PersonDetails};
use taskforce_core::{
    apply_debug_mode, core_version as core_version_inner, export_json, import_json,
    init_logging as init_logging_inner, load_dashboard, new_record_id, ping as ping_inner,
    reset_data, resolve_db_path, seed_workspace, Access, AppSettings, AssignmentConflict,
    AuthService, Department, ExemptionType, PeopleFilter, Person, Priority, RegisterRequest,
    LogLevel, RepoError, RepoResult, SettingsService, SqliteKeyValueStore, SqliteRosterService,
    SqliteTaskService, SqliteUserRepository, Status, Task, TaskFilter, User, UserPatch, UserRole,
};

static WORKSPACE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static WORKSPACE_SEEDED: OnceLock<()> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Starts rolling file logs in `log_dir`.
///
/// Input semantics:
/// - `level`: `debug|info|warn|error` (case-insensitive), or empty to follow
///   the saved debug-mode setting.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `log_dir`; a new level replaces
///   the old one.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        let settings = with_workspace(|conn| {
            SettingsService::new(SqliteKeyValueStore::new(conn))
                .load()
                .map_err(|err| err.to_string())
        });
        Ok(LogLevel::for_debug_mode(
            settings.unwrap_or_default().is_debug_mode,
        ))
    } else {
        LogLevel::parse(&level)
    };
    match level.and_then(|level| init_logging_inner(level, log_dir.as_str())) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Toast envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created/updated/deleted record, when there is one.
    pub id: Option<String>,
    pub title: String,
    pub message: String,
}

impl ActionResponse {
    fn success(id: Option<String>, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            id,
            title: title.into(),
            message: message.into(),
        }
    }

    fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            title: title.into(),
            message: message.into(),
        }
    }

    fn silent() -> Self {
        Self::success(None, "", "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentItem {
    /// Empty for a record that has not been saved yet.
    pub id: String,
    pub name: String,
    pub color_code: String,
}

/// Department list card: the record plus its head counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentCardItem {
    pub department: DepartmentItem,
    pub people_count: u32,
    /// Tasks assigned to the department's members.
    pub task_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptionItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonItem {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department_id: String,
    pub available: bool,
    pub emergency_contact: String,
    pub exemption_ids: Vec<String>,
    pub user_id: Option<String>,
}

/// Person card with resolved references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDetailsItem {
    pub person: PersonItem,
    /// `None` when the person's department id does not resolve.
    pub department: Option<DepartmentItem>,
    pub exemptions: Vec<ExemptionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_person_id: Option<String>,
    /// Hebrew status label (`ממתין|בביצוע|הושלם|בוטל`).
    pub status: String,
    /// Hebrew priority label (`נמוכה|בינונית|גבוהה|דחופה`).
    pub priority: String,
    pub required_skills: Vec<String>,
    pub prohibited_exemption_ids: Vec<String>,
    /// `YYYY-MM-DD`.
    pub due_date: String,
    pub assigned_by_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentConflictItem {
    pub task_id: String,
    pub person_id: String,
    pub exemption_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub id: String,
    pub name: String,
    pub email: String,
    /// `ADMIN|SUPERVISOR|USER`.
    pub role: String,
}

/// Toast envelope for sign-in flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub ok: bool,
    pub user: Option<UserItem>,
    pub title: String,
    pub message: String,
}

impl AuthResponse {
    fn failure(title: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            user: None,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentStatsItem {
    pub department_id: String,
    pub name: String,
    pub color_code: String,
    pub people: u32,
    pub assigned_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub people_total: u32,
    pub people_available: u32,
    pub tasks_pending: u32,
    pub tasks_in_progress: u32,
    pub tasks_completed: u32,
    pub tasks_cancelled: u32,
    pub departments: Vec<DepartmentStatsItem>,
    /// Empty on success, diagnostic text on failure.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsItem {
    pub is_dark_mode: bool,
    pub is_debug_mode: bool,
    pub app_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    /// Effective settings after the call.
    pub settings: SettingsItem,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub json: String,
    pub message: String,
}

#[derive(Clone, Copy)]
enum Action {
    Add,
    Update,
    Delete,
}

impl Action {
    fn gerund(self) -> &'static str {
        match self {
            Self::Add => "הוספת",
            Self::Update => "עדכון",
            Self::Delete => "מחיקת",
        }
    }

    fn op(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Toast wording of one collection.
struct Wording {
    module: &'static str,
    noun: &'static str,
    definite: &'static str,
    added: &'static str,
    updated: &'static str,
    deleted: &'static str,
}

const DEPARTMENT_WORDING: Wording = Wording {
    module: "department",
    noun: "מדור",
    definite: "המדור",
    added: "נוסף",
    updated: "עודכן",
    deleted: "נמחק",
};

const EXEMPTION_WORDING: Wording = Wording {
    module: "exemption",
    noun: "פטור",
    definite: "הפטור",
    added: "נוסף",
    updated: "עודכן",
    deleted: "נמחק",
};

const PERSON_WORDING: Wording = Wording {
    module: "person",
    noun: "חייל",
    definite: "החייל",
    added: "נוסף",
    updated: "עודכן",
    deleted: "נמחק",
};

const DEPARTMENT_IN_USE: &str =
    "לא ניתן למחוק יחידה עם חיילים מוקצים. העבר את החיילים ליחידה אחרת קודם.";
const EXEMPTION_IN_USE: &str = "לא ניתן למחוק פטור שמוקצה לחיילים. הסר את הפטור מהחיילים קודם.";

const TASK_WORDING: Wording = Wording {
    module: "task",
    noun: "משימה",
    definite: "המשימה",
    added: "נוספה",
    updated: "עודכנה",
    deleted: "נמחקה",
};

impl Wording {
    fn verb(&self, action: Action) -> &'static str {
        match action {
            Action::Add => self.added,
            Action::Update => self.updated,
            Action::Delete => self.deleted,
        }
    }

    /// e.g. "משימה נוספה" / `המשימה "אבטחת שער" נוספה בהצלחה`.
    fn success(&self, action: Action, id: String, name: &str) -> ActionResponse {
        let verb = self.verb(action);
        ActionResponse::success(
            Some(id),
            format!("{} {verb}", self.noun),
            format!("{} \"{name}\" {verb} בהצלחה", self.definite),
        )
    }

    /// e.g. "שגיאה בהוספת משימה" / "אירעה שגיאה בהוספת המשימה. אנא נסה שנית."
    fn failure(&self, action: Action) -> ActionResponse {
        warn!(
            "event=ffi_call module={} op={} status=error",
            self.module,
            action.op()
        );
        ActionResponse::failure(
            format!("שגיאה ב{} {}", action.gerund(), self.noun),
            format!(
                "אירעה שגיאה ב{} {}. אנא נסה שנית.",
                action.gerund(),
                self.definite
            ),
        )
    }

    fn respond<T>(
        &self,
        action: Action,
        result: Result<Option<T>, String>,
        describe: impl FnOnce(&T) -> (String, String),
    ) -> ActionResponse {
        match result {
            Ok(Some(record)) => {
                let (id, name) = describe(&record);
                self.success(action, id, &name)
            }
            Ok(None) => ActionResponse::silent(),
            Err(_) => self.failure(action),
        }
    }

    /// Like `respond` for deletes, but a record still in use gets `in_use`
    /// as its message.
    fn respond_delete<T>(
        &self,
        result: Result<RepoResult<Option<T>>, String>,
        in_use: &str,
        describe: impl FnOnce(&T) -> (String, String),
    ) -> ActionResponse {
        match result {
            Ok(Err(RepoError::InUse { .. })) => {
                let mut response = self.failure(Action::Delete);
                response.message = in_use.to_string();
                response
            }
            Ok(outcome) => self.respond(
                Action::Delete,
                outcome.map_err(|err| err.to_string()),
                describe,
            ),
            Err(err) => self.respond(Action::Delete, Err(err), describe),
        }
    }
}

/// Opens the workspace DB and seeds it once per process.
///
/// # FFI contract
/// - Returns the effective DB path on success.
#[flutter_rust_bridge::frb(sync)]
pub fn workspace_bootstrap() -> ActionResponse {
    match with_workspace(|_| Ok(())) {
        Ok(()) => ActionResponse::success(
            None,
            "",
            workspace_db_path().display().to_string(),
        ),
        Err(err) => ActionResponse::failure("", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn department_list(term: Option<String>) -> Vec<DepartmentItem> {
    let term = term.unwrap_or_default();
    list_or_empty("department", |conn| {
        let departments = SqliteRosterService::sqlite(conn)
            .list_departments()
            .map_err(|err| err.to_string())?;
        Ok(taskforce_core::filter::filter_departments(&departments, &term)
            .into_iter()
            .map(department_item)
            .collect())
    })
}

/// Department cards with people and task counts, filtered like
/// `department_list`.
#[flutter_rust_bridge::frb(sync)]
pub fn department_cards(term: Option<String>) -> Vec<DepartmentCardItem> {
    let term = term.unwrap_or_default();
    list_or_empty("department", |conn| {
        let summaries = SqliteRosterService::sqlite(conn)
            .department_summaries()
            .map_err(|err| err.to_string())?;
        let departments: Vec<Department> = summaries
            .iter()
            .map(|summary| summary.department.clone())
            .collect();
        let shown: Vec<&str> = taskforce_core::filter::filter_departments(&departments, &term)
            .into_iter()
            .map(|department| department.id.as_str())
            .collect();
        Ok(summaries
            .iter()
            .filter(|summary| shown.contains(&summary.department.id.as_str()))
            .map(department_card_item)
            .collect())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn department_add(item: DepartmentItem) -> ActionResponse {
    let department = department_from_item(item);
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .add_department(&department)
            .map(Some)
            .map_err(|err| err.to_string())
    });
    DEPARTMENT_WORDING.respond(Action::Add, result, |saved| {
        (saved.id.clone(), saved.name.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn department_update(item: DepartmentItem) -> ActionResponse {
    let department = department_from_item(item);
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .update_department(&department)
            .map(Some)
            .map_err(|err| err.to_string())
    });
    DEPARTMENT_WORDING.respond(Action::Update, result, |saved| {
        (saved.id.clone(), saved.name.clone())
    })
}

/// Deletes a department. Fails while people still belong to it.
#[flutter_rust_bridge::frb(sync)]
pub fn department_delete(id: String) -> ActionResponse {
    let result = with_workspace(|conn| {
        let roster = SqliteRosterService::sqlite(conn);
        Ok(roster.delete_department(&id))
    });
    DEPARTMENT_WORDING.respond_delete(result, DEPARTMENT_IN_USE, |removed| {
        (removed.id.clone(), removed.name.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn exemption_list(term: Option<String>) -> Vec<ExemptionItem> {
    let term = term.unwrap_or_default();
    list_or_empty("exemption", |conn| {
        let exemptions = SqliteRosterService::sqlite(conn)
            .list_exemptions()
            .map_err(|err| err.to_string())?;
        Ok(taskforce_core::filter::filter_exemptions(&exemptions, &term)
            .into_iter()
            .map(exemption_item)
            .collect())
    })
}

/// Number of people holding the exemption; 0 on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn exemption_holder_count(id: String) -> u32 {
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .exemption_holder_count(&id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
        Err(_) => 0,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn exemption_add(item: ExemptionItem) -> ActionResponse {
    let exemption = exemption_from_item(item);
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .add_exemption(&exemption)
            .map(Some)
            .map_err(|err| err.to_string())
    });
    EXEMPTION_WORDING.respond(Action::Add, result, |saved| {
        (saved.id.clone(), saved.name.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn exemption_update(item: ExemptionItem) -> ActionResponse {
    let exemption = exemption_from_item(item);
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .update_exemption(&exemption)
            .map(Some)
            .map_err(|err| err.to_string())
    });
    EXEMPTION_WORDING.respond(Action::Update, result, |saved| {
        (saved.id.clone(), saved.name.clone())
    })
}

/// Deletes an exemption and strips it from every task's prohibited list.
/// Fails while any person holds it.
#[flutter_rust_bridge::frb(sync)]
pub fn exemption_delete(id: String) -> ActionResponse {
    let result = with_workspace(|conn| {
        let roster = SqliteRosterService::sqlite(conn);
        Ok(roster.delete_exemption(&id))
    });
    EXEMPTION_WORDING.respond_delete(result, EXEMPTION_IN_USE, |removed| {
        (removed.id.clone(), removed.name.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn person_list(
    term: Option<String>,
    department_id: Option<String>,
    available: Option<bool>,
) -> Vec<PersonItem> {
    let filter = PeopleFilter {
        term: term.unwrap_or_default(),
        department_id,
        available,
    };
    list_or_empty("person", |conn| {
        let people = SqliteRosterService::sqlite(conn)
            .list_people()
            .map_err(|err| err.to_string())?;
        Ok(filter.apply(&people).into_iter().map(person_item).collect())
    })
}

/// Person with department and exemptions resolved; `None` for an unknown id
/// or on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn person_details(id: String) -> Option<PersonDetailsItem> {
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .person_details(&id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(details) => details.map(person_details_item),
        Err(_) => {
            warn!("event=ffi_call module=person op=details status=error");
            None
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn person_add(item: PersonItem) -> ActionResponse {
    let person = person_from_item(item);
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .add_person(&person)
            .map(Some)
            .map_err(|err| err.to_string())
    });
    PERSON_WORDING.respond(Action::Add, result, |saved| {
        (saved.id.clone(), saved.name.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn person_update(item: PersonItem) -> ActionResponse {
    let person = person_from_item(item);
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .update_person(&person)
            .map(Some)
            .map_err(|err| err.to_string())
    });
    PERSON_WORDING.respond(Action::Update, result, |saved| {
        (saved.id.clone(), saved.name.clone())
    })
}

/// Deletes a person and un-assigns their tasks.
#[flutter_rust_bridge::frb(sync)]
pub fn person_delete(id: String) -> ActionResponse {
    let result = with_workspace(|conn| {
        SqliteRosterService::sqlite(conn)
            .delete_person(&id)
            .map_err(|err| err.to_string())
    });
    PERSON_WORDING.respond(Action::Delete, result, |removed| {
        (removed.id.clone(), removed.name.clone())
    })
}

/// Lists tasks. Unknown status or priority labels match nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(
    term: Option<String>,
    status: Option<String>,
    priority: Option<String>,
) -> Vec<TaskItem> {
    let parsed_status = status.as_deref().map(Status::parse_label);
    let parsed_priority = priority.as_deref().map(Priority::parse_label);
    let (Some(status), Some(priority)) = (
        parsed_status.map_or(Some(None), |value| value.map(Some)),
        parsed_priority.map_or(Some(None), |value| value.map(Some)),
    ) else {
        return Vec::new();
    };
    let filter = TaskFilter {
        term: term.unwrap_or_default(),
        status,
        priority,
    };
    list_or_empty("task", |conn| {
        let tasks = SqliteTaskService::sqlite(conn)
            .list_tasks()
            .map_err(|err| err.to_string())?;
        Ok(filter.apply(&tasks).into_iter().map(task_item).collect())
    })
}

/// Creates a task. An assignee holding a prohibited exemption, or one who is
/// unavailable, fails the call.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(item: TaskItem) -> ActionResponse {
    let result = task_from_item(item).and_then(|task| {
        with_workspace(|conn| {
            SqliteTaskService::sqlite(conn)
                .add_task(&task)
                .map(Some)
                .map_err(|err| err.to_string())
        })
    });
    TASK_WORDING.respond(Action::Add, result, |saved| {
        (saved.id.clone(), saved.title.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_update(item: TaskItem) -> ActionResponse {
    let result = task_from_item(item).and_then(|task| {
        with_workspace(|conn| {
            SqliteTaskService::sqlite(conn)
                .update_task(&task)
                .map(Some)
                .map_err(|err| err.to_string())
        })
    });
    TASK_WORDING.respond(Action::Update, result, |saved| {
        (saved.id.clone(), saved.title.clone())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> ActionResponse {
    let result = with_workspace(|conn| {
        SqliteTaskService::sqlite(conn)
            .delete_task(&id)
            .map_err(|err| err.to_string())
    });
    TASK_WORDING.respond(Action::Delete, result, |removed| {
        (removed.id.clone(), removed.title.clone())
    })
}

/// Assignee selector options for the task form's current prohibited list.
#[flutter_rust_bridge::frb(sync)]
pub fn task_eligible_assignees(prohibited_exemption_ids: Vec<String>) -> Vec<PersonItem> {
    list_or_empty("task", |conn| {
        let people = SqliteTaskService::sqlite(conn)
            .eligible_assignees(&prohibited_exemption_ids)
            .map_err(|err| err.to_string())?;
        Ok(people.iter().map(person_item).collect())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_assignment_conflicts() -> Vec<AssignmentConflictItem> {
    list_or_empty("task", |conn| {
        let conflicts = SqliteTaskService::sqlite(conn)
            .assignment_conflicts()
            .map_err(|err| err.to_string())?;
        Ok(conflicts.into_iter().map(conflict_item).collect())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_load() -> DashboardResponse {
    match with_workspace(|conn| load_dashboard(conn).map_err(|err| err.to_string())) {
        Ok(stats) => DashboardResponse {
            ok: true,
            people_total: to_u32(stats.people_total),
            people_available: to_u32(stats.people_available),
            tasks_pending: to_u32(stats.tasks.pending),
            tasks_in_progress: to_u32(stats.tasks.in_progress),
            tasks_completed: to_u32(stats.tasks.completed),
            tasks_cancelled: to_u32(stats.tasks.cancelled),
            departments: stats
                .departments
                .into_iter()
                .map(department_stats_item)
                .collect(),
            message: String::new(),
        },
        Err(err) => DashboardResponse {
            ok: false,
            people_total: 0,
            people_available: 0,
            tasks_pending: 0,
            tasks_in_progress: 0,
            tasks_completed: 0,
            tasks_cancelled: 0,
            departments: Vec::new(),
            message: format!("dashboard_load failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_login(email: String, password: String) -> AuthResponse {
    let result = with_auth(|auth| {
        auth.login(email.trim(), &password)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(user) => AuthResponse {
            ok: true,
            title: "התחברות בוצעה בהצלחה".to_string(),
            message: format!("ברוך הבא, {}!", user.name),
            user: Some(user_item(user)),
        },
        Err(err) => AuthResponse::failure("שגיאה בהתחברות", err),
    }
}

/// Registers and signs in a new account. `role` defaults to `USER`.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_register(
    name: String,
    email: String,
    password: String,
    confirm_password: Option<String>,
    role: Option<String>,
) -> AuthResponse {
    let role = match role.as_deref().map(UserRole::parse) {
        None => UserRole::User,
        Some(Some(role)) => role,
        Some(None) => return AuthResponse::failure("שגיאה בהרשמה", "unknown role"),
    };
    let request = RegisterRequest {
        confirm_password,
        role,
        ..RegisterRequest::new(name, email, password)
    };
    match with_auth(|auth| auth.register(&request).map_err(|err| err.to_string())) {
        Ok(user) => AuthResponse {
            ok: true,
            title: "הרשמה בוצעה בהצלחה".to_string(),
            message: format!("ברוך הבא, {}!", user.name),
            user: Some(user_item(user)),
        },
        Err(err) => AuthResponse::failure("שגיאה בהרשמה", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_logout() -> ActionResponse {
    match with_auth(|auth| auth.logout().map_err(|err| err.to_string())) {
        Ok(()) => ActionResponse::success(None, "התנתקות בוצעה בהצלחה", "להתראות!"),
        Err(err) => ActionResponse::failure("", err),
    }
}

/// Signed-in user restored from the persisted token, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_current_user() -> Option<UserItem> {
    with_auth(|auth| Ok(auth.current_user().cloned()))
        .ok()
        .flatten()
        .map(user_item)
}

/// Gate check for a route: `granted|unauthenticated|forbidden`.
///
/// Unknown role strings are ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_authorize(allowed_roles: Vec<String>) -> String {
    let allowed: Vec<UserRole> = allowed_roles
        .iter()
        .filter_map(|role| UserRole::parse(role))
        .collect();
    let access = with_auth(|auth| Ok(auth.authorize(&allowed))).unwrap_or(Access::Unauthenticated);
    match access {
        Access::Granted => "granted",
        Access::Unauthenticated => "unauthenticated",
        Access::Forbidden => "forbidden",
    }
    .to_string()
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_list_users() -> Vec<UserItem> {
    list_or_empty("auth", |conn| {
        let auth = AuthService::new(
            SqliteUserRepository::new(conn),
            SqliteKeyValueStore::new(conn),
        );
        let users = auth.all_users().map_err(|err| err.to_string())?;
        Ok(users.into_iter().map(user_item).collect())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_update_user(
    user_id: String,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
) -> AuthResponse {
    let role = match role.as_deref().map(UserRole::parse) {
        None => None,
        Some(Some(role)) => Some(role),
        Some(None) => return AuthResponse::failure("Error Updating User", "unknown role"),
    };
    let patch = UserPatch { name, email, role };
    match with_auth(|auth| {
        auth.update_user(&user_id, &patch)
            .map_err(|err| err.to_string())
    }) {
        Ok(user) => AuthResponse {
            ok: true,
            user: Some(user_item(user)),
            title: "User Updated".to_string(),
            message: "User information has been successfully updated".to_string(),
        },
        Err(err) => AuthResponse::failure("Error Updating User", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_delete_user(user_id: String) -> ActionResponse {
    match with_auth(|auth| auth.delete_user(&user_id).map_err(|err| err.to_string())) {
        Ok(user) => ActionResponse::success(
            Some(user.id),
            "User Deleted",
            "User has been successfully removed",
        ),
        Err(err) => ActionResponse::failure("Error Deleting User", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_load() -> SettingsItem {
    let result = with_workspace(|conn| {
        SettingsService::new(SqliteKeyValueStore::new(conn))
            .load()
            .map_err(|err| err.to_string())
    });
    settings_item(result.unwrap_or_default())
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_save(item: SettingsItem) -> SettingsResponse {
    let settings = AppSettings {
        is_dark_mode: item.is_dark_mode,
        is_debug_mode: item.is_debug_mode,
        app_name: item.app_name,
    };
    let result = with_workspace(|conn| {
        SettingsService::new(SqliteKeyValueStore::new(conn))
            .save(&settings)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(saved) => {
            follow_debug_mode(saved.is_debug_mode);
            SettingsResponse {
                ok: true,
                settings: settings_item(saved),
                title: "ההגדרות נשמרו".to_string(),
                message: "הגדרות המערכת עודכנו בהצלחה".to_string(),
            }
        }
        Err(err) => SettingsResponse {
            ok: false,
            settings: settings_item(settings),
            title: String::new(),
            message: err,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_reset() -> SettingsResponse {
    let result = with_workspace(|conn| {
        SettingsService::new(SqliteKeyValueStore::new(conn))
            .reset()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(defaults) => {
            follow_debug_mode(defaults.is_debug_mode);
            SettingsResponse {
                ok: true,
                settings: settings_item(defaults),
                title: "ההגדרות אופסו".to_string(),
                message: "הגדרות המערכת אופסו לברירת המחדל".to_string(),
            }
        }
        Err(err) => SettingsResponse {
            ok: false,
            settings: settings_item(AppSettings::default()),
            title: String::new(),
            message: err,
        },
    }
}

/// Exports departments, exemptions, people and tasks as one JSON document.
#[flutter_rust_bridge::frb(sync)]
pub fn data_export() -> ExportResponse {
    match with_workspace(|conn| export_json(conn).map_err(|err| err.to_string())) {
        Ok(json) => ExportResponse {
            ok: true,
            json,
            message: String::new(),
        },
        Err(err) => ExportResponse {
            ok: false,
            json: String::new(),
            message: format!("data_export failed: {err}"),
        },
    }
}

/// Replaces all collections with an export document.
#[flutter_rust_bridge::frb(sync)]
pub fn data_import(json: String) -> ActionResponse {
    match with_workspace(|conn| import_json(conn, &json).map_err(|err| err.to_string())) {
        Ok(report) => ActionResponse::success(
            None,
            "הנתונים יובאו",
            format!(
                "{} מדורים, {} פטורים, {} חיילים, {} משימות",
                report.departments, report.exemptions, report.people, report.tasks
            ),
        ),
        Err(err) => ActionResponse::failure("שגיאה בייבוא נתונים", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn data_reset() -> ActionResponse {
    match with_workspace(|conn| reset_data(conn).map_err(|err| err.to_string())) {
        Ok(()) => ActionResponse::success(None, "הנתונים נמחקו", ""),
        Err(err) => ActionResponse::failure("שגיאה במחיקת נתונים", err),
    }
}

fn follow_debug_mode(is_debug_mode: bool) {
    if let Err(err) = apply_debug_mode(is_debug_mode) {
        warn!("event=log_level module=settings status=error error={err}");
    }
}

fn workspace_db_path() -> PathBuf {
    WORKSPACE_DB_PATH.get_or_init(resolve_db_path).clone()
}

fn with_workspace<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn =
        open_db(workspace_db_path()).map_err(|err| format!("workspace DB open failed: {err}"))?;
    if WORKSPACE_SEEDED.get().is_none() {
        seed_workspace(&conn).map_err(|err| format!("workspace seed failed: {err}"))?;
        let _ = WORKSPACE_SEEDED.set(());
    }
    f(&conn)
}

fn with_auth<T>(
    f: impl FnOnce(
        &mut AuthService<SqliteUserRepository<'_>, SqliteKeyValueStore<'_>>,
    ) -> Result<T, String>,
) -> Result<T, String> {
    with_workspace(|conn| {
        let mut auth = AuthService::new(
            SqliteUserRepository::new(conn),
            SqliteKeyValueStore::new(conn),
        );
        auth.restore_session().map_err(|err| err.to_string())?;
        f(&mut auth)
    })
}

fn list_or_empty<T>(
    module: &'static str,
    f: impl FnOnce(&Connection) -> Result<Vec<T>, String>,
) -> Vec<T> {
    match with_workspace(f) {
        Ok(items) => items,
        Err(_) => {
            warn!("event=ffi_call module={module} op=list status=error");
            Vec::new()
        }
    }
}

fn id_or_new(id: String) -> String {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        new_record_id()
    } else {
        trimmed.to_string()
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn department_from_item(item: DepartmentItem) -> Department {
    Department {
        id: id_or_new(item.id),
        name: item.name,
        color_code: item.color_code,
    }
}

fn department_item(department: &Department) -> DepartmentItem {
    DepartmentItem {
        id: department.id.clone(),
        name: department.name.clone(),
        color_code: department.color_code.clone(),
    }
}

fn department_card_item(summary: &DepartmentSummary) -> DepartmentCardItem {
    DepartmentCardItem {
        department: department_item(&summary.department),
        people_count: to_u32(summary.people_count),
        task_count: to_u32(summary.task_count),
    }
}

fn department_stats_item(stats: DepartmentStats) -> DepartmentStatsItem {
    DepartmentStatsItem {
        department_id: stats.department_id,
        name: stats.name,
        color_code: stats.color_code,
        people: to_u32(stats.people),
        assigned_tasks: to_u32(stats.assigned_tasks),
    }
}

fn exemption_from_item(item: ExemptionItem) -> ExemptionType {
    ExemptionType {
        id: id_or_new(item.id),
        name: item.name,
        description: item.description,
    }
}

fn exemption_item(exemption: &ExemptionType) -> ExemptionItem {
    ExemptionItem {
        id: exemption.id.clone(),
        name: exemption.name.clone(),
        description: exemption.description.clone(),
    }
}

fn person_from_item(item: PersonItem) -> Person {
    Person {
        id: id_or_new(item.id),
        name: item.name,
        email: item.email,
        phone: item.phone,
        department_id: item.department_id,
        available: item.available,
        emergency_contact: item.emergency_contact,
        exemption_ids: item.exemption_ids,
        user_id: item.user_id,
    }
}

fn person_item(person: &Person) -> PersonItem {
    PersonItem {
        id: person.id.clone(),
        name: person.name.clone(),
        email: person.email.clone(),
        phone: person.phone.clone(),
        department_id: person.department_id.clone(),
        available: person.available,
        emergency_contact: person.emergency_contact.clone(),
        exemption_ids: person.exemption_ids.clone(),
        user_id: person.user_id.clone(),
    }
}

fn person_details_item(details: PersonDetails) -> PersonDetailsItem {
    PersonDetailsItem {
        person: person_item(&details.person),
        department: details.department.as_ref().map(department_item),
        exemptions: details.exemptions.iter().map(exemption_item).collect(),
    }
}

fn task_from_item(item: TaskItem) -> Result<Task, String> {
    let status = Status::parse_label(&item.status)
        .ok_or_else(|| format!("unknown status `{}`", item.status))?;
    let priority = Priority::parse_label(&item.priority)
        .ok_or_else(|| format!("unknown priority `{}`", item.priority))?;
    Ok(Task {
        id: id_or_new(item.id),
        title: item.title,
        description: item.description,
        assigned_person_id: item.assigned_person_id,
        status,
        priority,
        required_skills: item.required_skills,
        prohibited_exemption_ids: item.prohibited_exemption_ids,
        due_date: item.due_date,
        assigned_by_id: item.assigned_by_id,
    })
}

fn task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        assigned_person_id: task.assigned_person_id.clone(),
        status: task.status.as_label().to_string(),
        priority: task.priority.as_label().to_string(),
        required_skills: task.required_skills.clone(),
        prohibited_exemption_ids: task.prohibited_exemption_ids.clone(),
        due_date: task.due_date.clone(),
        assigned_by_id: task.assigned_by_id.clone(),
    }
}

fn conflict_item(conflict: AssignmentConflict) -> AssignmentConflictItem {
    AssignmentConflictItem {
        task_id: conflict.task_id,
        person_id: conflict.person_id,
        exemption_ids: conflict.exemption_ids,
    }
}

fn user_item(user: User) -> UserItem {
    UserItem {
        role: user.role.as_str().to_string(),
        id: user.id,
        name: user.name,
        email: user.email,
    }
}

fn settings_item(settings: AppSettings) -> SettingsItem {
    SettingsItem {
        is_dark_mode: settings.is_dark_mode,
        is_debug_mode: settings.is_debug_mode,
        app_name: settings.app_name,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        auth_current_user, auth_delete_user, auth_logout, auth_register, core_version,
        department_add, department_cards, department_delete, department_update, exemption_add,
        exemption_delete, exemption_holder_count, init_logging, person_add, person_delete,
        person_details, ping, task_add, task_eligible_assignees, task_list, workspace_bootstrap,
        DepartmentItem, ExemptionItem, PersonItem, TaskItem,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_with_blank_level_still_validates_log_dir() {
        let error = init_logging(String::new(), "tmp/logs".to_string());
        assert!(error.contains("absolute"), "{error}");
    }

    #[test]
    fn bootstrap_reports_db_path() {
        let response = workspace_bootstrap();
        assert!(response.ok, "{}", response.message);
        assert!(!response.message.is_empty());
    }

    #[test]
    fn department_lifecycle_uses_hebrew_toasts() {
        let name = unique_token("מדור");
        let added = department_add(DepartmentItem {
            id: String::new(),
            name: name.clone(),
            color_code: "#10B981".to_string(),
        });
        assert!(added.ok, "{}", added.message);
        assert_eq!(added.title, "מדור נוסף");
        assert_eq!(added.message, format!("המדור \"{name}\" נוסף בהצלחה"));
        let id = added.id.expect("add should return id");

        let failed = department_update(DepartmentItem {
            id: id.clone(),
            name: name.clone(),
            color_code: "blue".to_string(),
        });
        assert!(!failed.ok);
        assert_eq!(failed.title, "שגיאה בעדכון מדור");
        assert_eq!(failed.message, "אירעה שגיאה בעדכון המדור. אנא נסה שנית.");

        let deleted = department_delete(id.clone());
        assert!(deleted.ok);
        assert_eq!(deleted.title, "מדור נמחק");

        let again = department_delete(id);
        assert!(again.ok);
        assert!(again.title.is_empty());
    }

    #[test]
    fn task_add_rejects_assignee_with_prohibited_exemption() {
        let fixture = roster_fixture();
        assert!(task_eligible_assignees(Vec::new())
            .iter()
            .any(|person| person.id == fixture.person_id));
        assert!(task_eligible_assignees(vec![fixture.exemption_id.clone()])
            .iter()
            .all(|person| person.id != fixture.person_id));

        let title = unique_token("תורנות");
        let response = task_add(TaskItem {
            id: String::new(),
            title: title.clone(),
            description: String::new(),
            assigned_person_id: Some(fixture.person_id.clone()),
            status: "ממתין".to_string(),
            priority: "גבוהה".to_string(),
            required_skills: Vec::new(),
            prohibited_exemption_ids: vec![fixture.exemption_id.clone()],
            due_date: "2023-06-15".to_string(),
            assigned_by_id: None,
        });
        assert!(!response.ok);
        assert_eq!(response.title, "שגיאה בהוספת משימה");
        assert!(task_list(Some(title), None, None).is_empty());

        fixture.remove();
    }

    #[test]
    fn roster_records_in_use_cannot_be_deleted() {
        let fixture = roster_fixture();

        let department = department_delete(fixture.department_id.clone());
        assert!(!department.ok);
        assert_eq!(department.title, "שגיאה במחיקת מדור");
        assert_eq!(
            department.message,
            "לא ניתן למחוק יחידה עם חיילים מוקצים. העבר את החיילים ליחידה אחרת קודם."
        );

        let exemption = exemption_delete(fixture.exemption_id.clone());
        assert!(!exemption.ok);
        assert_eq!(exemption.title, "שגיאה במחיקת פטור");
        assert_eq!(
            exemption.message,
            "לא ניתן למחוק פטור שמוקצה לחיילים. הסר את הפטור מהחיילים קודם."
        );
        assert_eq!(exemption_holder_count(fixture.exemption_id.clone()), 1);

        let card = department_cards(Some(fixture.department_name.clone()))
            .into_iter()
            .find(|card| card.department.id == fixture.department_id)
            .expect("department card");
        assert_eq!(card.people_count, 1);
        assert_eq!(card.task_count, 0);

        let details = person_details(fixture.person_id.clone()).expect("person details");
        assert_eq!(
            details.department.map(|department| department.id),
            Some(fixture.department_id.clone())
        );
        assert_eq!(details.exemptions.len(), 1);
        assert_eq!(details.exemptions[0].id, fixture.exemption_id);

        fixture.remove();
    }

    #[test]
    fn task_list_with_unknown_status_is_empty() {
        assert!(task_list(None, Some("unknown".to_string()), None).is_empty());
    }

    #[test]
    fn register_signs_in_and_blocks_self_delete() {
        let email = format!("{}@taskforce.test", unique_token("reg"));
        let mismatch = auth_register(
            "Reservist".to_string(),
            email.clone(),
            "secret1".to_string(),
            Some("secret2".to_string()),
            None,
        );
        assert!(!mismatch.ok);
        assert_eq!(mismatch.message, "הסיסמאות אינן תואמות");

        let registered = auth_register(
            "Reservist".to_string(),
            email.clone(),
            "secret1".to_string(),
            Some("secret1".to_string()),
            None,
        );
        assert!(registered.ok, "{}", registered.message);
        assert_eq!(registered.message, "ברוך הבא, Reservist!");
        let user = registered.user.expect("registered user");
        assert_eq!(user.role, "USER");
        assert_eq!(auth_current_user().map(|current| current.id), Some(user.id.clone()));

        let duplicate = auth_register(
            "Other".to_string(),
            email,
            "x".to_string(),
            None,
            None,
        );
        assert_eq!(duplicate.message, "משתמש עם אימייל זה כבר קיים");

        let self_delete = auth_delete_user(user.id.clone());
        assert!(!self_delete.ok);
        assert_eq!(self_delete.title, "Error Deleting User");

        let logout = auth_logout();
        assert_eq!(logout.title, "התנתקות בוצעה בהצלחה");
        assert!(auth_current_user().is_none());

        let deleted = auth_delete_user(user.id);
        assert!(deleted.ok, "{}", deleted.message);
    }

    struct RosterFixture {
        department_id: String,
        department_name: String,
        exemption_id: String,
        person_id: String,
    }

    impl RosterFixture {
        fn remove(self) {
            assert!(person_delete(self.person_id).ok);
            let exemption = exemption_delete(self.exemption_id);
            assert!(exemption.ok, "{}", exemption.message);
            assert_eq!(exemption.title, "פטור נמחק");
            let department = department_delete(self.department_id);
            assert!(department.ok, "{}", department.message);
            assert_eq!(department.title, "מדור נמחק");
        }
    }

    /// A department with one available member holding one exemption.
    fn roster_fixture() -> RosterFixture {
        let department_name = unique_token("מודיעין");
        let department = department_add(DepartmentItem {
            id: String::new(),
            name: department_name.clone(),
            color_code: "#F59E0B".to_string(),
        });
        assert!(department.ok, "{}", department.message);
        let department_id = department.id.expect("department id");

        let exemption = exemption_add(ExemptionItem {
            id: String::new(),
            name: unique_token("פרופיל"),
            description: "פטור מתורנויות לילה".to_string(),
        });
        assert!(exemption.ok, "{}", exemption.message);
        let exemption_id = exemption.id.expect("exemption id");

        let person = person_add(PersonItem {
            id: String::new(),
            name: unique_token("גל לוי"),
            email: String::new(),
            phone: "050-1234567".to_string(),
            department_id: department_id.clone(),
            available: true,
            emergency_contact: String::new(),
            exemption_ids: vec![exemption_id.clone()],
            user_id: None,
        });
        assert!(person.ok, "{}", person.message);
        assert_eq!(person.title, "חייל נוסף");

        RosterFixture {
            department_id,
            department_name,
            exemption_id,
            person_id: person.id.expect("person id"),
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
