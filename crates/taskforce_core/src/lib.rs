//! Core domain logic for the task force manager.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod eligibility;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, resolve_db_path, DbError};
pub use eligibility::{
    assignment_conflicts, check_assignment, eligible_assignees, is_eligible, AssignmentConflict,
    AssignmentError,
};
pub use filter::{PeopleFilter, TaskFilter};
pub use logging::{apply_debug_mode, init_logging, LogLevel};
pub use model::department::Department;
pub use model::exemption::ExemptionType;
pub use model::person::Person;
pub use model::task::{Priority, Status, Task};
pub use model::user::{User, UserPatch, UserRole};
pub use model::validation::ValidationError;
pub use model::{new_record_id, RecordId};
pub use repo::kv_repo::SqliteKeyValueStore;
pub use repo::user_repo::SqliteUserRepository;
pub use repo::{RepoError, RepoResult};
pub use service::auth_service::{Access, AuthError, AuthService, RegisterRequest};
pub use service::dashboard::{dashboard_stats, load_dashboard, DashboardStats};
pub use service::roster_service::{RosterService, SqliteRosterService};
pub use service::seed::{seed_workspace, SeedReport};
pub use service::settings_service::{AppSettings, SettingsError, SettingsService};
pub use service::snapshot::{
    export_json, import_json, reset_data, DataSnapshot, ImportReport, SnapshotError,
};
pub use service::task_service::{SqliteTaskService, TaskService, TaskServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
