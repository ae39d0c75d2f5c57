use taskforce_core::db::{open_db, open_db_in_memory};
use taskforce_core::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use taskforce_core::service::seed::{initial_exemptions, seed_demo_data};
use taskforce_core::{
    load_dashboard, seed_workspace, ExemptionType, SqliteRosterService, SqliteTaskService, Status,
};

#[test]
fn fresh_workspace_gets_demo_data_and_accounts() {
    let conn = open_db_in_memory().unwrap();
    let report = seed_workspace(&conn).unwrap();

    assert_eq!(report.departments, 4);
    assert_eq!(report.exemptions, 4);
    assert_eq!(report.people, 4);
    assert_eq!(report.tasks, 4);
    assert_eq!(report.users, 4);
    assert_eq!(report.total(), 20);

    let roster = SqliteRosterService::sqlite(&conn);
    let names: Vec<String> = roster
        .list_departments()
        .unwrap()
        .into_iter()
        .map(|department| department.name)
        .collect();
    assert_eq!(names, vec!["גדוד 123", "פלוגה א", "מודיעין", "לוגיסטיקה"]);
    assert_eq!(roster.list_exemptions().unwrap(), initial_exemptions());
}

#[test]
fn seeding_twice_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskforce.db");

    let first = seed_workspace(&open_db(&path).unwrap()).unwrap();
    assert_eq!(first.total(), 20);

    let second = seed_workspace(&open_db(&path).unwrap()).unwrap();
    assert_eq!(second.total(), 0);
}

#[test]
fn only_empty_collections_are_seeded() {
    let conn = open_db_in_memory().unwrap();
    let roster = SqliteRosterService::sqlite(&conn);
    roster
        .add_exemption(&ExemptionType::new("פרופיל 97", "ללא הגבלות"))
        .unwrap();

    let report = seed_demo_data(&conn).unwrap();
    assert_eq!(report.exemptions, 0);
    assert_eq!(report.departments, 4);
    assert_eq!(report.people, 4);

    // Demo exemption ids do not exist here, so the demo links are dropped.
    let people = roster.list_people().unwrap();
    assert!(people.iter().all(|person| person.exemption_ids.is_empty()));
    let tasks = SqliteTaskService::sqlite(&conn).list_tasks().unwrap();
    assert!(tasks
        .iter()
        .all(|task| task.prohibited_exemption_ids.is_empty()));
    assert_eq!(
        SqliteDepartmentRepository::new(&conn)
            .count_departments()
            .unwrap(),
        4
    );
}

#[test]
fn seeded_dashboard_matches_demo_data() {
    let conn = open_db_in_memory().unwrap();
    seed_workspace(&conn).unwrap();

    let stats = load_dashboard(&conn).unwrap();
    assert_eq!(stats.people_total, 4);
    assert_eq!(stats.people_available, 3);
    assert_eq!(stats.tasks.get(Status::Pending), 2);
    assert_eq!(stats.tasks.get(Status::InProgress), 1);
    assert_eq!(stats.tasks.get(Status::Completed), 1);
    assert_eq!(stats.tasks.get(Status::Cancelled), 0);

    let assigned: Vec<usize> = stats
        .departments
        .iter()
        .map(|department| department.assigned_tasks)
        .collect();
    assert_eq!(assigned, vec![1, 1, 0, 1]);
    assert!(SqliteTaskService::sqlite(&conn)
        .assignment_conflicts()
        .unwrap()
        .is_empty());
}
