use rusqlite::Connection;
use taskforce_core::db::open_db_in_memory;
use taskforce_core::{
    AssignmentError, ExemptionType, Person, Priority, RepoError, SqliteRosterService,
    SqliteTaskService, Status, Task, TaskServiceError,
};

struct Roster {
    night: ExemptionType,
    field: ExemptionType,
    /// Available, holds no exemptions.
    daniel: Person,
    /// Available, holds the night-duty exemption.
    gal: Person,
    /// Unavailable, holds no exemptions.
    yael: Person,
}

fn seed_roster(conn: &Connection) -> Roster {
    let roster = SqliteRosterService::sqlite(conn);
    let night = roster
        .add_exemption(&ExemptionType::new("פרופיל 45", "פטור מתורנויות לילה"))
        .unwrap();
    let field = roster
        .add_exemption(&ExemptionType::new("פרופיל 64", "פטור מפעילות בשטח"))
        .unwrap();

    let daniel = roster.add_person(&Person::new("דניאל כהן", "1")).unwrap();
    let mut gal = Person::new("גל לוי", "2");
    gal.exemption_ids = vec![night.id.clone()];
    let gal = roster.add_person(&gal).unwrap();
    let mut yael = Person::new("יעל ישראלי", "3");
    yael.available = false;
    let yael = roster.add_person(&yael).unwrap();

    Roster {
        night,
        field,
        daniel,
        gal,
        yael,
    }
}

fn guard_duty(roster: &Roster) -> Task {
    let mut task = Task::new("אבטחת שער", "2023-06-14");
    task.description = "אבטחת שער הבסיס משמרת לילה".to_string();
    task.priority = Priority::High;
    task.required_skills = vec!["הכשרת שמירה".to_string(), " רישיון לנשק ".to_string()];
    task.prohibited_exemption_ids = vec![roster.night.id.clone()];
    task
}

#[test]
fn add_task_with_eligible_assignee_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let service = SqliteTaskService::sqlite(&conn);

    let mut task = guard_duty(&roster);
    task.assigned_person_id = Some(roster.daniel.id.clone());
    let saved = service.add_task(&task).unwrap();

    assert_eq!(saved.status, Status::Pending);
    assert_eq!(saved.priority, Priority::High);
    assert_eq!(saved.required_skills, vec!["הכשרת שמירה", "רישיון לנשק"]);
    assert_eq!(saved.assigned_person_id.as_deref(), Some(roster.daniel.id.as_str()));
    assert_eq!(service.list_tasks().unwrap(), vec![saved]);
}

#[test]
fn add_task_rejects_holder_of_prohibited_exemption() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let service = SqliteTaskService::sqlite(&conn);

    let mut task = guard_duty(&roster);
    task.assigned_person_id = Some(roster.gal.id.clone());
    let err = service.add_task(&task).unwrap_err();

    match err {
        TaskServiceError::Assignment(AssignmentError::ProhibitedExemption {
            person_id,
            exemption_ids,
        }) => {
            assert_eq!(person_id, roster.gal.id);
            assert_eq!(exemption_ids, vec![roster.night.id.clone()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.list_tasks().unwrap().is_empty());
}

#[test]
fn add_task_rejects_unavailable_and_unknown_assignees() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let service = SqliteTaskService::sqlite(&conn);

    let mut task = guard_duty(&roster);
    task.assigned_person_id = Some(roster.yael.id.clone());
    assert!(matches!(
        service.add_task(&task).unwrap_err(),
        TaskServiceError::Assignment(AssignmentError::PersonUnavailable(_))
    ));

    task.assigned_person_id = Some("ghost".to_string());
    assert!(matches!(
        service.add_task(&task).unwrap_err(),
        TaskServiceError::Assignment(AssignmentError::UnknownPerson(_))
    ));
}

#[test]
fn eligible_assignees_follow_the_draft_prohibited_list() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let service = SqliteTaskService::sqlite(&conn);

    let names = |prohibited: &[String]| -> Vec<String> {
        service
            .eligible_assignees(prohibited)
            .unwrap()
            .into_iter()
            .map(|person| person.name)
            .collect()
    };

    assert_eq!(names(&[]), vec!["דניאל כהן", "גל לוי"]);
    assert_eq!(names(&[roster.night.id.clone()]), vec!["דניאל כהן"]);
    assert_eq!(names(&[roster.field.id.clone()]), vec!["דניאל כהן", "גל לוי"]);
}

#[test]
fn exemption_added_after_assignment_is_reported_not_revoked() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let people = SqliteRosterService::sqlite(&conn);
    let service = SqliteTaskService::sqlite(&conn);

    let mut task = guard_duty(&roster);
    task.assigned_person_id = Some(roster.daniel.id.clone());
    let saved = service.add_task(&task).unwrap();

    let mut daniel = roster.daniel.clone();
    daniel.exemption_ids = vec![roster.night.id.clone()];
    people.update_person(&daniel).unwrap();

    let stored = service.get_task(&saved.id).unwrap().unwrap();
    assert_eq!(stored.assigned_person_id.as_deref(), Some(daniel.id.as_str()));

    let conflicts = service.assignment_conflicts().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].task_id, saved.id);
    assert_eq!(conflicts[0].person_id, daniel.id);

    // Editing unrelated fields keeps the stale assignment.
    let mut edited = stored.clone();
    edited.status = Status::InProgress;
    let updated = service.update_task(&edited).unwrap();
    assert_eq!(updated.status, Status::InProgress);

    // Touching the prohibited list re-checks the assignee.
    edited.prohibited_exemption_ids.push(roster.field.id.clone());
    assert!(matches!(
        service.update_task(&edited).unwrap_err(),
        TaskServiceError::Assignment(AssignmentError::ProhibitedExemption { .. })
    ));
}

#[test]
fn assign_task_sets_and_clears_assignee() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let service = SqliteTaskService::sqlite(&conn);
    let saved = service.add_task(&guard_duty(&roster)).unwrap();

    let assigned = service
        .assign_task(&saved.id, Some(roster.daniel.id.as_str()), Some("4"))
        .unwrap();
    assert_eq!(assigned.assigned_person_id.as_deref(), Some(roster.daniel.id.as_str()));
    assert_eq!(assigned.assigned_by_id.as_deref(), Some("4"));

    assert!(service
        .assign_task(&saved.id, Some(roster.gal.id.as_str()), Some("4"))
        .is_err());

    let cleared = service.assign_task(&saved.id, None, Some("4")).unwrap();
    assert_eq!(cleared.assigned_person_id, None);
    assert_eq!(cleared.assigned_by_id, None);
}

#[test]
fn update_and_delete_of_missing_task() {
    let conn = open_db_in_memory().unwrap();
    let roster = seed_roster(&conn);
    let service = SqliteTaskService::sqlite(&conn);

    let task = guard_duty(&roster);
    assert!(matches!(
        service.update_task(&task).unwrap_err(),
        TaskServiceError::TaskNotFound(id) if id == task.id
    ));
    assert_eq!(service.delete_task(&task.id).unwrap(), None);
}

#[test]
fn invalid_due_date_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteTaskService::sqlite(&conn);

    let task = Task::new("תרגיל שטח", "20/06/2023");
    assert!(matches!(
        service.add_task(&task).unwrap_err(),
        TaskServiceError::Repo(RepoError::Validation(_))
    ));
}
