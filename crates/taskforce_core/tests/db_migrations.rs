use rusqlite::Connection;
use taskforce_core::db::migrations::latest_version;
use taskforce_core::db::{open_db, open_db_in_memory, DbError};

const TABLES: [&str; 9] = [
    "departments",
    "exemptions",
    "people",
    "person_exemptions",
    "tasks",
    "task_skills",
    "task_prohibited_exemptions",
    "users",
    "kv_store",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskforce.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    conn_first
        .execute(
            "INSERT INTO departments (id, name, color_code) VALUES ('1', 'מודיעין', '#F59E0B');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM departments;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn task_status_column_rejects_unknown_codes() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO tasks (id, title, description, status, priority, due_date)
         VALUES ('t1', 'x', '', 'ממתין', 'low', '2023-06-15');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn schema_refuses_to_drop_a_held_exemption() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO exemptions (id, name) VALUES ('1', 'פרופיל 21');
         INSERT INTO people (id, name) VALUES ('p1', 'גל לוי');
         INSERT INTO person_exemptions (person_id, exemption_id, position) VALUES ('p1', '1', 0);",
    )
    .unwrap();

    assert!(conn
        .execute("DELETE FROM exemptions WHERE id = '1';", [])
        .is_err());

    conn.execute("DELETE FROM people WHERE id = 'p1';", []).unwrap();
    conn.execute("DELETE FROM exemptions WHERE id = '1';", []).unwrap();
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
