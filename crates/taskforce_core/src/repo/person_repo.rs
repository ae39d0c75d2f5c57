//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist people together with their ordered exemption links.
//!
//! # Invariants
//! - Person row and `person_exemptions` rows are replaced in one transaction.
//! - Exemption ids must reference existing exemptions.
//! - Deleting a person un-assigns their tasks (`ON DELETE SET NULL`).

use crate::model::person::Person;
use crate::repo::{
    bool_to_int, count_rows, ensure_all_exist, int_to_bool, load_links, replace_links,
    row_exists, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    phone,
    department_id,
    available,
    emergency_contact,
    user_id
FROM people";

pub trait PersonRepository {
    fn create_person(&self, person: &Person) -> RepoResult<()>;
    fn update_person(&self, person: &Person) -> RepoResult<()>;
    fn get_person(&self, id: &str) -> RepoResult<Option<Person>>;
    fn list_people(&self) -> RepoResult<Vec<Person>>;
    fn delete_person(&self, id: &str) -> RepoResult<Option<Person>>;
    fn count_people(&self) -> RepoResult<u64>;
}

pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_person(&tx, person)?;
        tx.commit()?;
        Ok(())
    }

    fn update_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;
        let person = person.normalized();

        let tx = self.conn.unchecked_transaction()?;
        ensure_all_exist(&tx, "exemptions", "exemption", &person.exemption_ids)?;
        let changed = tx.execute(
            "UPDATE people
             SET
                name = ?1,
                email = ?2,
                phone = ?3,
                department_id = ?4,
                available = ?5,
                emergency_contact = ?6,
                user_id = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8;",
            params![
                person.name.trim(),
                person.email.trim(),
                person.phone.trim(),
                person.department_id.as_str(),
                bool_to_int(person.available),
                person.emergency_contact.as_str(),
                person.user_id.as_deref(),
                person.id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: "person",
                id: person.id.clone(),
            });
        }
        replace_links(
            &tx,
            "person_exemptions",
            "person_id",
            "exemption_id",
            &person.id,
            &person.exemption_ids,
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_person(&self, id: &str) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_people(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(self.conn, row)?);
        }
        Ok(people)
    }

    fn delete_person(&self, id: &str) -> RepoResult<Option<Person>> {
        let Some(existing) = self.get_person(id)? else {
            return Ok(None);
        };
        self.conn.execute("DELETE FROM people WHERE id = ?1;", [id])?;
        Ok(Some(existing))
    }

    fn count_people(&self) -> RepoResult<u64> {
        count_rows(self.conn, "people")
    }
}

/// Inserts one person and its exemption links. Runs inside the caller's
/// transaction.
pub(crate) fn insert_person(conn: &Connection, person: &Person) -> RepoResult<()> {
    person.validate()?;
    let person = person.normalized();
    if row_exists(conn, "people", &person.id)? {
        return Err(RepoError::Duplicate {
            kind: "person",
            id: person.id.clone(),
        });
    }
    ensure_all_exist(conn, "exemptions", "exemption", &person.exemption_ids)?;

    conn.execute(
        "INSERT INTO people (
            id,
            name,
            email,
            phone,
            department_id,
            available,
            emergency_contact,
            user_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            person.id.as_str(),
            person.name.trim(),
            person.email.trim(),
            person.phone.trim(),
            person.department_id.as_str(),
            bool_to_int(person.available),
            person.emergency_contact.as_str(),
            person.user_id.as_deref(),
        ],
    )?;
    replace_links(
        conn,
        "person_exemptions",
        "person_id",
        "exemption_id",
        &person.id,
        &person.exemption_ids,
    )
}

fn parse_person_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Person> {
    let id: String = row.get("id")?;
    let exemption_ids = load_links(conn, "person_exemptions", "person_id", "exemption_id", &id)?;
    Ok(Person {
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        department_id: row.get("department_id")?,
        available: int_to_bool(row.get("available")?, "people.available")?,
        emergency_contact: row.get("emergency_contact")?,
        exemption_ids,
        user_id: row.get("user_id")?,
        id,
    })
}
