//! Login account repository.
//!
//! # Invariants
//! - Emails are unique case-insensitively.
//! - Password material never leaves this module except through
//!   `StoredCredentials`, which the auth service consumes.

use crate::model::user::{User, UserRole};
use crate::model::validation::{require_email, require_text};
use crate::repo::{count_rows, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, name, email, role FROM users";

/// Account row including salted password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_salt: String,
    pub password_hash: String,
}

pub trait UserRepository {
    fn create_user(&self, credentials: &StoredCredentials) -> RepoResult<()>;
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
    fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<StoredCredentials>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn delete_user(&self, id: &str) -> RepoResult<Option<User>>;
    fn count_users(&self) -> RepoResult<u64>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn email_taken_by_other(&self, email: &str, id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE AND id <> ?2
            );",
            params![email, id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, credentials: &StoredCredentials) -> RepoResult<()> {
        let user = &credentials.user;
        validate_user(user)?;
        if self.email_taken_by_other(user.email.trim(), &user.id)? {
            return Err(RepoError::Duplicate {
                kind: "user email",
                id: user.email.trim().to_string(),
            });
        }
        if self.get_user(&user.id)?.is_some() {
            return Err(RepoError::Duplicate {
                kind: "user",
                id: user.id.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO users (id, name, email, role, password_salt, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.as_str(),
                user.name.trim(),
                user.email.trim(),
                user.role.as_str(),
                credentials.password_salt.as_str(),
                credentials.password_hash.as_str(),
            ],
        )?;
        Ok(())
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        validate_user(user)?;
        if self.email_taken_by_other(user.email.trim(), &user.id)? {
            return Err(RepoError::Duplicate {
                kind: "user email",
                id: user.email.trim().to_string(),
            });
        }

        let changed = self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2, role = ?3 WHERE id = ?4;",
            params![
                user.name.trim(),
                user.email.trim(),
                user.role.as_str(),
                user.id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: "user",
                id: user.id.clone(),
            });
        }
        Ok(())
    }

    fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<StoredCredentials>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, password_salt, password_hash
                 FROM users
                 WHERE email = ?1 COLLATE NOCASE;",
                [email.trim()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, password_salt, password_hash)) = row else {
            return Ok(None);
        };
        let user = self.get_user(&id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("user `{id}` vanished during credential lookup"))
        })?;
        Ok(Some(StoredCredentials {
            user,
            password_salt,
            password_hash,
        }))
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn delete_user(&self, id: &str) -> RepoResult<Option<User>> {
        let Some(existing) = self.get_user(id)? else {
            return Ok(None);
        };
        self.conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        Ok(Some(existing))
    }

    fn count_users(&self) -> RepoResult<u64> {
        count_rows(self.conn, "users")
    }
}

fn validate_user(user: &User) -> RepoResult<()> {
    require_text("id", &user.id)?;
    require_text("name", &user.name)?;
    require_email(&user.email)?;
    Ok(())
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let role_text: String = row.get("role")?;
    let role = UserRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role,
    })
}
