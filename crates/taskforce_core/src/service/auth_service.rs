//! Mock local authentication.
//!
//! # Responsibility
//! - Verify credentials against the local account table.
//! - Issue, persist, restore and drop the session pseudo-token.
//! - Gate use-cases by role.
//!
//! # Invariants
//! - The token is base64 of the public user JSON; it is not signed and
//!   carries no secret.
//! - An undecodable stored token is removed on restore.
//! - The signed-in account cannot delete itself.
//! - Passwords and tokens are never logged.

use crate::model::user::{User, UserPatch, UserRole};
use crate::model::new_record_id;
use crate::repo::kv_repo::{KeyValueStore, AUTH_TOKEN_KEY};
use crate::repo::user_repo::{StoredCredentials, UserRepository};
use crate::repo::{RepoError, RepoResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SALT_BYTES: usize = 16;

/// Errors from authentication and account management.
#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    EmailTaken(String),
    PasswordMismatch,
    EmptyPassword,
    UserNotFound(String),
    CannotDeleteSelf,
    NotAuthenticated,
    /// Signed in, but the role is outside the allowed set.
    Forbidden(UserRole),
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::EmailTaken(_) => write!(f, "משתמש עם אימייל זה כבר קיים"),
            Self::PasswordMismatch => write!(f, "הסיסמאות אינן תואמות"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::UserNotFound(_) => write!(f, "User not found"),
            Self::CannotDeleteSelf => write!(f, "Cannot delete your own account while logged in"),
            Self::NotAuthenticated => write!(f, "not signed in"),
            Self::Forbidden(role) => write!(f, "role {} is not allowed here", role.as_str()),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate {
                kind: "user email",
                id,
            } => Self::EmailTaken(id),
            RepoError::NotFound { kind: "user", id } => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Outcome of a role gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No signed-in user; the UI sends them to the login screen.
    Unauthenticated,
    /// Signed in with a role outside the allowed set.
    Forbidden,
}

/// Registration form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Second password entry, when the form collects one.
    pub confirm_password: Option<String>,
    pub role: UserRole,
}

impl RegisterRequest {
    /// Builds a request for a regular `USER` account.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: None,
            role: UserRole::User,
        }
    }
}

/// Session-holding auth service over account and key-value storage.
pub struct AuthService<U: UserRepository, K: KeyValueStore> {
    users: U,
    store: K,
    current: Option<User>,
}

impl<U: UserRepository, K: KeyValueStore> AuthService<U, K> {
    /// Creates a signed-out service. Call `restore_session` to pick up a
    /// persisted token.
    pub fn new(users: U, store: K) -> Self {
        Self {
            users,
            store,
            current: None,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Loads the persisted token, if any, and signs its user in.
    ///
    /// Tokens that fail to decode, or that name an account which no longer
    /// exists, are removed and leave the service signed out.
    pub fn restore_session(&mut self) -> RepoResult<Option<User>> {
        let Some(token) = self.store.get_value(AUTH_TOKEN_KEY)? else {
            return Ok(None);
        };

        let restored = match decode_token(&token) {
            Some(user) => self.users.get_user(&user.id)?.map(|_| user),
            None => None,
        };
        match restored {
            Some(user) => {
                info!(
                    "event=session_restore module=auth status=ok user_id={}",
                    user.id
                );
                self.current = Some(user.clone());
                Ok(Some(user))
            }
            None => {
                warn!("event=session_restore module=auth status=error error_code=invalid_token");
                self.store.remove_value(AUTH_TOKEN_KEY)?;
                self.current = None;
                Ok(None)
            }
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = self.users.find_credentials_by_email(email)?;
        let Some(credentials) = credentials.filter(|stored| {
            hash_password(&stored.password_salt, password) == stored.password_hash
        }) else {
            warn!("event=login module=auth status=error error_code=invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        self.start_session(credentials.user.clone())?;
        info!(
            "event=login module=auth status=ok user_id={}",
            credentials.user.id
        );
        Ok(credentials.user)
    }

    /// Creates an account and signs it in.
    pub fn register(&mut self, request: &RegisterRequest) -> Result<User, AuthError> {
        if let Some(confirm) = request.confirm_password.as_deref() {
            if confirm != request.password {
                return Err(AuthError::PasswordMismatch);
            }
        }
        if request.password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        if self
            .users
            .find_credentials_by_email(&request.email)?
            .is_some()
        {
            return Err(AuthError::EmailTaken(request.email.trim().to_string()));
        }

        let user = User {
            id: new_record_id(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            role: request.role,
        };
        self.users
            .create_user(&new_credentials(user.clone(), &request.password))?;
        self.start_session(user.clone())?;
        info!(
            "event=register module=auth status=ok user_id={} role={}",
            user.id,
            user.role.as_str()
        );
        Ok(user)
    }

    pub fn logout(&mut self) -> RepoResult<()> {
        self.store.remove_value(AUTH_TOKEN_KEY)?;
        if let Some(user) = self.current.take() {
            info!("event=logout module=auth status=ok user_id={}", user.id);
        }
        Ok(())
    }

    pub fn all_users(&self) -> RepoResult<Vec<User>> {
        self.users.list_users()
    }

    /// Applies a partial account update. Updating the signed-in account
    /// re-issues its token; an empty patch writes nothing.
    pub fn update_user(&mut self, user_id: &str, patch: &UserPatch) -> Result<User, AuthError> {
        let mut user = self
            .users
            .get_user(user_id)?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        if patch.is_empty() {
            return Ok(user);
        }
        patch.apply(&mut user);
        self.users.update_user(&user)?;

        if self.current.as_ref().is_some_and(|current| current.id == user.id) {
            self.start_session(user.clone())?;
        }
        info!("event=user_update module=auth status=ok user_id={}", user.id);
        Ok(user)
    }

    pub fn delete_user(&mut self, user_id: &str) -> Result<User, AuthError> {
        if self.users.get_user(user_id)?.is_none() {
            return Err(AuthError::UserNotFound(user_id.to_string()));
        }
        if self
            .current
            .as_ref()
            .is_some_and(|current| current.id == user_id)
        {
            return Err(AuthError::CannotDeleteSelf);
        }

        let removed = self
            .users
            .delete_user(user_id)?
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        info!("event=user_delete module=auth status=ok user_id={user_id}");
        Ok(removed)
    }

    /// Checks the signed-in user against a route's allowed roles.
    pub fn authorize(&self, allowed_roles: &[UserRole]) -> Access {
        match &self.current {
            None => Access::Unauthenticated,
            Some(user) if allowed_roles.contains(&user.role) => Access::Granted,
            Some(_) => Access::Forbidden,
        }
    }

    /// Like `authorize`, but as an error for use-case guards.
    pub fn require_role(&self, allowed_roles: &[UserRole]) -> Result<&User, AuthError> {
        let user = self.current.as_ref().ok_or(AuthError::NotAuthenticated)?;
        if !allowed_roles.contains(&user.role) {
            return Err(AuthError::Forbidden(user.role));
        }
        Ok(user)
    }

    fn start_session(&mut self, user: User) -> RepoResult<()> {
        self.store.set_value(AUTH_TOKEN_KEY, &encode_token(&user))?;
        self.current = Some(user);
        Ok(())
    }
}

/// Encodes the public user view as the session pseudo-token.
pub fn encode_token(user: &User) -> String {
    // User only holds strings and a unit enum; serialization cannot fail.
    let payload = serde_json::to_vec(user).unwrap_or_default();
    STANDARD.encode(payload)
}

/// Decodes a session pseudo-token. Returns `None` for malformed input.
pub fn decode_token(token: &str) -> Option<User> {
    let payload = STANDARD.decode(token.trim()).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// Builds stored credentials with a fresh random salt.
pub fn new_credentials(user: User, password: &str) -> StoredCredentials {
    let salt: [u8; SALT_BYTES] = rand::random();
    let password_salt = hex::encode(salt);
    let password_hash = hash_password(&password_salt, password);
    StoredCredentials {
        user,
        password_salt,
        password_hash,
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{decode_token, encode_token, hash_password, new_credentials};
    use crate::model::user::{User, UserRole};

    fn commander() -> User {
        User {
            id: "4".to_string(),
            name: "Task Force Commander".to_string(),
            email: "commander@taskforce.com".to_string(),
            role: UserRole::Admin,
        }
    }

    #[test]
    fn token_decodes_back_to_user() {
        let user = commander();
        assert_eq!(decode_token(&encode_token(&user)), Some(user));
    }

    #[test]
    fn garbage_token_does_not_decode() {
        assert_eq!(decode_token("not base64 !!"), None);
        assert_eq!(decode_token("aGVsbG8="), None);
    }

    #[test]
    fn credentials_use_distinct_salts() {
        let first = new_credentials(commander(), "commander123");
        let second = new_credentials(commander(), "commander123");
        assert_ne!(first.password_salt, second.password_salt);
        assert_ne!(first.password_hash, second.password_hash);
        assert_eq!(
            hash_password(&first.password_salt, "commander123"),
            first.password_hash
        );
    }

    #[test]
    fn hashes_and_salts_are_lowercase_hex() {
        // sha256("abc"), split across salt and password.
        assert_eq!(
            hash_password("a", "bc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let credentials = new_credentials(commander(), "commander123");
        assert_eq!(credentials.password_salt.len(), 32);
        assert!(credentials
            .password_salt
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
