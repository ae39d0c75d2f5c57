use rusqlite::Connection;
use taskforce_core::db::open_db_in_memory;
use taskforce_core::repo::kv_repo::{KeyValueStore, AUTH_TOKEN_KEY};
use taskforce_core::service::auth_service::{decode_token, encode_token};
use taskforce_core::service::seed::seed_default_users;
use taskforce_core::{
    Access, AuthError, AuthService, RegisterRequest, SqliteKeyValueStore, SqliteUserRepository,
    UserPatch, UserRole,
};

type SqliteAuth<'conn> = AuthService<SqliteUserRepository<'conn>, SqliteKeyValueStore<'conn>>;

fn auth(conn: &Connection) -> SqliteAuth<'_> {
    AuthService::new(
        SqliteUserRepository::new(conn),
        SqliteKeyValueStore::new(conn),
    )
}

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(seed_default_users(&conn).unwrap(), 4);
    conn
}

#[test]
fn default_accounts_can_sign_in() {
    let conn = seeded();
    let mut auth = auth(&conn);

    let admin = auth.login("admin@example.com", "admin123").unwrap();
    assert_eq!(admin.role, UserRole::Admin);
    let user = auth.login("USER@example.com", "user123").unwrap();
    assert_eq!(user.role, UserRole::User);
    let commander = auth
        .login("commander@taskforce.com", "commander123")
        .unwrap();
    assert_eq!(commander.name, "Task Force Commander");
    assert_eq!(auth.current_user(), Some(&commander));
}

#[test]
fn wrong_password_is_rejected_without_signing_in() {
    let conn = seeded();
    let mut auth = auth(&conn);

    let err = auth.login("admin@example.com", "admin124").unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(!auth.is_authenticated());
    assert!(matches!(
        auth.login("nobody@example.com", "admin123").unwrap_err(),
        AuthError::InvalidCredentials
    ));
}

#[test]
fn default_users_are_seeded_once() {
    let conn = seeded();
    assert_eq!(seed_default_users(&conn).unwrap(), 0);
    assert_eq!(auth(&conn).all_users().unwrap().len(), 4);
}

#[test]
fn session_token_survives_a_new_service() {
    let conn = seeded();
    let admin = auth(&conn)
        .login("sysadmin@example.com", "sysadmin123")
        .unwrap();

    let token = SqliteKeyValueStore::new(&conn)
        .get_value(AUTH_TOKEN_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(decode_token(&token), Some(admin.clone()));

    let mut restored = auth(&conn);
    assert_eq!(restored.restore_session().unwrap(), Some(admin));
    assert!(restored.is_authenticated());

    restored.logout().unwrap();
    assert!(!restored.is_authenticated());
    assert_eq!(
        SqliteKeyValueStore::new(&conn)
            .get_value(AUTH_TOKEN_KEY)
            .unwrap(),
        None
    );
}

#[test]
fn corrupt_token_is_removed_on_restore() {
    let conn = seeded();
    let store = SqliteKeyValueStore::new(&conn);
    store.set_value(AUTH_TOKEN_KEY, "%%% not a token").unwrap();

    let mut auth = auth(&conn);
    assert_eq!(auth.restore_session().unwrap(), None);
    assert_eq!(store.get_value(AUTH_TOKEN_KEY).unwrap(), None);
}

#[test]
fn token_of_deleted_account_is_removed_on_restore() {
    let conn = seeded();
    let mut ghost = auth(&conn).all_users().unwrap()[1].clone();
    ghost.id = "gone".to_string();
    let store = SqliteKeyValueStore::new(&conn);
    store.set_value(AUTH_TOKEN_KEY, &encode_token(&ghost)).unwrap();

    let mut auth = auth(&conn);
    assert_eq!(auth.restore_session().unwrap(), None);
    assert!(!auth.is_authenticated());
    assert_eq!(store.get_value(AUTH_TOKEN_KEY).unwrap(), None);
}

#[test]
fn register_defaults_to_user_role_and_signs_in() {
    let conn = seeded();
    let mut auth = auth(&conn);

    let user = auth
        .register(&RegisterRequest::new(" Noa ", "noa@taskforce.com", "pw123456"))
        .unwrap();
    assert_eq!(user.role, UserRole::User);
    assert_eq!(user.name, "Noa");
    assert_eq!(auth.current_user(), Some(&user));

    auth.logout().unwrap();
    assert_eq!(auth.login("noa@taskforce.com", "pw123456").unwrap(), user);
}

#[test]
fn register_rejects_duplicate_email_and_password_mismatch() {
    let conn = seeded();
    let mut auth = auth(&conn);

    let err = auth
        .register(&RegisterRequest::new("Other", "Admin@Example.com", "x1"))
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken(_)));
    assert_eq!(err.to_string(), "משתמש עם אימייל זה כבר קיים");

    let request = RegisterRequest {
        confirm_password: Some("two".to_string()),
        ..RegisterRequest::new("Noa", "noa@taskforce.com", "one")
    };
    let err = auth.register(&request).unwrap_err();
    assert_eq!(err.to_string(), "הסיסמאות אינן תואמות");
    assert!(!auth.is_authenticated());
}

#[test]
fn authorize_distinguishes_guest_forbidden_and_granted() {
    let conn = seeded();
    let mut auth = auth(&conn);
    let admin_only = [UserRole::Admin];

    assert_eq!(auth.authorize(&admin_only), Access::Unauthenticated);
    assert!(matches!(
        auth.require_role(&admin_only).unwrap_err(),
        AuthError::NotAuthenticated
    ));

    auth.login("user@example.com", "user123").unwrap();
    assert_eq!(auth.authorize(&admin_only), Access::Forbidden);
    assert_eq!(
        auth.authorize(&[UserRole::Admin, UserRole::User]),
        Access::Granted
    );
    assert!(matches!(
        auth.require_role(&admin_only).unwrap_err(),
        AuthError::Forbidden(UserRole::User)
    ));
}

#[test]
fn updating_current_user_reissues_token() {
    let conn = seeded();
    let mut auth = auth(&conn);
    let admin = auth.login("admin@example.com", "admin123").unwrap();

    let patch = UserPatch {
        name: Some("Chief Admin".to_string()),
        ..UserPatch::default()
    };
    let updated = auth.update_user(&admin.id, &patch).unwrap();
    assert_eq!(updated.name, "Chief Admin");
    assert_eq!(auth.current_user(), Some(&updated));

    let token = SqliteKeyValueStore::new(&conn)
        .get_value(AUTH_TOKEN_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(decode_token(&token).map(|user| user.name), Some("Chief Admin".to_string()));

    assert!(matches!(
        auth.update_user("missing", &patch).unwrap_err(),
        AuthError::UserNotFound(_)
    ));
}

#[test]
fn user_patch_is_trimmed_before_it_is_returned_and_reissued() {
    let conn = seeded();
    let mut auth = auth(&conn);
    let admin = auth.login("admin@example.com", "admin123").unwrap();

    let patch = UserPatch {
        name: Some("  Chief Admin ".to_string()),
        email: Some(" chief@example.com  ".to_string()),
        role: None,
    };
    let updated = auth.update_user(&admin.id, &patch).unwrap();
    assert_eq!(updated.name, "Chief Admin");
    assert_eq!(updated.email, "chief@example.com");

    let token = SqliteKeyValueStore::new(&conn)
        .get_value(AUTH_TOKEN_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(decode_token(&token), Some(updated.clone()));

    let unchanged = auth.update_user(&admin.id, &UserPatch::default()).unwrap();
    assert_eq!(unchanged, updated);
}

#[test]
fn signed_in_account_cannot_delete_itself() {
    let conn = seeded();
    let mut auth = auth(&conn);
    let admin = auth.login("admin@example.com", "admin123").unwrap();

    assert!(matches!(
        auth.delete_user(&admin.id).unwrap_err(),
        AuthError::CannotDeleteSelf
    ));

    let regular = auth
        .all_users()
        .unwrap()
        .into_iter()
        .find(|user| user.email == "user@example.com")
        .unwrap();
    assert_eq!(auth.delete_user(&regular.id).unwrap(), regular);
    assert_eq!(auth.all_users().unwrap().len(), 3);
    assert!(matches!(
        auth.delete_user(&regular.id).unwrap_err(),
        AuthError::UserNotFound(_)
    ));
}
