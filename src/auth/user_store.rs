//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{User, UserRole};
use crate::db::Database;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{info, warn};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, bio, created_at";

/// Result of trying to create an account
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(User),
    EmailTaken,
}

/// User storage with SQLite backend
pub struct UserStore {
    db: Database,
    bcrypt_cost: u32,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    /// Lower the bcrypt work factor; tests only need it to be correct, not slow.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::User),
            bio: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by ID
    pub fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.db.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Check credentials, returning the user when they match.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        match self.get_user_by_email(email)? {
            Some(user) => {
                let valid =
                    verify(password, &user.password_hash).context("Failed to verify password")?;
                Ok(valid.then_some(user))
            }
            None => Ok(None),
        }
    }

    /// Create a new user
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<CreateUserOutcome> {
        if self.get_user_by_email(email)?.is_some() {
            return Ok(CreateUserOutcome::EmailTaken);
        }

        // hash outside the connection lock
        let password_hash = hash(password, self.bcrypt_cost).context("Failed to hash password")?;
        let created_at = Utc::now().to_rfc3339();

        let conn = self.db.lock();
        let inserted = conn.execute(
            "INSERT INTO users (username, email, password_hash, role, bio, created_at)
             VALUES (?1, ?2, ?3, ?4, '', ?5)",
            params![username, email, password_hash, role.as_str(), created_at],
        );

        match inserted {
            Ok(_) => {}
            // lost a race with a concurrent registration for the same email
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Ok(CreateUserOutcome::EmailTaken);
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert user")),
        }

        let user = User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            bio: String::new(),
            created_at,
        };

        info!(user_id = user.id, role = user.role.as_str(), "✅ Created user");

        Ok(CreateUserOutcome::Created(user))
    }

    /// Update username and bio. Returns `None` if the user does not exist.
    pub fn update_profile(&self, id: i64, username: &str, bio: &str) -> Result<Option<User>> {
        let rows_affected = self.db.lock().execute(
            "UPDATE users SET username = ?1, bio = ?2 WHERE id = ?3",
            params![username, bio, id],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }
        self.get_user_by_id(id)
    }

    pub fn count_admins(&self) -> Result<i64> {
        let count = self
            .db
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = ?1",
                params![UserRole::Admin.as_str()],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;
        Ok(count)
    }

    /// Create the configured admin account if no admin exists yet.
    pub fn ensure_admin(&self, username: &str, email: &str, password: &str) -> Result<()> {
        if self.count_admins()? > 0 {
            return Ok(());
        }

        match self.create_user(username, email, password, UserRole::Admin)? {
            CreateUserOutcome::Created(admin) => {
                info!(user_id = admin.id, "🔐 Bootstrap admin account created");
            }
            CreateUserOutcome::EmailTaken => {
                warn!("⚠️  Admin bootstrap skipped: email already belongs to a regular user");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> UserStore {
        UserStore::new(Database::in_memory().unwrap()).with_bcrypt_cost(4)
    }

    fn created(outcome: CreateUserOutcome) -> User {
        match outcome {
            CreateUserOutcome::Created(user) => user,
            CreateUserOutcome::EmailTaken => panic!("email unexpectedly taken"),
        }
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let store = create_test_store();

        let user = created(
            store
                .create_user("sakura", "sakura@example.com", "password123", UserRole::User)
                .unwrap(),
        );
        assert_eq!(user.username, "sakura");
        assert_eq!(user.role, UserRole::User);
        assert_ne!(user.password_hash, "password123");

        let by_email = store.get_user_by_email("sakura@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = store.get_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "sakura@example.com");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = create_test_store();
        created(
            store
                .create_user("a", "dup@example.com", "password123", UserRole::User)
                .unwrap(),
        );

        let second = store
            .create_user("b", "dup@example.com", "password456", UserRole::User)
            .unwrap();
        assert!(matches!(second, CreateUserOutcome::EmailTaken));
    }

    #[test]
    fn test_password_verification() {
        let store = create_test_store();
        created(
            store
                .create_user("sakura", "sakura@example.com", "password123", UserRole::User)
                .unwrap(),
        );

        // Correct password
        assert!(store
            .verify_credentials("sakura@example.com", "password123")
            .unwrap()
            .is_some());

        // Incorrect password
        assert!(store
            .verify_credentials("sakura@example.com", "wrongpassword")
            .unwrap()
            .is_none());

        // Non-existent user
        assert!(store
            .verify_credentials("nobody@example.com", "password123")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_profile() {
        let store = create_test_store();
        let user = created(
            store
                .create_user("sakura", "sakura@example.com", "password123", UserRole::User)
                .unwrap(),
        );

        let updated = store
            .update_profile(user.id, "sakura-chan", "I like mecha")
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "sakura-chan");
        assert_eq!(updated.bio, "I like mecha");

        assert!(store.update_profile(9999, "ghost", "").unwrap().is_none());
    }

    #[test]
    fn test_ensure_admin_only_once() {
        let store = create_test_store();
        assert_eq!(store.count_admins().unwrap(), 0);

        store
            .ensure_admin("admin", "admin@example.com", "admin-password")
            .unwrap();
        store
            .ensure_admin("admin2", "admin2@example.com", "admin-password")
            .unwrap();

        assert_eq!(store.count_admins().unwrap(), 1);
        let admin = store.get_user_by_email("admin@example.com").unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(store.get_user_by_email("admin2@example.com").unwrap().is_none());
    }

    #[test]
    fn test_users_persist_across_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let store = UserStore::new(Database::open(path).unwrap()).with_bcrypt_cost(4);
        created(
            store
                .create_user("sakura", "sakura@example.com", "password123", UserRole::User)
                .unwrap(),
        );
        drop(store);

        let reopened = UserStore::new(Database::open(path).unwrap());
        assert!(reopened
            .get_user_by_email("sakura@example.com")
            .unwrap()
            .is_some());
    }
}
