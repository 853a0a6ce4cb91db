//! User storage operations

use rusqlite::{params, Connection, ErrorCode};
use tracing::{info, instrument};

use super::parse::{now_string, parse_datetime, parse_datetime_opt, OptionalExt};
use crate::error::{Error, Result, ValidationError};
use crate::models::{User, UserId};

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new user. The hash is produced and checked by the caller.
    #[instrument(skip(self, password_hash))]
    pub fn create(&self, username: &str, password_hash: &str) -> Result<User> {
        if username.trim().is_empty() {
            return Err(ValidationError::EmptyField("username").into());
        }

        let inserted = self.conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, now_string()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(Error::Conflict(format!("Username '{username}' already exists")));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        info!(user_id = id, "Created user");
        self.find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("User {id}")))
    }

    /// Find user by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_hash, created_at, last_login FROM users WHERE id = ?1",
                params![id],
                Self::map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Find user by username
    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_hash, created_at, last_login FROM users WHERE username = ?1",
                params![username],
                Self::map_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn exists(&self, id: UserId) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Update last login time
    pub fn touch_login(&self, id: UserId) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![now_string(), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("User {id}")));
        }
        Ok(())
    }

    fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: parse_datetime(&row.get::<_, String>(3)?)?,
            last_login: parse_datetime_opt(row.get(4)?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_lookup() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();

        let user = db.users().create("frontdesk", "hash").unwrap();
        assert!(db.users().exists(user.id).unwrap());
        assert_eq!(
            db.users().find_by_username("frontdesk").unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(user.last_login.is_none());

        db.users().touch_login(user.id).unwrap();
        let user = db.users().find_by_id(user.id).unwrap().unwrap();
        assert!(user.last_login.is_some());
    }

    #[test]
    fn test_duplicate_username() {
        let db = Database::open_in_memory().unwrap();
        db.users().create("frontdesk", "hash").unwrap();
        assert!(matches!(
            db.users().create("frontdesk", "other"),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let db = Database::open_in_memory().unwrap();
        let user = db.users().create("frontdesk", "secret-hash").unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
