//! Notification storage
//!
//! Raw row access for the notification ring. Capacity policy lives in
//! `engine::notifications`; this store only knows how to count, trim and insert.

use rusqlite::{params, Connection};

use super::parse::{now_string, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{Notification, NotificationId, NotificationType, UserId};

pub struct NotificationStore<'a> {
    conn: &'a Connection,
}

impl<'a> NotificationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn count_for_user(&self, user_id: UserId) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_notifications WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Delete everything except the `keep` most recent rows of a user.
    ///
    /// Recency is `created_at`, then row id for rows written in the same instant.
    pub(crate) fn retain_newest(&self, user_id: UserId, keep: u32) -> Result<u64> {
        let deleted = self.conn.execute(
            "DELETE FROM user_notifications
             WHERE user_id = ?1 AND id NOT IN (
                 SELECT id FROM user_notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2
             )",
            params![user_id, keep],
        )?;
        Ok(deleted as u64)
    }

    pub(crate) fn insert(
        &self,
        user_id: UserId,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<NotificationId> {
        self.conn.execute(
            "INSERT INTO user_notifications (user_id, message, notification_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, message, notification_type.as_str(), now_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent notifications first, at most `limit`
    pub fn newest(&self, user_id: UserId, limit: u32) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, message, notification_type, created_at
             FROM user_notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let notifications = stmt
            .query_map(params![user_id, limit], |row| {
                Ok(Notification {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message: row.get(2)?,
                    notification_type: parse_enum(&row.get::<_, String>(3)?)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notifications)
    }
}
