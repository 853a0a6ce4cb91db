//! Notification ring
//!
//! Per-user bounded history. Before each insert the user's oldest rows are
//! evicted so that, counting the new row, at most `capacity` remain. Reads are
//! most-recent-first. Eviction and insert share one transaction.

use tracing::{debug, info, instrument};

use crate::error::{Error, Result, ValidationError};
use crate::invariants;
use crate::models::{Notification, NotificationId, NotificationType, UserId};
use crate::storage::{Database, NotificationStore, UserStore};

pub struct NotificationRing<'a> {
    db: &'a Database,
}

impl<'a> NotificationRing<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn capacity(&self) -> u32 {
        self.db.config().notification_capacity
    }

    /// Append a message to a user's history
    #[instrument(skip(self, message))]
    pub fn push(
        &self,
        user_id: UserId,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<NotificationId> {
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyField("message").into());
        }

        let capacity = self.capacity();
        let id = self.db.atomic(|conn| {
            if !UserStore::new(conn).exists(user_id)? {
                return Err(Error::NotFound(format!("User {user_id}")));
            }

            let store = NotificationStore::new(conn);
            if store.count_for_user(user_id)? >= u64::from(capacity) {
                let evicted = store.retain_newest(user_id, capacity - 1)?;
                debug!(evicted, "Evicted oldest notifications");
            }
            store.insert(user_id, message, notification_type)
        })?;

        info!(notification_id = id, "Added notification for user {}", user_id);
        Ok(id)
    }

    /// A user's notifications, newest first
    pub fn list(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let notifications = self.db.notifications().newest(user_id, self.capacity())?;
        invariants::assert_ring_invariants(&notifications, self.capacity());
        Ok(notifications)
    }
}
