//! Engine operation traits
//!
//! The operations collaborators call, independent of how they are stored.
//! `Database` implements all of them by delegating to the engine components.

use crate::error::Result;
use crate::models::{
    Notification, NotificationId, NotificationType, Reservation, ReservationId,
    ReservationRequest, Reserved, RoomId, RoomStatus, StatusChange, StayDates, UserId,
};
use crate::storage::Database;

/// Availability and booking operations
pub trait ReservationEngine {
    /// Whether the room has no confirmed reservation overlapping `stay`
    fn check_availability(&self, room_id: RoomId, stay: &StayDates) -> Result<bool>;

    /// Book a room; the room moves to `reserved` in the same unit
    fn reserve(&self, request: ReservationRequest) -> Result<Reserved>;

    /// Cancel a confirmed reservation
    fn cancel_reservation(&self, id: ReservationId) -> Result<Reservation>;

    /// Confirmed reservations on a room, optionally within a date range
    fn list_active_for_room(
        &self,
        room_id: RoomId,
        range: Option<&StayDates>,
    ) -> Result<Vec<Reservation>>;

    /// Confirmed reservations blocking `stay`
    fn find_conflicts(&self, room_id: RoomId, stay: &StayDates) -> Result<Vec<Reservation>>;
}

/// Room status transitions
pub trait RoomTransitions {
    fn check_in(&self, room_id: RoomId, guest_name: &str) -> Result<StatusChange>;

    fn check_out(&self, room_id: RoomId) -> Result<StatusChange>;

    fn set_status(&self, room_id: RoomId, status: RoomStatus) -> Result<StatusChange>;
}

/// Bounded per-user notification history
pub trait NotificationLog {
    fn push_notification(
        &self,
        user_id: UserId,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<NotificationId>;

    fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>>;
}

/// Combined engine interface
pub trait Engine: ReservationEngine + RoomTransitions + NotificationLog {}

impl<T> Engine for T where T: ReservationEngine + RoomTransitions + NotificationLog {}

// ============================================================================
// Database implementations
// ============================================================================

impl ReservationEngine for Database {
    fn check_availability(&self, room_id: RoomId, stay: &StayDates) -> Result<bool> {
        self.availability().check_availability(room_id, stay)
    }

    fn reserve(&self, request: ReservationRequest) -> Result<Reserved> {
        self.availability().reserve(request)
    }

    fn cancel_reservation(&self, id: ReservationId) -> Result<Reservation> {
        self.ledger().cancel(id)
    }

    fn list_active_for_room(
        &self,
        room_id: RoomId,
        range: Option<&StayDates>,
    ) -> Result<Vec<Reservation>> {
        self.ledger().list_active_for_room(room_id, range)
    }

    fn find_conflicts(&self, room_id: RoomId, stay: &StayDates) -> Result<Vec<Reservation>> {
        self.ledger().find_conflicts(room_id, stay)
    }
}

impl RoomTransitions for Database {
    fn check_in(&self, room_id: RoomId, guest_name: &str) -> Result<StatusChange> {
        self.transitions().check_in(room_id, guest_name)
    }

    fn check_out(&self, room_id: RoomId) -> Result<StatusChange> {
        self.transitions().check_out(room_id)
    }

    fn set_status(&self, room_id: RoomId, status: RoomStatus) -> Result<StatusChange> {
        self.transitions().set_status(room_id, status)
    }
}

impl NotificationLog for Database {
    fn push_notification(
        &self,
        user_id: UserId,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<NotificationId> {
        self.notification_ring().push(user_id, message, notification_type)
    }

    fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.notification_ring().list(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRoom;

    fn front_desk_shift(engine: &impl Engine, user_id: UserId) -> Result<()> {
        let stay = StayDates::parse("2024-03-01", "2024-03-03")?;
        let reserved = engine.reserve(ReservationRequest::new(101, "Alice", stay))?;
        assert!(!engine.check_availability(101, &stay)?);
        assert_eq!(engine.find_conflicts(101, &stay)?.len(), 1);

        engine.check_in(101, "Alice")?;
        engine.check_out(101)?;
        engine.set_status(101, RoomStatus::Vacant)?;

        engine.cancel_reservation(reserved.reservation.id)?;
        assert!(engine.list_active_for_room(101, None)?.is_empty());

        engine.push_notification(user_id, "Room 101 turned over", NotificationType::Success)?;
        Ok(())
    }

    #[test]
    fn test_database_drives_engine_traits() {
        let db = Database::open_in_memory().unwrap();
        db.rooms().create(&NewRoom::new(101, "101", 1)).unwrap();
        let user = db.users().create("frontdesk", "hash").unwrap();

        front_desk_shift(&db, user.id).unwrap();

        let notes = db.list_notifications(user.id).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(db.audit().count_status_logs().unwrap(), 4);
        assert_eq!(db.audit().count_reservation_logs().unwrap(), 2);
    }
}
