//! Reservation ledger
//!
//! Query surface over bookings plus the one mutation the ledger owns:
//! `confirmed -> cancelled`. Cancelling leaves the room's live status alone;
//! reverting it is a separate, explicit status transition.

use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::invariants;
use crate::models::{
    Reservation, ReservationAction, ReservationDetail, ReservationId, ReservationLog,
    ReservationStatus, RoomId, StayDates, SYSTEM_ACTOR,
};
use crate::storage::{AuditStore, Database, ReservationStore};

pub struct ReservationLedger<'a> {
    db: &'a Database,
}

impl<'a> ReservationLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Confirmed reservations on a room, optionally only those overlapping `range`
    pub fn list_active_for_room(
        &self,
        room_id: RoomId,
        range: Option<&StayDates>,
    ) -> Result<Vec<Reservation>> {
        let reservations = match range {
            Some(range) => self.db.reservations().overlapping(room_id, range)?,
            None => self.db.reservations().confirmed_for_room(room_id)?,
        };
        if cfg!(debug_assertions) {
            invariants::assert_no_overlap(&reservations);
        }
        Ok(reservations)
    }

    /// Confirmed reservations blocking `stay`; empty means the room is free
    pub fn find_conflicts(&self, room_id: RoomId, stay: &StayDates) -> Result<Vec<Reservation>> {
        self.db.reservations().overlapping(room_id, stay)
    }

    /// Reservation with its room number and floor
    pub fn find(&self, id: ReservationId) -> Result<ReservationDetail> {
        self.db
            .reservations()
            .find_detail(id)?
            .ok_or_else(|| Error::NotFound(format!("Reservation {id}")))
    }

    /// Every confirmed reservation, earliest check-in first
    pub fn list_confirmed(&self) -> Result<Vec<ReservationDetail>> {
        self.db.reservations().confirmed_details()
    }

    /// Cancel a confirmed reservation
    #[instrument(skip(self))]
    pub fn cancel(&self, id: ReservationId) -> Result<Reservation> {
        let cancelled = self.db.atomic(|conn| {
            let ledger = ReservationStore::new(conn);
            let current = ledger
                .find_by_id(id)?
                .ok_or_else(|| Error::NotFound(format!("Reservation {id}")))?;

            if !current.is_confirmed() {
                return Err(Error::InvalidState(format!(
                    "Only confirmed reservations can be cancelled (reservation {id} is {})",
                    current.status
                )));
            }

            let moved =
                ledger.transition(id, ReservationStatus::Confirmed, ReservationStatus::Cancelled)?;
            debug_assert!(moved, "reservation {id} left confirmed inside its own transaction");
            AuditStore::new(conn).append_reservation(
                id,
                ReservationAction::Cancelled,
                SYSTEM_ACTOR,
            )?;

            ledger
                .find_by_id(id)?
                .ok_or_else(|| Error::NotFound(format!("Reservation {id}")))
        })?;

        info!(room_id = cancelled.room_id, "Cancelled reservation {}", id);
        Ok(cancelled)
    }

    /// Audit trail of a reservation, oldest first
    pub fn history(&self, id: ReservationId) -> Result<Vec<ReservationLog>> {
        if self.db.reservations().find_by_id(id)?.is_none() {
            return Err(Error::NotFound(format!("Reservation {id}")));
        }
        self.db.audit().reservation_history(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRoom, ReservationRequest, RoomStatus};

    fn stay(a: &str, b: &str) -> StayDates {
        StayDates::parse(a, b).unwrap()
    }

    fn db_with_booking() -> (Database, ReservationId) {
        let db = Database::open_in_memory().unwrap();
        db.rooms().create(&NewRoom::new(101, "101", 1)).unwrap();
        let reserved = db
            .availability()
            .reserve(ReservationRequest::new(101, "Alice", stay("2024-01-10", "2024-01-12")))
            .unwrap();
        (db, reserved.reservation.id)
    }

    #[test]
    fn test_cancel_confirmed() {
        let (db, id) = db_with_booking();

        let cancelled = db.ledger().cancel(id).unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);

        let history = db.ledger().history(id).unwrap();
        let actions: Vec<_> = history.iter().map(|l| l.action).collect();
        assert_eq!(
            actions,
            vec![ReservationAction::Created, ReservationAction::Cancelled]
        );
        assert_eq!(history[1].changed_by, SYSTEM_ACTOR);
    }

    #[test]
    fn test_double_cancel_is_invalid_state() {
        let (db, id) = db_with_booking();
        db.ledger().cancel(id).unwrap();

        assert!(matches!(db.ledger().cancel(id), Err(Error::InvalidState(_))));
        // The failed attempt left no audit row
        assert_eq!(db.ledger().history(id).unwrap().len(), 2);
    }

    #[test]
    fn test_cancel_completed_is_invalid_state() {
        let (db, id) = db_with_booking();
        db.reservations()
            .transition(id, ReservationStatus::Confirmed, ReservationStatus::Completed)
            .unwrap();

        assert!(matches!(db.ledger().cancel(id), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_cancel_missing_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.ledger().cancel(42), Err(Error::NotFound(_))));
        assert!(matches!(db.ledger().find(42), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_cancel_does_not_revert_room() {
        let (db, id) = db_with_booking();
        db.ledger().cancel(id).unwrap();

        assert_eq!(db.rooms().get(101).unwrap().status, RoomStatus::Reserved);
        assert_eq!(db.audit().status_history(101).unwrap().len(), 1);
    }

    #[test]
    fn test_list_active_filters_by_range_and_status() {
        let (db, first) = db_with_booking();
        db.availability()
            .reserve(ReservationRequest::new(101, "Bob", stay("2024-01-20", "2024-01-22")))
            .unwrap();

        let all = db.ledger().list_active_for_room(101, None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].check_in_date < all[1].check_in_date);

        let january_tenth = db
            .ledger()
            .list_active_for_room(101, Some(&stay("2024-01-09", "2024-01-11")))
            .unwrap();
        assert_eq!(january_tenth.len(), 1);
        assert_eq!(january_tenth[0].id, first);

        db.ledger().cancel(first).unwrap();
        assert_eq!(db.ledger().list_active_for_room(101, None).unwrap().len(), 1);
    }

    #[test]
    fn test_find_conflicts_uses_half_open_rule() {
        let (db, id) = db_with_booking();
        let ledger = db.ledger();

        assert!(ledger
            .find_conflicts(101, &stay("2024-01-12", "2024-01-13"))
            .unwrap()
            .is_empty());
        assert!(ledger
            .find_conflicts(101, &stay("2024-01-08", "2024-01-10"))
            .unwrap()
            .is_empty());

        let hits = ledger
            .find_conflicts(101, &stay("2024-01-11", "2024-01-13"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
    }

    #[test]
    fn test_find_and_list_include_room_details() {
        let (db, id) = db_with_booking();

        let detail = db.ledger().find(id).unwrap();
        assert_eq!(detail.room_number, "101");
        assert_eq!(detail.floor, 1);

        let confirmed = db.ledger().list_confirmed().unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].reservation.id, id);
    }
}
