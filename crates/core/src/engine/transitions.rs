//! Room status transition machine
//!
//! Every state can reach every other state; the machine only guarantees that
//! each transition reads the true current status, writes the new one and
//! appends exactly one audit row, all inside a single transaction. Which
//! transition to request is the caller's decision.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::{Error, Result, ValidationError};
use crate::invariants;
use crate::models::{RoomId, RoomStatus, StatusChange, StatusLog, SYSTEM_ACTOR};
use crate::storage::{AuditStore, Database, RoomStore};

/// Attribution used when a departing room has no recorded guest
const UNKNOWN_GUEST: &str = "Unknown";

/// Which entry point drives a transition, and therefore its side effects
#[derive(Debug, Clone, Copy)]
pub(crate) enum Transition<'a> {
    /// Occupy the room: set guest, stamp check-in time
    CheckIn { guest_name: &'a str },
    /// Release the room: clear guest, stamp check-out time
    CheckOut,
    /// Status column only
    Set {
        status: RoomStatus,
        changed_by: &'a str,
    },
}

/// Apply one transition on an open transaction.
///
/// Shared with the availability resolver so a reservation's room update is
/// part of the reservation's own transaction.
pub(crate) fn apply(
    conn: &Connection,
    room_id: RoomId,
    transition: Transition<'_>,
) -> Result<StatusChange> {
    let rooms = RoomStore::new(conn);
    let room = rooms.get(room_id)?;
    let previous_status = room.status;

    let (new_status, changed_by) = match transition {
        Transition::CheckIn { guest_name } => {
            rooms.write_check_in(room_id, guest_name)?;
            (RoomStatus::CheckedIn, guest_name.to_string())
        }
        Transition::CheckOut => {
            rooms.write_check_out(room_id)?;
            let departing = room.guest_name.unwrap_or_else(|| UNKNOWN_GUEST.to_string());
            (RoomStatus::Vacant, departing)
        }
        Transition::Set { status, changed_by } => {
            rooms.write_status(room_id, status)?;
            (status, changed_by.to_string())
        }
    };

    AuditStore::new(conn).append_status(room_id, previous_status, new_status, &changed_by)?;

    if cfg!(debug_assertions) {
        invariants::assert_room_invariants(&rooms.get(room_id)?);
    }

    Ok(StatusChange {
        room_id,
        previous_status,
        new_status,
    })
}

/// Drives room status changes requested by collaborators
pub struct StatusMachine<'a> {
    db: &'a Database,
}

impl<'a> StatusMachine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Check a guest into a room
    #[instrument(skip(self))]
    pub fn check_in(&self, room_id: RoomId, guest_name: &str) -> Result<StatusChange> {
        if guest_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("guest_name").into());
        }

        let change = self
            .db
            .atomic(|conn| apply(conn, room_id, Transition::CheckIn { guest_name }))?;
        info!(
            previous = %change.previous_status,
            "Guest {} checked in to room {}", guest_name, room_id
        );
        Ok(change)
    }

    /// Check the current guest out, returning the room to vacant
    #[instrument(skip(self))]
    pub fn check_out(&self, room_id: RoomId) -> Result<StatusChange> {
        let change = self
            .db
            .atomic(|conn| apply(conn, room_id, Transition::CheckOut))?;
        info!(previous = %change.previous_status, "Room {} checked out", room_id);
        Ok(change)
    }

    /// Direct status edit. Any status may follow any other.
    #[instrument(skip(self))]
    pub fn set_status(&self, room_id: RoomId, status: RoomStatus) -> Result<StatusChange> {
        let change = self.db.atomic(|conn| {
            apply(
                conn,
                room_id,
                Transition::Set {
                    status,
                    changed_by: SYSTEM_ACTOR,
                },
            )
        })?;
        info!(
            "Updated room {} status from {} to {}",
            room_id, change.previous_status, change.new_status
        );
        Ok(change)
    }

    /// Status edit from an unvalidated name, as received from a collaborator
    pub fn set_status_named(&self, room_id: RoomId, status: &str) -> Result<StatusChange> {
        let status = status.parse::<RoomStatus>()?;
        self.set_status(room_id, status)
    }

    /// Audit trail of a room, oldest first
    pub fn history(&self, room_id: RoomId) -> Result<Vec<StatusLog>> {
        if !self.db.rooms().exists(room_id)? {
            return Err(Error::NotFound(format!("Room {room_id}")));
        }
        self.db.audit().status_history(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRoom;

    fn db_with_room() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.rooms().create(&NewRoom::new(101, "101", 1)).unwrap();
        db
    }

    #[test]
    fn test_check_in_check_out_round_trip() {
        let db = db_with_room();
        let machine = db.transitions();

        let change = machine.check_in(101, "Alice").unwrap();
        assert_eq!(change.previous_status, RoomStatus::Vacant);
        assert_eq!(change.new_status, RoomStatus::CheckedIn);

        let room = db.rooms().get(101).unwrap();
        assert_eq!(room.status, RoomStatus::CheckedIn);
        assert_eq!(room.guest_name.as_deref(), Some("Alice"));
        assert!(room.check_in_time.is_some());

        let change = machine.check_out(101).unwrap();
        assert_eq!(change.previous_status, RoomStatus::CheckedIn);
        assert_eq!(change.new_status, RoomStatus::Vacant);

        let room = db.rooms().get(101).unwrap();
        assert_eq!(room.status, RoomStatus::Vacant);
        assert_eq!(room.guest_name, None);
        assert!(room.check_out_time.is_some());

        let logs = machine.history(101).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(
            (logs[0].previous_status, logs[0].new_status),
            (RoomStatus::Vacant, RoomStatus::CheckedIn)
        );
        assert_eq!(
            (logs[1].previous_status, logs[1].new_status),
            (RoomStatus::CheckedIn, RoomStatus::Vacant)
        );
        assert_eq!(logs[0].changed_by, "Alice");
        assert_eq!(logs[1].changed_by, "Alice");
    }

    #[test]
    fn test_previous_status_is_read_not_assumed() {
        let db = db_with_room();
        let machine = db.transitions();

        machine.set_status(101, RoomStatus::Reserved).unwrap();
        let change = machine.check_in(101, "Bob").unwrap();
        assert_eq!(change.previous_status, RoomStatus::Reserved);

        let logs = machine.history(101).unwrap();
        assert_eq!(logs[1].previous_status, RoomStatus::Reserved);
        assert_eq!(logs[1].new_status, RoomStatus::CheckedIn);
    }

    #[test]
    fn test_set_status_is_permissive() {
        let db = db_with_room();
        let machine = db.transitions();

        machine.check_in(101, "Carol").unwrap();
        let change = machine.set_status(101, RoomStatus::Reserved).unwrap();
        assert_eq!(change.previous_status, RoomStatus::CheckedIn);
        assert_eq!(change.new_status, RoomStatus::Reserved);

        // Same-state edits are still transitions and still audited
        machine.set_status(101, RoomStatus::Reserved).unwrap();
        let logs = machine.history(101).unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[2].changed_by, SYSTEM_ACTOR);
    }

    #[test]
    fn test_set_status_vacant_clears_guest() {
        let db = db_with_room();
        let machine = db.transitions();

        machine.check_in(101, "Dave").unwrap();
        machine.set_status(101, RoomStatus::Vacant).unwrap();
        assert_eq!(db.rooms().get(101).unwrap().guest_name, None);
    }

    #[test]
    fn test_invalid_status_name_is_validation_error() {
        let db = db_with_room();
        let err = db.transitions().set_status_named(101, "occupied").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidStatus(_))
        ));
        assert!(db.transitions().history(101).unwrap().is_empty());
    }

    #[test]
    fn test_missing_room_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let machine = db.transitions();

        assert!(matches!(machine.check_in(404, "Eve"), Err(Error::NotFound(_))));
        assert!(matches!(machine.check_out(404), Err(Error::NotFound(_))));
        assert!(matches!(
            machine.set_status(404, RoomStatus::Vacant),
            Err(Error::NotFound(_))
        ));
        assert_eq!(db.audit().count_status_logs().unwrap(), 0);
    }

    #[test]
    fn test_check_out_without_guest_attributes_unknown() {
        let db = db_with_room();
        db.transitions().check_out(101).unwrap();
        let logs = db.transitions().history(101).unwrap();
        assert_eq!(logs[0].changed_by, UNKNOWN_GUEST);
    }

    #[test]
    fn test_blank_guest_rejected() {
        let db = db_with_room();
        assert!(matches!(
            db.transitions().check_in(101, "  "),
            Err(Error::Validation(ValidationError::EmptyField("guest_name")))
        ));
    }
}
