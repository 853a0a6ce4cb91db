//! Availability resolver
//!
//! Decides whether a room can take a new stay and, if so, books it. Booking
//! is one transaction: conflict check, ledger insert, room transition to
//! `reserved` and both audit rows commit together or not at all.

use tracing::{info, instrument, warn};

use super::transitions::{self, Transition};
use crate::error::{Error, Result, ValidationError};
use crate::invariants;
use crate::models::{
    ReservationAction, ReservationRequest, Reserved, RoomAvailability, RoomId, RoomStatus,
    StayDates,
};
use crate::storage::{AuditStore, Database, ReservationStore, RoomStore};

pub struct AvailabilityResolver<'a> {
    db: &'a Database,
}

impl<'a> AvailabilityResolver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Enforce the stay length policy.
    ///
    /// Ordering (`check_in < check_out`) is already guaranteed by `StayDates`.
    pub fn validate_stay(&self, stay: &StayDates) -> std::result::Result<(), ValidationError> {
        let max = self.db.config().max_stay_nights;
        let nights = stay.nights();
        if nights > max {
            return Err(ValidationError::StayTooLong { nights, max });
        }
        Ok(())
    }

    /// Whether `room_id` has no confirmed reservation overlapping `stay`
    #[instrument(skip(self))]
    pub fn check_availability(&self, room_id: RoomId, stay: &StayDates) -> Result<bool> {
        if !self.db.rooms().exists(room_id)? {
            return Err(Error::NotFound(format!("Room {room_id}")));
        }
        let taken = self.db.reservations().has_overlap(room_id, stay)?;
        Ok(!taken)
    }

    /// Availability of every room for `stay`, by floor then room number
    #[instrument(skip(self))]
    pub fn availability_for_all(&self, stay: &StayDates) -> Result<Vec<RoomAvailability>> {
        let ledger = self.db.reservations();
        self.db
            .rooms()
            .list_by_floor()?
            .into_iter()
            .map(|room| -> Result<RoomAvailability> {
                let available = !ledger.has_overlap(room.id, stay)?;
                Ok(RoomAvailability {
                    room_id: room.id,
                    room_number: room.room_number,
                    floor: room.floor,
                    available,
                })
            })
            .collect()
    }

    /// Book a room.
    ///
    /// Resubmitting an identical request after success is not deduplicated:
    /// it runs a fresh conflict check and fails with `Conflict`.
    #[instrument(
        skip(self, request),
        fields(
            room_id = request.room_id,
            check_in = %request.stay.check_in(),
            check_out = %request.stay.check_out()
        )
    )]
    pub fn reserve(&self, request: ReservationRequest) -> Result<Reserved> {
        if let Err(e) = self.validate_request(&request) {
            warn!(reason = %e, "Rejected reservation request");
            return Err(e.into());
        }

        let room_id = request.room_id;
        let stay = request.stay;
        let guest = request.guest_name.as_str();

        let reserved = self.db.atomic(|conn| {
            if !RoomStore::new(conn).exists(room_id)? {
                return Err(Error::NotFound(format!("Room {room_id}")));
            }

            let ledger = ReservationStore::new(conn);
            let conflicts = ledger.overlapping(room_id, &stay)?;
            if !conflicts.is_empty() {
                let ids: Vec<String> = conflicts.iter().map(|r| r.id.to_string()).collect();
                return Err(Error::Conflict(format!(
                    "Room is not available for these dates ({} to {}, conflicts with reservation {})",
                    stay.check_in(),
                    stay.check_out(),
                    ids.join(", ")
                )));
            }

            let reservation = ledger.insert_confirmed(&request)?;
            let room_status_update = transitions::apply(
                conn,
                room_id,
                Transition::Set {
                    status: RoomStatus::Reserved,
                    changed_by: guest,
                },
            )?;
            AuditStore::new(conn).append_reservation(
                reservation.id,
                ReservationAction::Created,
                guest,
            )?;

            if cfg!(debug_assertions) {
                invariants::assert_no_overlap(&ledger.confirmed_for_room(room_id)?);
            }

            Ok(Reserved {
                reservation,
                room_status_update,
            })
        });

        match &reserved {
            Ok(r) => info!(
                reservation_id = r.reservation.id,
                previous_status = %r.room_status_update.previous_status,
                "Created reservation for guest {} in room {}", guest, room_id
            ),
            Err(e) => warn!(error = %e, "Reservation not created"),
        }
        reserved
    }

    fn validate_request(
        &self,
        request: &ReservationRequest,
    ) -> std::result::Result<(), ValidationError> {
        if request.guest_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("guest_name"));
        }
        if request.number_of_guests == 0 {
            return Err(ValidationError::NoGuests);
        }
        self.validate_stay(&request.stay)
    }
}
