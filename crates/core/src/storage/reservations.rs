//! Reservation ledger storage
//!
//! Date-ranged bookings per room. Dates are stored as `YYYY-MM-DD` text so
//! the half-open overlap predicate can be evaluated directly in SQL.

use rusqlite::{params, Connection};
use tracing::instrument;

use super::parse::{format_date, now_string, parse_date, parse_datetime, parse_enum, OptionalExt};
use crate::error::Result;
use crate::models::{
    Reservation, ReservationDetail, ReservationId, ReservationRequest, ReservationStatus, RoomId,
    StayDates,
};

const RESERVATION_COLUMNS: &str = "r.id, r.room_id, r.guest_name, r.guest_email, \
    r.check_in_date, r.check_out_date, r.number_of_guests, r.special_requests, r.status, \
    r.created_at, r.updated_at";

pub struct ReservationStore<'a> {
    conn: &'a Connection,
}

impl<'a> ReservationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a confirmed reservation and return it with its assigned id
    #[instrument(skip(self, request), fields(room_id = request.room_id))]
    pub(crate) fn insert_confirmed(&self, request: &ReservationRequest) -> Result<Reservation> {
        let now = now_string();
        self.conn.execute(
            "INSERT INTO reservations
                (room_id, guest_name, guest_email, check_in_date, check_out_date,
                 number_of_guests, special_requests, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                request.room_id,
                request.guest_name,
                request.guest_email,
                format_date(request.stay.check_in()),
                format_date(request.stay.check_out()),
                request.number_of_guests,
                request.special_requests,
                ReservationStatus::Confirmed.as_str(),
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        Ok(Reservation {
            id,
            room_id: request.room_id,
            guest_name: request.guest_name.clone(),
            guest_email: request.guest_email.clone(),
            check_in_date: request.stay.check_in(),
            check_out_date: request.stay.check_out(),
            number_of_guests: request.number_of_guests,
            special_requests: request.special_requests.clone(),
            status: ReservationStatus::Confirmed,
            created_at: parse_datetime(&now)?,
            updated_at: parse_datetime(&now)?,
        })
    }

    /// Find reservation by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations r WHERE r.id = ?1");
        let reservation = self
            .conn
            .query_row(&sql, params![id], Self::map_reservation)
            .optional()?;
        Ok(reservation)
    }

    /// Find reservation with its room number and floor
    pub fn find_detail(&self, id: ReservationId) -> Result<Option<ReservationDetail>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS}, rm.room_number, rm.floor
             FROM reservations r
             JOIN rooms rm ON rm.id = r.room_id
             WHERE r.id = ?1"
        );
        let detail = self
            .conn
            .query_row(&sql, params![id], Self::map_detail)
            .optional()?;
        Ok(detail)
    }

    /// Confirmed reservations on a room overlapping `stay` (half-open)
    #[instrument(skip(self))]
    pub fn overlapping(&self, room_id: RoomId, stay: &StayDates) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations r
             WHERE r.room_id = ?1
               AND r.status = ?2
               AND r.check_in_date < ?3
               AND r.check_out_date > ?4
             ORDER BY r.check_in_date, r.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reservations = stmt
            .query_map(
                params![
                    room_id,
                    ReservationStatus::Confirmed.as_str(),
                    format_date(stay.check_out()),
                    format_date(stay.check_in()),
                ],
                Self::map_reservation,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reservations)
    }

    /// Whether any confirmed reservation on the room overlaps `stay`
    pub fn has_overlap(&self, room_id: RoomId, stay: &StayDates) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reservations
             WHERE room_id = ?1 AND status = ?2 AND check_in_date < ?3 AND check_out_date > ?4",
            params![
                room_id,
                ReservationStatus::Confirmed.as_str(),
                format_date(stay.check_out()),
                format_date(stay.check_in()),
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Confirmed reservations on a room ordered by check-in date
    pub fn confirmed_for_room(&self, room_id: RoomId) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations r
             WHERE r.room_id = ?1 AND r.status = ?2
             ORDER BY r.check_in_date, r.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reservations = stmt
            .query_map(
                params![room_id, ReservationStatus::Confirmed.as_str()],
                Self::map_reservation,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reservations)
    }

    /// Confirmed reservations across all rooms ordered by check-in date
    pub fn confirmed_details(&self) -> Result<Vec<ReservationDetail>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS}, rm.room_number, rm.floor
             FROM reservations r
             JOIN rooms rm ON rm.id = r.room_id
             WHERE r.status = ?1
             ORDER BY r.check_in_date, r.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let details = stmt
            .query_map(
                params![ReservationStatus::Confirmed.as_str()],
                Self::map_detail,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(details)
    }

    /// Move a reservation from `from` to `to`.
    ///
    /// Returns false if the row was not in `from`, leaving it untouched.
    pub(crate) fn transition(
        &self,
        id: ReservationId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![to.as_str(), now_string(), id, from.as_str()],
        )?;
        Ok(updated == 1)
    }

    fn map_reservation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reservation> {
        Ok(Reservation {
            id: row.get(0)?,
            room_id: row.get(1)?,
            guest_name: row.get(2)?,
            guest_email: row.get(3)?,
            check_in_date: parse_date(&row.get::<_, String>(4)?)?,
            check_out_date: parse_date(&row.get::<_, String>(5)?)?,
            number_of_guests: row.get(6)?,
            special_requests: row.get(7)?,
            status: parse_enum(&row.get::<_, String>(8)?)?,
            created_at: parse_datetime(&row.get::<_, String>(9)?)?,
            updated_at: parse_datetime(&row.get::<_, String>(10)?)?,
        })
    }

    fn map_detail(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReservationDetail> {
        Ok(ReservationDetail {
            reservation: Self::map_reservation(row)?,
            room_number: row.get(11)?,
            floor: row.get(12)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRoom;
    use crate::storage::Database;

    fn stay(a: &str, b: &str) -> StayDates {
        StayDates::parse(a, b).unwrap()
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = Database::open_in_memory().unwrap();
        db.rooms().create(&NewRoom::new(101, "101", 1)).unwrap();

        let request = ReservationRequest::new(101, "Alice", stay("2024-01-10", "2024-01-12"))
            .with_email("alice@example.com")
            .with_guests(2)
            .with_special_requests("Late arrival");
        let inserted = db.reservations().insert_confirmed(&request).unwrap();

        let found = db.reservations().find_by_id(inserted.id).unwrap().unwrap();
        assert_eq!(found, inserted);
        assert_eq!(found.guest_email.as_deref(), Some("alice@example.com"));
        assert_eq!(found.number_of_guests, 2);
        assert_eq!(found.stay().nights(), 2);
    }

    #[test]
    fn test_transition_requires_expected_status() {
        let db = Database::open_in_memory().unwrap();
        db.rooms().create(&NewRoom::new(101, "101", 1)).unwrap();
        let request = ReservationRequest::new(101, "Alice", stay("2024-01-10", "2024-01-12"));
        let id = db.reservations().insert_confirmed(&request).unwrap().id;

        let store = db.reservations();
        assert!(store
            .transition(id, ReservationStatus::Confirmed, ReservationStatus::Cancelled)
            .unwrap());
        assert!(!store
            .transition(id, ReservationStatus::Confirmed, ReservationStatus::Completed)
            .unwrap());
        assert_eq!(
            store.find_by_id(id).unwrap().unwrap().status,
            ReservationStatus::Cancelled
        );
        assert!(!store.has_overlap(101, &stay("2024-01-10", "2024-01-12")).unwrap());
    }

    #[test]
    fn test_unknown_room_rejected_by_foreign_key() {
        let db = Database::open_in_memory().unwrap();
        let request = ReservationRequest::new(404, "Alice", stay("2024-01-10", "2024-01-12"));
        assert!(db.reservations().insert_confirmed(&request).is_err());
    }
}
