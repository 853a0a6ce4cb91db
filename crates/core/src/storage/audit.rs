//! Audit trail storage
//!
//! Append-only: this store exposes inserts and reads, nothing else, and the
//! schema rejects UPDATE/DELETE on both tables.

use rusqlite::{params, Connection};

use super::parse::{now_string, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{
    ReservationAction, ReservationId, ReservationLog, RoomId, RoomStatus, StatusLog,
};

pub struct AuditStore<'a> {
    conn: &'a Connection,
}

impl<'a> AuditStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append one room transition
    pub(crate) fn append_status(
        &self,
        room_id: RoomId,
        previous: RoomStatus,
        new: RoomStatus,
        changed_by: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO room_status_logs (room_id, previous_status, new_status, changed_by, changed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                room_id,
                previous.as_str(),
                new.as_str(),
                changed_by,
                now_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append one reservation lifecycle event
    pub(crate) fn append_reservation(
        &self,
        reservation_id: ReservationId,
        action: ReservationAction,
        changed_by: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO reservation_logs (reservation_id, action, changed_by, changed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![reservation_id, action.as_str(), changed_by, now_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Status transitions of a room in write order
    pub fn status_history(&self, room_id: RoomId) -> Result<Vec<StatusLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, room_id, previous_status, new_status, changed_by, changed_at
             FROM room_status_logs WHERE room_id = ?1 ORDER BY id",
        )?;
        let logs = stmt
            .query_map(params![room_id], |row| {
                Ok(StatusLog {
                    id: row.get(0)?,
                    room_id: row.get(1)?,
                    previous_status: parse_enum(&row.get::<_, String>(2)?)?,
                    new_status: parse_enum(&row.get::<_, String>(3)?)?,
                    changed_by: row.get(4)?,
                    changed_at: parse_datetime(&row.get::<_, String>(5)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Lifecycle events of a reservation in write order
    pub fn reservation_history(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Vec<ReservationLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, reservation_id, action, changed_by, changed_at
             FROM reservation_logs WHERE reservation_id = ?1 ORDER BY id",
        )?;
        let logs = stmt
            .query_map(params![reservation_id], |row| {
                Ok(ReservationLog {
                    id: row.get(0)?,
                    reservation_id: row.get(1)?,
                    action: parse_enum::<ReservationAction>(&row.get::<_, String>(2)?)?,
                    changed_by: row.get(3)?,
                    changed_at: parse_datetime(&row.get::<_, String>(4)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub fn count_status_logs(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM room_status_logs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn count_reservation_logs(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM reservation_logs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
