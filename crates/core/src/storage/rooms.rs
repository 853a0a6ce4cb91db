//! Room registry storage
//!
//! Canonical state of each physical room. Status, guest and timestamp
//! columns are only written through the status transition machine.

use rusqlite::{params, Connection, ErrorCode};
use tracing::{info, instrument};

use super::parse::{now_string, parse_datetime, parse_datetime_opt, parse_enum, OptionalExt};
use super::reservations::ReservationStore;
use crate::error::{Error, Result};
use crate::models::{NewRoom, Room, RoomId, RoomOverview, RoomStatus, StatusCount};

const ROOM_COLUMNS: &str = "id, room_number, floor, status, guest_name, check_in_time, \
                            check_out_time, created_at, updated_at";

/// Rooms inserted by `seed_sample_rooms`: five per floor on floors 1-3
const SAMPLE_FLOORS: [i64; 3] = [1, 2, 3];
const ROOMS_PER_FLOOR: i64 = 5;

pub struct RoomStore<'a> {
    conn: &'a Connection,
}

impl<'a> RoomStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a room
    #[instrument(skip(self, room), fields(room_id = room.id, room_number = %room.room_number))]
    pub fn create(&self, room: &NewRoom) -> Result<Room> {
        if room.room_number.trim().is_empty() {
            return Err(crate::error::ValidationError::EmptyField("room_number").into());
        }

        let now = now_string();
        let guest = match room.status {
            RoomStatus::Vacant => None,
            _ => room.guest_name.as_deref(),
        };
        let inserted = self.conn.execute(
            "INSERT INTO rooms (id, room_number, floor, status, guest_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                room.id,
                room.room_number,
                room.floor,
                room.status.as_str(),
                guest,
                now,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(Error::Conflict(format!(
                    "Room {} or number '{}' already exists",
                    room.id, room.room_number
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!("Created room");
        self.find_by_id(room.id)?
            .ok_or_else(|| Error::NotFound(format!("Room {}", room.id)))
    }

    /// Find room by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: RoomId) -> Result<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1");
        let room = self
            .conn
            .query_row(&sql, params![id], Self::map_room)
            .optional()?;
        Ok(room)
    }

    /// Find a room or fail with `NotFound`
    pub fn get(&self, id: RoomId) -> Result<Room> {
        self.find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Room {id}")))
    }

    pub fn exists(&self, id: RoomId) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM rooms WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All rooms ordered by room number
    pub fn list(&self) -> Result<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY room_number");
        let mut stmt = self.conn.prepare(&sql)?;
        let rooms = stmt
            .query_map([], Self::map_room)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    /// All rooms ordered by floor, then room number
    pub fn list_by_floor(&self) -> Result<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY floor, room_number");
        let mut stmt = self.conn.prepare(&sql)?;
        let rooms = stmt
            .query_map([], Self::map_room)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rooms)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Number of rooms per status; statuses with no rooms are omitted
    pub fn status_summary(&self) -> Result<Vec<StatusCount>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM rooms GROUP BY status ORDER BY status")?;
        let summary = stmt
            .query_map([], |row| {
                Ok(StatusCount {
                    status: parse_enum(&row.get::<_, String>(0)?)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(summary)
    }

    /// Every room by room number, each with its confirmed reservations
    pub fn list_with_bookings(&self) -> Result<Vec<RoomOverview>> {
        let ledger = ReservationStore::new(self.conn);
        self.list()?
            .into_iter()
            .map(|room| -> Result<RoomOverview> {
                let reservations = ledger.confirmed_for_room(room.id)?;
                Ok(RoomOverview { room, reservations })
            })
            .collect()
    }

    /// Insert the demo rooms when the registry is empty.
    ///
    /// Returns how many rooms were inserted (zero if any room already exists).
    /// Runs on the caller's transaction; see `Database::seed_sample_rooms`.
    #[instrument(skip(self))]
    pub(crate) fn seed_sample_rooms(&self) -> Result<u64> {
        if self.count()? > 0 {
            return Ok(0);
        }

        let mut inserted = 0;
        for floor in SAMPLE_FLOORS {
            for n in 1..=ROOMS_PER_FLOOR {
                let id = floor * 100 + n;
                self.create(&NewRoom::new(id, id.to_string(), floor))?;
                inserted += 1;
            }
        }

        info!(inserted, "Seeded sample rooms");
        Ok(inserted)
    }

    /// Overwrite the status column. Callers append the audit row.
    pub(crate) fn write_status(&self, id: RoomId, status: RoomStatus) -> Result<()> {
        // Returning to vacant always releases the guest
        let sql = if status == RoomStatus::Vacant {
            "UPDATE rooms SET status = ?1, guest_name = NULL, updated_at = ?2 WHERE id = ?3"
        } else {
            "UPDATE rooms SET status = ?1, updated_at = ?2 WHERE id = ?3"
        };
        self.conn
            .execute(sql, params![status.as_str(), now_string(), id])?;
        Ok(())
    }

    /// Mark a guest as checked in
    pub(crate) fn write_check_in(&self, id: RoomId, guest_name: &str) -> Result<()> {
        let now = now_string();
        self.conn.execute(
            "UPDATE rooms SET status = ?1, guest_name = ?2, check_in_time = ?3, updated_at = ?3
             WHERE id = ?4",
            params![RoomStatus::CheckedIn.as_str(), guest_name, now, id],
        )?;
        Ok(())
    }

    /// Release the room after departure
    pub(crate) fn write_check_out(&self, id: RoomId) -> Result<()> {
        let now = now_string();
        self.conn.execute(
            "UPDATE rooms SET status = ?1, guest_name = NULL, check_out_time = ?2, updated_at = ?2
             WHERE id = ?3",
            params![RoomStatus::Vacant.as_str(), now, id],
        )?;
        Ok(())
    }

    fn map_room(row: &rusqlite::Row<'_>) -> rusqlite::Result<Room> {
        Ok(Room {
            id: row.get(0)?,
            room_number: row.get(1)?,
            floor: row.get(2)?,
            status: parse_enum(&row.get::<_, String>(3)?)?,
            guest_name: row.get(4)?,
            check_in_time: parse_datetime_opt(row.get(5)?)?,
            check_out_time: parse_datetime_opt(row.get(6)?)?,
            created_at: parse_datetime(&row.get::<_, String>(7)?)?,
            updated_at: parse_datetime(&row.get::<_, String>(8)?)?,
        })
    }
}
