//! Reservation model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Room, RoomId, StatusChange, StayDates};
use crate::error::ValidationError;

/// System-assigned, monotonically increasing reservation identifier
pub type ReservationId = i64;

/// Lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "completed" => Ok(ReservationStatus::Completed),
            other => Err(ValidationError::InvalidReservationStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date-ranged booking of one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_guests: u32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// The stay as a half-open range
    pub fn stay(&self) -> StayDates {
        StayDates::from_stored(self.check_in_date, self.check_out_date)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}

/// Reservation joined with the room it books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub room_number: String,
    pub floor: i64,
}

/// Input for the availability resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationRequest {
    pub room_id: RoomId,
    pub guest_name: String,
    pub stay: StayDates,
    pub guest_email: Option<String>,
    pub number_of_guests: u32,
    pub special_requests: Option<String>,
}

impl ReservationRequest {
    pub fn new(room_id: RoomId, guest_name: impl Into<String>, stay: StayDates) -> Self {
        Self {
            room_id,
            guest_name: guest_name.into(),
            stay,
            guest_email: None,
            number_of_guests: 1,
            special_requests: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.guest_email = Some(email.into());
        self
    }

    pub fn with_guests(mut self, count: u32) -> Self {
        self.number_of_guests = count;
        self
    }

    pub fn with_special_requests(mut self, requests: impl Into<String>) -> Self {
        self.special_requests = Some(requests.into());
        self
    }
}

/// A successful booking and the room transition it caused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserved {
    pub reservation: Reservation,
    pub room_status_update: StatusChange,
}

/// Availability of one room over a requested range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAvailability {
    pub room_id: RoomId,
    pub room_number: String,
    pub floor: i64,
    pub available: bool,
}

/// A room together with its confirmed reservations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOverview {
    #[serde(flatten)]
    pub room: Room,
    pub reservations: Vec<Reservation>,
}
