//! Room model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Caller-assigned room identifier
pub type RoomId = i64;

/// Live occupancy state of a physical room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Vacant,
    Reserved,
    #[serde(rename = "checkedin")]
    CheckedIn,
    Checkout,
}

impl RoomStatus {
    pub const ALL: [RoomStatus; 4] = [
        RoomStatus::Vacant,
        RoomStatus::Reserved,
        RoomStatus::CheckedIn,
        RoomStatus::Checkout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Vacant => "vacant",
            RoomStatus::Reserved => "reserved",
            RoomStatus::CheckedIn => "checkedin",
            RoomStatus::Checkout => "checkout",
        }
    }
}

impl FromStr for RoomStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vacant" => Ok(RoomStatus::Vacant),
            "reserved" => Ok(RoomStatus::Reserved),
            "checkedin" => Ok(RoomStatus::CheckedIn),
            "checkout" => Ok(RoomStatus::Checkout),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical room and its current occupant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_number: String,
    pub floor: i64,
    pub status: RoomStatus,
    pub guest_name: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration data for a new room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub id: RoomId,
    pub room_number: String,
    pub floor: i64,
    #[serde(default = "NewRoom::default_status")]
    pub status: RoomStatus,
    #[serde(default)]
    pub guest_name: Option<String>,
}

impl NewRoom {
    pub fn new(id: RoomId, room_number: impl Into<String>, floor: i64) -> Self {
        Self {
            id,
            room_number: room_number.into(),
            floor,
            status: RoomStatus::Vacant,
            guest_name: None,
        }
    }

    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = status;
        self
    }

    fn default_status() -> RoomStatus {
        RoomStatus::Vacant
    }
}

/// Outcome of a status transition, reported back to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub room_id: RoomId,
    pub previous_status: RoomStatus,
    pub new_status: RoomStatus,
}

/// Number of rooms currently in a given status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: RoomStatus,
    pub count: u64,
}
