//! Audit trail records
//!
//! Both logs are append-only: rows are written in the same transaction as the
//! change they describe and are never updated or deleted afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ReservationId, RoomId, RoomStatus};

/// Who a system-initiated change is attributed to
pub const SYSTEM_ACTOR: &str = "system";

/// One room status transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLog {
    pub id: i64,
    pub room_id: RoomId,
    pub previous_status: RoomStatus,
    pub new_status: RoomStatus,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

/// What happened to a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationAction {
    Created,
    Cancelled,
}

impl ReservationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationAction::Created => "created",
            ReservationAction::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ReservationAction::Created),
            "cancelled" => Ok(ReservationAction::Cancelled),
            other => Err(format!("unknown reservation action '{other}'")),
        }
    }
}

impl fmt::Display for ReservationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reservation lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLog {
    pub id: i64,
    pub reservation_id: ReservationId,
    pub action: ReservationAction,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}
