//! Command-line surface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use concierge_core::{NotificationType, ReservationId, RoomId, RoomStatus, UserId};

/// Concierge - hotel room and reservation engine.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and seed sample rooms if the registry is empty.
    Init,
    /// Check that the store answers.
    Health,
    /// List rooms.
    Rooms {
        /// Include each room's confirmed reservations
        #[arg(long)]
        bookings: bool,
    },
    /// Show one room.
    Room { room_id: RoomId },
    /// Count rooms per status.
    Summary,
    /// Register a room.
    AddRoom {
        room_id: RoomId,
        #[arg(long)]
        number: String,
        #[arg(long)]
        floor: i64,
        #[arg(long, value_parser = parse_room_status)]
        status: Option<RoomStatus>,
    },
    /// Availability for a stay, for one room or all rooms.
    Availability {
        #[arg(long)]
        room: Option<RoomId>,
        #[arg(long)]
        check_in: String,
        #[arg(long)]
        check_out: String,
    },
    /// Book a room.
    Reserve {
        room_id: RoomId,
        #[arg(long)]
        guest: String,
        #[arg(long)]
        check_in: String,
        #[arg(long)]
        check_out: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 1)]
        guests: u32,
        #[arg(long)]
        requests: Option<String>,
    },
    /// Cancel a confirmed reservation.
    Cancel { reservation_id: ReservationId },
    /// List reservations.
    Reservations {
        /// Only confirmed reservations on this room
        #[arg(long)]
        room: Option<RoomId>,
        /// With --room, only those overlapping [from, to)
        #[arg(long, requires_all = ["room", "to"])]
        from: Option<String>,
        #[arg(long, requires_all = ["room", "from"])]
        to: Option<String>,
    },
    /// Check a guest into a room.
    CheckIn {
        room_id: RoomId,
        #[arg(long)]
        guest: String,
    },
    /// Check the current guest out.
    CheckOut { room_id: RoomId },
    /// Set a room's status directly.
    SetStatus { room_id: RoomId, status: String },
    /// Audit trail of a room or a reservation.
    History {
        #[arg(long, conflicts_with = "reservation", required_unless_present = "reservation")]
        room: Option<RoomId>,
        #[arg(long)]
        reservation: Option<ReservationId>,
    },
    /// Register a user.
    AddUser {
        username: String,
        #[arg(long, default_value = "")]
        password_hash: String,
    },
    /// Push a notification to a user.
    Notify {
        user_id: UserId,
        message: String,
        #[arg(long = "type", value_parser = parse_notification_type, default_value = "info")]
        notification_type: NotificationType,
    },
    /// A user's notifications, newest first.
    Notifications { user_id: UserId },
}

fn parse_room_status(s: &str) -> Result<RoomStatus, String> {
    s.parse().map_err(|e: concierge_core::ValidationError| e.to_string())
}

fn parse_notification_type(s: &str) -> Result<NotificationType, String> {
    s.parse().map_err(|e: concierge_core::ValidationError| e.to_string())
}
