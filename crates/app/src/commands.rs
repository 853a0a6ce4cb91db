//! Subcommand handlers
//!
//! Each handler calls one engine operation and renders its result as JSON.

use concierge_core::{Database, Error, NewRoom, ReservationRequest, Result, StayDates};
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::Commands;

/// Process exit code for a failed command
pub fn exit_code(err: &Error) -> u8 {
    match err {
        Error::Validation(_) => 2,
        Error::NotFound(_) => 3,
        Error::Conflict(_) | Error::WriteCollision { .. } => 4,
        Error::InvalidState(_) => 5,
        Error::Database(_) | Error::Io(_) | Error::Config(_) => 1,
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Io(e.into()))
}

pub fn run(db: &Database, command: Commands) -> Result<Value> {
    match command {
        Commands::Init => {
            let seeded = db.seed_sample_rooms()?;
            Ok(json!({
                "schema_version": db.schema_version(),
                "rooms_seeded": seeded,
                "rooms": db.rooms().count()?,
            }))
        }
        Commands::Health => {
            db.ping()?;
            Ok(json!({ "status": "ok", "schema_version": db.schema_version() }))
        }
        Commands::Rooms { bookings } => {
            if bookings {
                to_json(&db.rooms().list_with_bookings()?)
            } else {
                to_json(&db.rooms().list()?)
            }
        }
        Commands::Room { room_id } => to_json(&db.rooms().get(room_id)?),
        Commands::Summary => to_json(&db.rooms().status_summary()?),
        Commands::AddRoom {
            room_id,
            number,
            floor,
            status,
        } => {
            let mut room = NewRoom::new(room_id, number, floor);
            if let Some(status) = status {
                room = room.with_status(status);
            }
            to_json(&db.rooms().create(&room)?)
        }
        Commands::Availability {
            room,
            check_in,
            check_out,
        } => {
            let stay = StayDates::parse(&check_in, &check_out)?;
            match room {
                Some(room_id) => {
                    let available = db.availability().check_availability(room_id, &stay)?;
                    let conflicts = db.ledger().find_conflicts(room_id, &stay)?;
                    Ok(json!({
                        "room_id": room_id,
                        "stay": to_json(&stay)?,
                        "available": available,
                        "conflicts": to_json(&conflicts)?,
                    }))
                }
                None => to_json(&db.availability().availability_for_all(&stay)?),
            }
        }
        Commands::Reserve {
            room_id,
            guest,
            check_in,
            check_out,
            email,
            guests,
            requests,
        } => {
            let stay = StayDates::parse(&check_in, &check_out)?;
            let mut request = ReservationRequest::new(room_id, guest, stay).with_guests(guests);
            if let Some(email) = email {
                request = request.with_email(email);
            }
            if let Some(requests) = requests {
                request = request.with_special_requests(requests);
            }
            to_json(&db.availability().reserve(request)?)
        }
        Commands::Cancel { reservation_id } => to_json(&db.ledger().cancel(reservation_id)?),
        Commands::Reservations { room, from, to } => match (room, from, to) {
            (Some(room_id), Some(from), Some(to)) => {
                let range = StayDates::parse(&from, &to)?;
                to_json(&db.ledger().list_active_for_room(room_id, Some(&range))?)
            }
            (Some(room_id), _, _) => to_json(&db.ledger().list_active_for_room(room_id, None)?),
            (None, _, _) => to_json(&db.ledger().list_confirmed()?),
        },
        Commands::CheckIn { room_id, guest } => {
            to_json(&db.transitions().check_in(room_id, &guest)?)
        }
        Commands::CheckOut { room_id } => to_json(&db.transitions().check_out(room_id)?),
        Commands::SetStatus { room_id, status } => {
            to_json(&db.transitions().set_status_named(room_id, &status)?)
        }
        Commands::History { room, reservation } => match (room, reservation) {
            (Some(room_id), _) => to_json(&db.transitions().history(room_id)?),
            (None, Some(reservation_id)) => to_json(&db.ledger().history(reservation_id)?),
            (None, None) => Ok(json!([])),
        },
        Commands::AddUser {
            username,
            password_hash,
        } => to_json(&db.users().create(&username, &password_hash)?),
        Commands::Notify {
            user_id,
            message,
            notification_type,
        } => {
            let id = db
                .notification_ring()
                .push(user_id, &message, notification_type)?;
            Ok(json!({ "id": id }))
        }
        Commands::Notifications { user_id } => to_json(&db.notification_ring().list(user_id)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::tempdir;

    fn exec(db: &Database, args: &[&str]) -> Result<Value> {
        let mut argv = vec!["concierge"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        run(db, cli.command)
    }

    #[test]
    fn test_init_seeds_once() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(exec(&db, &["init"]).unwrap()["rooms_seeded"], 15);
        assert_eq!(exec(&db, &["init"]).unwrap()["rooms_seeded"], 0);
        assert_eq!(exec(&db, &["health"]).unwrap()["status"], "ok");
    }

    #[test]
    fn test_reserve_then_conflict_maps_exit_codes() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("hotel.db")).unwrap();
        exec(&db, &["init"]).unwrap();

        let booking = [
            "reserve", "101", "--guest", "Alice", "--check-in", "2024-01-10", "--check-out",
            "2024-01-12",
        ];
        let reserved = exec(&db, &booking).unwrap();
        assert_eq!(reserved["reservation"]["status"], "confirmed");
        assert_eq!(reserved["room_status_update"]["new_status"], "reserved");

        let err = exec(&db, &booking).unwrap_err();
        assert_eq!(exit_code(&err), 4);

        let too_long = exec(
            &db,
            &[
                "reserve", "102", "--guest", "Bob", "--check-in", "2024-01-10", "--check-out",
                "2024-01-15",
            ],
        )
        .unwrap_err();
        assert_eq!(exit_code(&too_long), 2);

        let missing = exec(&db, &["room", "999"]).unwrap_err();
        assert_eq!(exit_code(&missing), 3);
    }

    #[test]
    fn test_cancel_twice_is_invalid_state() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["add-room", "101", "--number", "101", "--floor", "1"]).unwrap();
        let reserved = exec(
            &db,
            &[
                "reserve", "101", "--guest", "Alice", "--check-in", "2024-01-10", "--check-out",
                "2024-01-11",
            ],
        )
        .unwrap();
        let id = reserved["reservation"]["id"].as_i64().unwrap().to_string();

        exec(&db, &["cancel", id.as_str()]).unwrap();
        let err = exec(&db, &["cancel", id.as_str()]).unwrap_err();
        assert_eq!(exit_code(&err), 5);

        let history = exec(&db, &["history", "--reservation", id.as_str()]).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_status_commands_render_changes() {
        let db = Database::open_in_memory().unwrap();
        exec(&db, &["add-room", "101", "--number", "101", "--floor", "1"]).unwrap();

        let change = exec(&db, &["check-in", "101", "--guest", "Alice"]).unwrap();
        assert_eq!(change["previous_status"], "vacant");
        assert_eq!(change["new_status"], "checkedin");

        let err = exec(&db, &["set-status", "101", "occupied"]).unwrap_err();
        assert_eq!(exit_code(&err), 2);

        exec(&db, &["check-out", "101"]).unwrap();
        let history = exec(&db, &["history", "--room", "101"]).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_collision_is_conflict_exit() {
        assert_eq!(exit_code(&Error::WriteCollision { attempts: 3 }), 4);
    }

    #[test]
    fn test_notifications_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let user = exec(&db, &["add-user", "frontdesk"]).unwrap();
        assert!(user.get("password_hash").is_none());
        let user_id = user["id"].as_i64().unwrap().to_string();

        exec(&db, &["notify", user_id.as_str(), "Room 101 is ready", "--type", "success"]).unwrap();
        let listed = exec(&db, &["notifications", user_id.as_str()]).unwrap();
        assert_eq!(listed[0]["notification_type"], "success");

        let err = exec(&db, &["notify", "999", "hello"]).unwrap_err();
        assert_eq!(exit_code(&err), 3);
    }
}
