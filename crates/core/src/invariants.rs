//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Notification, Reservation, Room, RoomStatus};

/// Validate that a room's live state is internally consistent
pub fn assert_room_invariants(room: &Room) {
    debug_assert!(
        !room.room_number.trim().is_empty(),
        "Room {} has empty room number",
        room.id
    );

    // Vacating a room always clears its guest
    debug_assert!(
        !(room.status == RoomStatus::Vacant && room.guest_name.is_some()),
        "Room {} is vacant but still names guest {:?}",
        room.id,
        room.guest_name
    );
}

/// Validate that a stored reservation is well-formed
pub fn assert_reservation_invariants(reservation: &Reservation) {
    debug_assert!(
        reservation.check_in_date < reservation.check_out_date,
        "Reservation {} checks out on {} before checking in on {}",
        reservation.id,
        reservation.check_out_date,
        reservation.check_in_date
    );

    debug_assert!(
        reservation.number_of_guests >= 1,
        "Reservation {} has no guests",
        reservation.id
    );
}

/// Validate that confirmed reservations on one room never share a night
pub fn assert_no_overlap(reservations: &[Reservation]) {
    for (i, a) in reservations.iter().enumerate() {
        assert_reservation_invariants(a);
        for b in &reservations[i + 1..] {
            if a.room_id != b.room_id || !a.is_confirmed() || !b.is_confirmed() {
                continue;
            }
            debug_assert!(
                !a.stay().overlaps(&b.stay()),
                "Room {} has overlapping confirmed reservations {} and {}",
                a.room_id,
                a.id,
                b.id
            );
        }
    }
}

/// Validate a notification listing: bounded, one user, newest first
pub fn assert_ring_invariants(notifications: &[Notification], capacity: u32) {
    debug_assert!(
        notifications.len() <= capacity as usize,
        "Notification listing holds {} entries, capacity is {}",
        notifications.len(),
        capacity
    );

    if let Some(first) = notifications.first() {
        debug_assert!(
            notifications.iter().all(|n| n.user_id == first.user_id),
            "Notification listing mixes users"
        );
    }

    debug_assert!(
        notifications
            .windows(2)
            .all(|w| (w[0].created_at, w[0].id) >= (w[1].created_at, w[1].id)),
        "Notification listing is not newest first"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationType, ReservationStatus};
    use chrono::{Duration, NaiveDate, Utc};

    fn room(status: RoomStatus, guest: Option<&str>) -> Room {
        Room {
            id: 101,
            room_number: "101".into(),
            floor: 1,
            status,
            guest_name: guest.map(String::from),
            check_in_time: None,
            check_out_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reservation(id: i64, check_in: u32, check_out: u32) -> Reservation {
        Reservation {
            id,
            room_id: 101,
            guest_name: "Alice".into(),
            guest_email: None,
            check_in_date: NaiveDate::from_ymd_opt(2024, 1, check_in).unwrap(),
            check_out_date: NaiveDate::from_ymd_opt(2024, 1, check_out).unwrap(),
            number_of_guests: 1,
            special_requests: None,
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn notification(id: i64, seconds_ago: i64) -> Notification {
        Notification {
            id,
            user_id: 1,
            message: format!("n{id}"),
            notification_type: NotificationType::Info,
            created_at: Utc::now() - Duration::seconds(seconds_ago),
        }
    }

    #[test]
    fn test_valid_rooms() {
        assert_room_invariants(&room(RoomStatus::Vacant, None));
        assert_room_invariants(&room(RoomStatus::CheckedIn, Some("Alice")));
        assert_room_invariants(&room(RoomStatus::Reserved, None));
    }

    #[test]
    #[should_panic(expected = "still names guest")]
    fn test_vacant_room_with_guest() {
        assert_room_invariants(&room(RoomStatus::Vacant, Some("Alice")));
    }

    #[test]
    fn test_touching_stays_do_not_overlap() {
        assert_no_overlap(&[reservation(1, 10, 12), reservation(2, 12, 14)]);
    }

    #[test]
    fn test_cancelled_stays_are_ignored() {
        let mut cancelled = reservation(2, 11, 13);
        cancelled.status = ReservationStatus::Cancelled;
        assert_no_overlap(&[reservation(1, 10, 12), cancelled]);
    }

    #[test]
    #[should_panic(expected = "overlapping confirmed reservations")]
    fn test_overlapping_stays() {
        assert_no_overlap(&[reservation(1, 10, 12), reservation(2, 11, 13)]);
    }

    #[test]
    fn test_ring_newest_first() {
        assert_ring_invariants(&[notification(3, 0), notification(2, 5)], 20);
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn test_ring_over_capacity() {
        assert_ring_invariants(&[notification(3, 0), notification(2, 5)], 1);
    }
}
