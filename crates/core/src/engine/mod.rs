//! Reservation engine
//!
//! Policy layered over the storage stores: availability and booking, the
//! reservation ledger, room status transitions and notification history.
//! Each component borrows a `Database` and runs its mutations through
//! `Database::atomic`.

mod availability;
mod ledger;
mod notifications;
mod traits;
mod transitions;

pub use availability::AvailabilityResolver;
pub use ledger::ReservationLedger;
pub use notifications::NotificationRing;
pub use traits::{Engine, NotificationLog, ReservationEngine, RoomTransitions};
pub use transitions::StatusMachine;

use crate::storage::Database;

impl Database {
    /// Get availability resolver
    pub fn availability(&self) -> AvailabilityResolver<'_> {
        AvailabilityResolver::new(self)
    }

    /// Get reservation ledger
    pub fn ledger(&self) -> ReservationLedger<'_> {
        ReservationLedger::new(self)
    }

    /// Get room status machine
    pub fn transitions(&self) -> StatusMachine<'_> {
        StatusMachine::new(self)
    }

    /// Get notification ring
    pub fn notification_ring(&self) -> NotificationRing<'_> {
        NotificationRing::new(self)
    }
}
