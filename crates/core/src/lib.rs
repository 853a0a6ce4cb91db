//! Concierge Core Library
//!
//! Room registry, reservation ledger, availability resolution, room status
//! transitions and notification history for the Concierge hotel engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod models;
pub mod storage;

pub use config::EngineConfig;
pub use engine::{
    AvailabilityResolver, Engine, NotificationLog, NotificationRing, ReservationEngine,
    ReservationLedger, RoomTransitions, StatusMachine,
};
pub use error::{Error, Result, ValidationError};
pub use models::*;
pub use storage::{AuditStore, Database, NotificationStore, ReservationStore, RoomStore, UserStore};
