//! Data models for Concierge

mod audit;
mod notification;
mod reservation;
mod room;
mod stay;
mod user;

pub use audit::*;
pub use notification::*;
pub use reservation::*;
pub use room::*;
pub use stay::*;
pub use user::*;
