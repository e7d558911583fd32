//! Wagering domain types.
//!
//! Defines spins, number groups, progression strategies, trackers, cards and sessions used by the
//! execution layer and clients.

mod card;
mod constants;
mod group;
mod pending;
mod session;
mod spin;
mod strategy;

pub use card::*;
pub use constants::*;
pub use group::*;
pub use pending::*;
pub use session::*;
pub use spin::*;
pub use strategy::*;
