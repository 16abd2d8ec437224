//! Supervision events.
//!
//! The supervisor publishes one [`Event`] per lifecycle transition on a
//! broadcast [`Bus`]. Publishing never blocks; slow subscribers lag and lose
//! the oldest events.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
