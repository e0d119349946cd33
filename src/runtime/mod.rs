//! Sequencing primitives: cancellation, periodic ticks, operator input and
//! interrupt handling.
//!
//! Everything here blocks the calling thread; helper threads only turn
//! blocking sources into channel events.

mod context;
mod input;
mod r#loop;
mod signal;

pub use context::*;
pub use input::*;
pub use r#loop::*;
pub use signal::*;
