//! A crate for driving a robot car from a live basketball score.
//!
//! The car moves forward when the home team scores and backward when the away
//! team scores, by a distance proportional to the net points. The
//! [`tracker`] polls the scoreboard and drives the car; [`calibration`] helps
//! find how long one point of movement should take.

#![warn(missing_docs)]

mod error;

pub mod calibration;
pub mod car;
pub mod cli;
pub mod config;
pub mod logging;
pub mod menu;
pub mod motor;
pub mod policy;
pub mod prelude;
pub mod runtime;
pub mod scoreboard;
pub mod tracker;

pub use error::*;
