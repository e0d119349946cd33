//! Convenient to `use` common components.

pub use crate::calibration::*;
pub use crate::car::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::motor::*;
pub use crate::policy::*;
pub use crate::runtime::*;
pub use crate::scoreboard::*;
pub use crate::tracker::*;
