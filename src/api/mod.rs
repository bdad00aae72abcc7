//! Check result model shared by every layer of the engine.
//!
//! A check function produces a stream of [`CheckOutput`]s: classified
//! [`CheckResult`]s, [`Metric`]s for graphing and [`IgnoreResults`] markers.

mod errors;
mod results;
mod state;

pub use errors::*;
pub use results::*;
pub use state::*;
