//! Running check plugins for the services of a host.

mod context;
mod cycle;
mod plan;
mod plugin;
mod registry;
mod service;

pub use context::*;
pub use cycle::*;
pub use plan::*;
pub use plugin::*;
pub use registry::*;
pub use service::*;
