//! # Contracts
//!
//! Frozen interface contracts between the monitoring dispatcher and its
//! collaborators: collection engine, graph engine, report renderers,
//! introspection utilities, session registry, hosting environment,
//! privileged-action registry and locale binding.
//!
//! Business crates depend on this crate only; reverse dependencies are
//! prohibited.

mod action;
mod collector;
mod counter;
mod error;
mod hosting;
mod informations;
mod introspection;
mod locale;
mod period;
mod report;
mod settings;

pub use action::*;
pub use collector::*;
pub use counter::*;
pub use error::*;
pub use hosting::*;
pub use informations::*;
pub use introspection::*;
pub use locale::*;
pub use period::Period;
pub use report::*;
pub use settings::*;
