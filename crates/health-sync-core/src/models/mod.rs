//! Domain models for the health-sync system.

mod clinical;
mod lenient;
mod patient;
mod record;

pub use clinical::*;
pub use patient::*;
pub use record::*;
