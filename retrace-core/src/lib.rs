//! Core functionality for retrace property-based testing.
//!
//! Property bodies make named generation calls through a [`Runner`]. A
//! failing run is recorded as a [`Trace`], and shrinking replays the body
//! against traces with one entry simplified at a time. Composite values
//! built with [`Gen::derive`] shrink the same way, so no hand-written
//! shrinker is needed for them.

pub mod arbitrary;
pub mod data;
pub mod derived;
pub mod error;
pub mod gen;
pub mod generated;
mod numeric;
pub mod property;
pub mod runner;
pub mod shrink;
pub mod trace;

// Re-export the main types
pub use arbitrary::*;
pub use data::*;
pub use error::*;
pub use gen::*;
pub use generated::*;
pub use property::*;
pub use runner::*;
pub use shrink::*;
pub use trace::*;
