//! retrace property-based testing library.
//!
//! This is the main entry point for retrace. Properties are closures that
//! make named generation calls through a [`Runner`]; when one fails, the
//! recorded calls are shrunk to a locally minimal counterexample.
//!
//! ```rust
//! use retrace::*;
//!
//! let result = property(|runner: &mut Runner| {
//!     let xs = runner.generate("xs", Vec::<u8>::arbitrary());
//!     let mut reversed = xs.clone();
//!     reversed.reverse();
//!     reversed.reverse();
//!     reversed == xs
//! })
//! .named("double reverse")
//! .run(&Config::default());
//! assert!(result.is_pass());
//! ```

pub use retrace_core::*;

// Re-export derive macros when available
#[cfg(feature = "derive")]
pub use retrace_derive::*;
