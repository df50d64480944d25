//! Error types and run outcomes for retrace property testing.

use std::fmt;
use thiserror::Error;

/// Main error type for retrace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Property test failed with a counterexample.
    #[error("Property test failed:\n{report}")]
    PropertyFailed { report: String },

    /// Generator failed to produce a value.
    #[error("Generator failed: {reason}")]
    GeneratorFailed { reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Invalid generator construction.
    #[error("Invalid generator: {message}")]
    InvalidGenerator { message: String },

    /// A failing trial passed when its recording was replayed unchanged.
    #[error("Non-deterministic property: {message}")]
    NonDeterministic { message: String },

    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Result type for retrace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A property body made generation calls that do not line up with the
/// trace it is being replayed against.
///
/// Raised while replaying, never while recording.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("while replaying, value {position} was recorded as `{recorded}` but requested as `{requested}`")]
    NameMismatch {
        position: usize,
        recorded: String,
        requested: String,
    },

    #[error("while replaying, value {position} was recorded with type {recorded} but requested as {requested}")]
    TypeMismatch {
        position: usize,
        recorded: &'static str,
        requested: &'static str,
    },

    #[error("while replaying, `{requested}` requested value {position} but the trace ends there")]
    TraceExhausted { position: usize, requested: String },
}

/// Rendered `(name, value)` pairs of a trace.
pub type Bindings = Vec<(String, String)>;

/// Outcome of running a property.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    /// Every trial passed.
    Pass {
        tests_run: usize,
        property_name: Option<String>,
        seed: u64,
    },

    /// A trial failed; `minimized` is the locally minimal failing trace.
    Fail {
        tests_run: usize,
        shrinks_performed: usize,
        property_name: Option<String>,
        seed: u64,
        reason: String,
        original: Bindings,
        minimized: Bindings,
        /// Why shrink candidates could not be replayed.
        usage_errors: Vec<UsageError>,
    },

    /// The run could not be carried out.
    Abort {
        tests_run: usize,
        property_name: Option<String>,
        seed: u64,
        error: Error,
    },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    /// Convert into a `Result`, rendering the failure report into the error.
    pub fn into_result(self) -> Result<()> {
        match self {
            TestResult::Pass { .. } => Ok(()),
            fail @ TestResult::Fail { .. } => Err(Error::PropertyFailed {
                report: fail.to_string(),
            }),
            TestResult::Abort { error, .. } => Err(error),
        }
    }
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &Bindings) -> fmt::Result {
    if bindings.is_empty() {
        return writeln!(f, "      │ (no generated values)");
    }
    for (name, value) in bindings {
        let mut lines = value.lines();
        writeln!(f, "      │ {} = {}", name, lines.next().unwrap_or_default())?;
        for line in lines {
            writeln!(f, "      │   {line}")?;
        }
    }
    Ok(())
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Pass {
                tests_run,
                property_name,
                ..
            } => {
                let prop_name = property_name.as_deref().unwrap_or("property");
                write!(f, "  ✓ {} passed {} tests.", prop_name, tests_run)
            }
            TestResult::Fail {
                tests_run,
                shrinks_performed,
                property_name,
                seed,
                reason,
                original,
                minimized,
                usage_errors,
            } => {
                let prop_name = property_name.as_deref().unwrap_or("property");
                writeln!(
                    f,
                    "  ✗ {} failed after {} tests and {} shrinks.",
                    prop_name, tests_run, shrinks_performed
                )?;
                writeln!(f, "    {reason}")?;
                writeln!(f)?;
                writeln!(f, "    Falsified with values:")?;
                write_bindings(f, minimized)?;
                writeln!(f)?;
                writeln!(f, "    Original failing values:")?;
                write_bindings(f, original)?;

                if !usage_errors.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "    Shrink candidates that could not be replayed:")?;
                    for error in usage_errors {
                        writeln!(f, "      │ {error}")?;
                    }
                }

                writeln!(f)?;
                write!(f, "    Reproduce with seed {seed}")
            }
            TestResult::Abort {
                tests_run,
                property_name,
                seed,
                error,
            } => {
                let prop_name = property_name.as_deref().unwrap_or("property");
                write!(
                    f,
                    "  ⚐ {} aborted after {} tests (seed {}): {}",
                    prop_name, tests_run, seed, error
                )
            }
        }
    }
}
