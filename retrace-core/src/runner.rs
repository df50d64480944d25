//! The record/replay execution runner.

use crate::error::UsageError;
use crate::gen::{Gen, Generator};
use crate::trace::{Recorded, Trace};
use rand::RngCore;
use std::any::type_name;
use std::fmt::Debug;
use std::rc::Rc;

/// Intercepts every named generation call made by a property body.
///
/// In record mode each call draws fresh entropy and appends to the trace.
/// In replay mode each call consumes the next trace entry, checking that
/// the call site asks for the same name and type that was recorded.
///
/// A runner only borrows its trace and lives for one execution of a body.
pub struct Runner<'a> {
    mode: Mode<'a>,
}

enum Mode<'a> {
    Record {
        rng: &'a mut dyn RngCore,
        trace: &'a mut Trace,
    },
    Replay {
        trace: &'a Trace,
        cursor: usize,
    },
}

impl<'a> Runner<'a> {
    /// A runner drawing from `rng` and appending to `trace`.
    pub fn record(rng: &'a mut dyn RngCore, trace: &'a mut Trace) -> Self {
        Runner {
            mode: Mode::Record { rng, trace },
        }
    }

    /// A runner reading `trace` from the start.
    pub fn replay(trace: &'a Trace) -> Self {
        Runner {
            mode: Mode::Replay { trace, cursor: 0 },
        }
    }

    pub fn is_replaying(&self) -> bool {
        matches!(self.mode, Mode::Replay { .. })
    }

    /// Number of generation calls answered so far.
    pub fn consumed(&self) -> usize {
        match &self.mode {
            Mode::Record { trace, .. } => trace.len(),
            Mode::Replay { cursor, .. } => *cursor,
        }
    }

    /// Generate a value named `name` with `generator`.
    ///
    /// # Panics
    ///
    /// Unwinds with a [`UsageError`] payload when replaying against a trace
    /// the call sequence does not match. Property drivers catch this and
    /// treat the execution as unevaluable; use [`Runner::try_generate`] to
    /// handle it yourself.
    ///
    /// # Example
    /// ```rust
    /// use retrace_core::*;
    ///
    /// let mut trace = Trace::new();
    /// let mut rng = SplitMix::new(Seed::from_u64(1));
    /// let mut runner = Runner::record(&mut rng, &mut trace);
    /// let x = runner.generate("x", Gen::<i64>::range(0, 10_000).unwrap());
    /// assert!((0..=10_000).contains(&x));
    /// ```
    pub fn generate<T, G>(&mut self, name: &str, generator: G) -> T
    where
        T: Clone + Debug + 'static,
        G: Generator<T>,
    {
        match self.try_generate(name, generator) {
            Ok(value) => value,
            Err(error) => std::panic::panic_any(error),
        }
    }

    /// Like [`Runner::generate`], but reports replay mismatches as errors.
    pub fn try_generate<T, G>(&mut self, name: &str, generator: G) -> Result<T, UsageError>
    where
        T: Clone + Debug + 'static,
        G: Generator<T>,
    {
        match &mut self.mode {
            Mode::Record { rng, trace } => {
                let generated = generator.generate(&mut **rng);
                let value = generated.value().clone();
                trace.push(Rc::new(Recorded::new(name, generated)));
                Ok(value)
            }
            Mode::Replay { trace, cursor } => {
                let position = *cursor;
                let entry = trace.get(position).ok_or_else(|| UsageError::TraceExhausted {
                    position,
                    requested: name.to_string(),
                })?;

                if entry.name() != name {
                    return Err(UsageError::NameMismatch {
                        position,
                        recorded: entry.name().to_string(),
                        requested: name.to_string(),
                    });
                }

                let value = entry
                    .value_any()
                    .downcast_ref::<T>()
                    .ok_or_else(|| UsageError::TypeMismatch {
                        position,
                        recorded: entry.type_name(),
                        requested: type_name::<T>(),
                    })?;

                *cursor += 1;
                Ok(value.clone())
            }
        }
    }

    /// Generate a composite value named `name` from nested generation calls.
    ///
    /// Shorthand for `self.generate(name, Gen::derive(deriver))`.
    pub fn derive<T, F>(&mut self, name: &str, deriver: F) -> T
    where
        T: Clone + Debug + 'static,
        F: Fn(&mut Runner<'_>) -> T + 'static,
    {
        self.generate(name, Gen::derive(deriver))
    }
}
