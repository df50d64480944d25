//! Property definitions and the trial driver.

use crate::data::{Config, Printer, Seed, SplitMix};
use crate::error::{Error, TestResult, UsageError};
use crate::runner::Runner;
use crate::shrink::shrink;
use crate::trace::Trace;
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// The result of one execution of a property body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail { reason: String },
    /// The body's generation calls did not match the trace being replayed.
    Unevaluable(UsageError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail { .. })
    }
}

/// Values a property body may return.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Outcome {
        if self {
            Outcome::Pass
        } else {
            Outcome::Fail {
                reason: "property returned false".to_string(),
            }
        }
    }
}

/// A body returning `()` fails only by panicking.
impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Pass
    }
}

impl<E: Display> IntoOutcome for std::result::Result<(), E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(()) => Outcome::Pass,
            Err(error) => Outcome::Fail {
                reason: error.to_string(),
            },
        }
    }
}

/// Run `body` once through `runner`, turning panics into outcomes.
pub(crate) fn evaluate<B, R>(runner: &mut Runner<'_>, body: &B) -> Outcome
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    match panic::catch_unwind(AssertUnwindSafe(|| body(runner))) {
        Ok(result) => result.into_outcome(),
        Err(payload) => classify(payload),
    }
}

fn classify(payload: Box<dyn Any + Send>) -> Outcome {
    let payload = match payload.downcast::<UsageError>() {
        Ok(error) => return Outcome::Unevaluable(*error),
        Err(payload) => payload,
    };
    if let Some(error) = payload.downcast_ref::<Error>() {
        // Broken generators are not property failures; stop the run.
        panic!("[retrace] {error}");
    }

    let reason = if let Some(&s) = payload.downcast_ref::<&str>() {
        s.to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.to_owned()
    } else {
        "property panicked".to_owned()
    };
    Outcome::Fail {
        reason: format!("panicked: {reason}"),
    }
}

/// One randomized trial: a fresh entropy source and an empty trace.
pub struct Trial {
    rng: SplitMix,
    trace: Trace,
}

impl Trial {
    pub fn new(seed: Seed) -> Self {
        Trial {
            rng: SplitMix::new(seed),
            trace: Trace::new(),
        }
    }

    /// A recording runner over this trial's entropy and trace.
    pub fn runner(&mut self) -> Runner<'_> {
        Runner::record(&mut self.rng, &mut self.trace)
    }

    /// Execute `body` once in record mode, returning its outcome and trace.
    pub fn run_once<B, R>(mut self, body: &B) -> (Outcome, Trace)
    where
        B: Fn(&mut Runner<'_>) -> R,
        R: IntoOutcome,
    {
        let outcome = evaluate(&mut self.runner(), body);
        (outcome, self.trace)
    }
}

/// Replay `trace` unmodified through `body`.
pub fn replay<B, R>(trace: &Trace, body: &B) -> Outcome
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    evaluate(&mut Runner::replay(trace), body)
}

/// A property that can be tested with generated inputs.
pub struct Property<B> {
    body: B,
    name: Option<String>,
    printer: Printer,
}

impl<B, R> Property<B>
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    /// Create a new property from a body making named generation calls.
    pub fn new(body: B) -> Self {
        Property {
            body,
            name: None,
            printer: Printer::default(),
        }
    }

    /// Name the property in reports.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Render reported values with `printer`.
    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Run this property with the given configuration.
    ///
    /// A panicking body counts as a failure. Panics are caught, not
    /// silenced: the process panic hook still prints a message for the
    /// failing trial and for every shrink candidate that panics. Install a
    /// quiet hook with [`std::panic::set_hook`] to suppress that output.
    pub fn run(&self, config: &Config) -> TestResult {
        let seed_value = config.seed.unwrap_or_else(Seed::random_u64);
        if let Err(error) = config.validate() {
            return self.abort(0, seed_value, error);
        }

        let mut seed = Seed::from_u64(seed_value);
        for test_num in 0..config.test_limit {
            let (trial_seed, next_seed) = seed.split();
            seed = next_seed;

            let (outcome, trace) = Trial::new(trial_seed).run_once(&self.body);
            match outcome {
                Outcome::Pass => continue,
                Outcome::Unevaluable(error) => {
                    return self.abort(test_num + 1, seed_value, error.into());
                }
                Outcome::Fail { reason } => {
                    debug!(test = test_num + 1, %reason, "trial failed; shrinking");
                    return self.minimise(config, test_num + 1, seed_value, reason, trace);
                }
            }
        }

        TestResult::Pass {
            tests_run: config.test_limit,
            property_name: self.name.clone(),
            seed: seed_value,
        }
    }

    fn minimise(
        &self,
        config: &Config,
        tests_run: usize,
        seed: u64,
        reason: String,
        trace: Trace,
    ) -> TestResult {
        if !replay(&trace, &self.body).is_failure() {
            return self.abort(
                tests_run,
                seed,
                Error::NonDeterministic {
                    message: "found a failure but replaying its values did not reproduce it"
                        .to_string(),
                },
            );
        }

        let report = shrink(trace, &self.body, config, &self.printer);
        let reason = match replay(&report.trace, &self.body) {
            Outcome::Fail { reason } => reason,
            _ => reason,
        };

        TestResult::Fail {
            tests_run,
            shrinks_performed: report.shrinks,
            property_name: self.name.clone(),
            seed,
            reason,
            original: report.original,
            minimized: report.minimized,
            usage_errors: report.usage_errors,
        }
    }

    fn abort(&self, tests_run: usize, seed: u64, error: Error) -> TestResult {
        TestResult::Abort {
            tests_run,
            property_name: self.name.clone(),
            seed,
            error,
        }
    }
}

/// Create a property from a body making named generation calls.
pub fn property<B, R>(body: B) -> Property<B>
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    Property::new(body)
}

/// Run `body` with the default configuration, panicking with the report
/// if it fails.
///
/// When `body` fails by panicking, the panic hook runs once per panicking
/// candidate during shrinking, so the output shows one "thread panicked"
/// message per attempt before the report. See [`Property::run`].
///
/// # Example
/// ```rust
/// use retrace_core::*;
///
/// check(|runner: &mut Runner| {
///     let x = runner.generate("x", Gen::<i64>::range(0, 10_000).unwrap());
///     let y = runner.generate("y", Gen::<i64>::range(0, 10_000).unwrap());
///     x + y == y + x
/// });
/// ```
pub fn check<B, R>(body: B)
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    check_with(&Config::default(), body)
}

/// Run `body` with `config`, panicking with the report if it fails.
///
/// Panicking bodies print through the panic hook as described on [`check`].
pub fn check_with<B, R>(config: &Config, body: B)
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    if let Err(error) = property(body).run(config).into_result() {
        panic!("\n[retrace] {error}\n");
    }
}
