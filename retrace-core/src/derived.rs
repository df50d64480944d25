//! Derived generators: composite values built by arbitrary code.
//!
//! A derived generator runs a deriver closure against a fresh recording
//! runner and keeps the resulting trace as the value's shrink state. To
//! shrink, it perturbs one entry of that trace at a time and replays the
//! same deriver over the modified trace, so every composite value shrinks
//! through its parts without a hand-written shrinker.

use crate::error::UsageError;
use crate::gen::Gen;
use crate::generated::{Generated, ShrinkResult, Shrinker, Verdict};
use crate::runner::Runner;
use crate::trace::Trace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::trace;

type Deriver<T> = Rc<dyn Fn(&mut Runner<'_>) -> T>;

thread_local! {
    /// Nested candidates the current thread skipped because their deriver
    /// could not replay them.
    static SKIPPED: RefCell<Vec<UsageError>> = const { RefCell::new(Vec::new()) };
}

/// Drain the usage errors met by derived shrinkers on this thread.
pub(crate) fn take_skipped() -> Vec<UsageError> {
    SKIPPED.with(|skipped| std::mem::take(&mut *skipped.borrow_mut()))
}

fn skip(error: UsageError) {
    SKIPPED.with(|skipped| skipped.borrow_mut().push(error));
}

impl<T> Gen<T>
where
    T: 'static,
{
    /// Build a generator from code making nested generation calls.
    ///
    /// The runner handed to `deriver` is the one it must generate through;
    /// the same closure is re-run in replay mode while shrinking, so it
    /// must make the same calls given the same values.
    ///
    /// # Example
    /// ```rust
    /// use retrace_core::*;
    ///
    /// #[derive(Debug, Clone)]
    /// struct Color {
    ///     r: u8,
    ///     g: u8,
    ///     b: u8,
    /// }
    ///
    /// let color = Gen::derive(|runner| Color {
    ///     r: runner.generate("r", Gen::<u8>::any()),
    ///     g: runner.generate("g", Gen::<u8>::any()),
    ///     b: runner.generate("b", Gen::<u8>::any()),
    /// });
    /// # let _ = color;
    /// ```
    pub fn derive<F>(deriver: F) -> Self
    where
        F: Fn(&mut Runner<'_>) -> T + 'static,
    {
        let deriver: Deriver<T> = Rc::new(deriver);
        Gen::new(move |rng| {
            let mut trace = Trace::new();
            let value = {
                let mut runner = Runner::record(rng, &mut trace);
                deriver(&mut runner)
            };
            derived(value, deriver.clone(), trace)
        })
    }
}

fn derived<T: 'static>(value: T, deriver: Deriver<T>, trace: Trace) -> Generated<T> {
    if !trace.has_shrinks() {
        return Generated::terminal(value);
    }

    Generated::new(
        value,
        Shrinker::new(move |_, send| shrink_trace(&deriver, &trace, send)),
    )
}

/// Offer every single-entry perturbation of `trace`, entry by entry.
///
/// A perturbation the deriver cannot replay is skipped and its usage
/// error is kept for [`take_skipped`].
fn shrink_trace<T: 'static>(
    deriver: &Deriver<T>,
    trace: &Trace,
    send: &mut dyn FnMut(Generated<T>) -> Verdict,
) -> ShrinkResult {
    for (ix, entry) in trace.iter().enumerate() {
        let result = entry.shrink(&mut |candidate| {
            let candidate_trace = trace.replaced(ix, candidate);
            match replay(deriver, &candidate_trace) {
                Ok((value, consumed)) => send(derived(
                    value,
                    deriver.clone(),
                    candidate_trace.truncated(consumed),
                )),
                Err(error) => {
                    trace!(entry = ix, %error, "skipping nested candidate");
                    skip(error);
                    Verdict::Continue
                }
            }
        });

        if result.is_stopped() {
            return ShrinkResult::Stopped;
        }
    }
    ShrinkResult::Exhausted
}

fn replay<T>(deriver: &Deriver<T>, trace: &Trace) -> Result<(T, usize), UsageError> {
    let mut runner = Runner::replay(trace);
    match panic::catch_unwind(AssertUnwindSafe(|| deriver(&mut runner))) {
        Ok(value) => Ok((value, runner.consumed())),
        Err(payload) => match payload.downcast::<UsageError>() {
            Ok(error) => Err(*error),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}
