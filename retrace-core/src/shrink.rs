//! The shrink loop: greedy, per-entry minimisation of a failing trace.
//!
//! The loop scans the trace entry by entry. For each entry it offers the
//! entry's shrink candidates one at a time, replaying the property body
//! against the trace with that one entry substituted. The first candidate
//! under which the property still fails is committed and the scan restarts
//! from the first entry. A full pass without a commit means the trace has
//! converged to a local minimum.

use crate::data::{Config, Printer};
use crate::derived::take_skipped;
use crate::error::{Bindings, UsageError};
use crate::generated::Verdict;
use crate::property::{evaluate, IntoOutcome, Outcome};
use crate::runner::Runner;
use crate::trace::Trace;
use tracing::{debug, info, trace, warn};

/// What the shrink loop found.
#[derive(Debug, Clone)]
pub struct ShrinkReport {
    /// The failing trace as it was handed in.
    pub original: Bindings,
    /// The locally minimal failing trace.
    pub minimized: Bindings,
    pub trace: Trace,
    /// Accepted substitutions.
    pub shrinks: usize,
    /// Property executions performed while shrinking.
    pub attempts: usize,
    /// Distinct usage errors met while replaying candidates.
    pub usage_errors: Vec<UsageError>,
}

struct ShrinkLoop<'b, B> {
    body: &'b B,
    attempts: usize,
    usage_errors: Vec<UsageError>,
}

impl<'b, B, R> ShrinkLoop<'b, B>
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    /// Try the candidates of entry `ix` until one still fails the property.
    ///
    /// A candidate the body cannot replay abandons the entry for this scan.
    /// Nested candidates a composite value's deriver cannot replay are only
    /// skipped. Both kinds of usage error are noted.
    fn attempt(&mut self, current: &Trace, ix: usize) -> Option<Trace> {
        let entry = current.get(ix)?.clone();
        if !entry.has_shrinks() {
            return None;
        }

        let body = self.body;
        let attempts = &mut self.attempts;
        let mut unevaluable = None;
        let mut accepted = None;

        take_skipped();
        entry.shrink(&mut |candidate| {
            let candidate_trace = current.replaced(ix, candidate);
            let mut runner = Runner::replay(&candidate_trace);
            let outcome = evaluate(&mut runner, body);
            let consumed = runner.consumed();
            *attempts += 1;

            match outcome {
                Outcome::Pass => {
                    trace!(entry = ix, "candidate passed; reverting");
                    Verdict::Continue
                }
                Outcome::Fail { .. } => {
                    accepted = Some(candidate_trace.truncated(consumed));
                    Verdict::Stop
                }
                Outcome::Unevaluable(error) => {
                    unevaluable = Some(error);
                    Verdict::Stop
                }
            }
        });

        for error in unevaluable.into_iter().chain(take_skipped()) {
            self.note(ix, error);
        }
        accepted
    }

    fn note(&mut self, ix: usize, error: UsageError) {
        if !self.usage_errors.contains(&error) {
            warn!(entry = ix, %error, "candidate cannot be replayed");
            self.usage_errors.push(error);
        }
    }
}

/// Minimise a failing `trace` of `body`.
///
/// `trace` must fail `body` when replayed; the returned report holds the
/// locally minimal failing trace, rendered with `printer` next to the
/// original. At most `config.shrink_limit` substitutions are accepted.
pub fn shrink<B, R>(trace: Trace, body: &B, config: &Config, printer: &Printer) -> ShrinkReport
where
    B: Fn(&mut Runner<'_>) -> R,
    R: IntoOutcome,
{
    let original = trace.render(printer);
    let mut current = trace;
    let mut shrinks = 0;
    let mut shrink_loop = ShrinkLoop {
        body,
        attempts: 0,
        usage_errors: Vec::new(),
    };

    'scan: loop {
        for ix in 0..current.len() {
            if shrinks >= config.shrink_limit {
                debug!(limit = config.shrink_limit, "shrink limit reached");
                break 'scan;
            }

            if let Some(smaller) = shrink_loop.attempt(&current, ix) {
                shrinks += 1;
                debug!(entry = ix, shrinks, "accepted smaller failing trace");
                current = smaller;
                continue 'scan;
            }
        }
        break;
    }

    info!(shrinks, attempts = shrink_loop.attempts, "shrinking finished");
    ShrinkReport {
        original,
        minimized: current.render(printer),
        trace: current,
        shrinks,
        attempts: shrink_loop.attempts,
        usage_errors: shrink_loop.usage_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Seed, SplitMix};
    use crate::gen::Gen;
    use std::panic::{self, AssertUnwindSafe};

    fn record<B, R>(seed: u64, body: &B) -> Trace
    where
        B: Fn(&mut Runner<'_>) -> R,
    {
        let mut trace = Trace::new();
        let mut rng = SplitMix::new(Seed::from_u64(seed));
        let mut runner = Runner::record(&mut rng, &mut trace);
        body(&mut runner);
        trace
    }

    #[test]
    fn test_single_value_shrinks_to_boundary() {
        let body = |runner: &mut Runner<'_>| runner.generate("n", Gen::<u32>::any()) < 100;
        let trace = (0..)
            .map(|seed| record(seed, &body))
            .find(|t| t.value::<u32>(0).is_some_and(|&n| n >= 100))
            .unwrap();

        let report = shrink(trace, &body, &Config::default(), &Printer::default());
        assert_eq!(report.minimized, vec![("n".to_string(), "100".to_string())]);
        assert!(report.shrinks > 0);
        assert!(report.usage_errors.is_empty());
    }

    #[test]
    fn test_converged_trace_is_not_shrunk_again() {
        let body = |runner: &mut Runner<'_>| {
            let x = runner.generate("x", Gen::<u64>::any());
            let y = runner.generate("y", Gen::<u64>::any());
            x == y
        };
        let trace = record(9, &body);
        let first = shrink(trace, &body, &Config::default(), &Printer::default());
        let second = shrink(first.trace.clone(), &body, &Config::default(), &Printer::default());
        assert_eq!(second.shrinks, 0);
        assert_eq!(second.minimized, first.minimized);
    }

    #[test]
    fn test_shrink_limit_caps_accepted_substitutions() {
        let body = |runner: &mut Runner<'_>| runner.generate("n", Gen::<u64>::any()) == 0;
        let trace = (0..)
            .map(|seed| record(seed, &body))
            .find(|t| t.value::<u64>(0).is_some_and(|&n| n > 1000))
            .unwrap();

        let config = Config::default().with_shrinks(1);
        let report = shrink(trace, &body, &config, &Printer::default());
        assert_eq!(report.shrinks, 1);
    }

    #[test]
    fn test_failure_by_panic_is_minimised() {
        let body = |runner: &mut Runner<'_>| {
            let n = runner.generate("n", Gen::<u16>::any());
            assert!(n < 10, "too big: {n}");
        };
        let trace = (0..)
            .map(|seed| record_quietly(seed, &body))
            .find(|t| t.value::<u16>(0).is_some_and(|&n| n >= 10))
            .unwrap();

        let report = shrink(trace, &body, &Config::default(), &Printer::default());
        assert_eq!(report.minimized, vec![("n".to_string(), "10".to_string())]);
    }

    fn record_quietly<B>(seed: u64, body: &B) -> Trace
    where
        B: Fn(&mut Runner<'_>),
    {
        let mut trace = Trace::new();
        let mut rng = SplitMix::new(Seed::from_u64(seed));
        let mut runner = Runner::record(&mut rng, &mut trace);
        let _ = panic::catch_unwind(AssertUnwindSafe(|| body(&mut runner)));
        trace
    }

    #[test]
    fn test_unreplayable_nested_candidate_does_not_block_siblings() {
        let branchy = Gen::derive(|runner| {
            let wide = runner.generate("wide", Gen::bool());
            let n = if wide {
                runner.generate("a", Gen::<u32>::any())
            } else {
                runner.generate("b", Gen::<u32>::any())
            };
            (wide, n)
        });
        let body = move |runner: &mut Runner<'_>| runner.generate("v", branchy.clone()).1 < 5;
        let trace = (0..)
            .map(|seed| record(seed, &body))
            .find(|t| t.value::<(bool, u32)>(0).is_some_and(|&(wide, n)| wide && n >= 5))
            .unwrap();

        let report = shrink(trace, &body, &Config::default(), &Printer::default());
        assert_eq!(report.trace.value::<(bool, u32)>(0), Some(&(true, 5)));
        assert_eq!(report.usage_errors.len(), 1);
        assert!(take_skipped().is_empty());
    }
}
