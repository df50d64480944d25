//! The generated-value / shrinker protocol.
//!
//! A shrinker is a lazy producer of candidates: it is handed a consumer
//! callback (the shrinkee) and calls it once per candidate, simplest-first
//! by the generator's own ordering. The consumer answers [`Verdict::Stop`]
//! to accept a candidate, which ends the enumeration immediately, or
//! [`Verdict::Continue`] to ask for the next one.

use std::fmt;
use std::rc::Rc;

/// A shrinkee's answer to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Reject this candidate and offer the next one.
    Continue,
    /// Accept this candidate and end enumeration.
    Stop,
}

/// How a shrinker's enumeration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkResult {
    /// The shrinkee accepted a candidate.
    Stopped,
    /// Every candidate was offered and rejected.
    Exhausted,
}

impl ShrinkResult {
    pub fn is_stopped(self) -> bool {
        self == ShrinkResult::Stopped
    }
}

type ShrinkFn<T> = dyn Fn(&T, &mut dyn FnMut(Generated<T>) -> Verdict) -> ShrinkResult;

/// A lazy, ordered source of simpler replacements for a value.
pub struct Shrinker<T> {
    shrink: Rc<ShrinkFn<T>>,
}

impl<T> Shrinker<T> {
    pub fn new<F>(shrink: F) -> Self
    where
        F: Fn(&T, &mut dyn FnMut(Generated<T>) -> Verdict) -> ShrinkResult + 'static,
    {
        Shrinker {
            shrink: Rc::new(shrink),
        }
    }

    /// Offer candidates derived from `value` to `send` until it stops.
    pub fn shrink(
        &self,
        value: &T,
        send: &mut dyn FnMut(Generated<T>) -> Verdict,
    ) -> ShrinkResult {
        (self.shrink)(value, send)
    }
}

impl<T> Clone for Shrinker<T> {
    fn clone(&self) -> Self {
        Shrinker {
            shrink: Rc::clone(&self.shrink),
        }
    }
}

impl<T> fmt::Debug for Shrinker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Shrinker")
    }
}

/// A produced value together with the way to shrink it.
///
/// The shrinker is absent for leaf values that have no simpler form.
pub struct Generated<T> {
    value: T,
    shrinker: Option<Shrinker<T>>,
}

impl<T> Generated<T> {
    pub fn new(value: T, shrinker: Shrinker<T>) -> Self {
        Generated {
            value,
            shrinker: Some(shrinker),
        }
    }

    /// A value that never shrinks.
    pub fn terminal(value: T) -> Self {
        Generated {
            value,
            shrinker: None,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn shrinker(&self) -> Option<&Shrinker<T>> {
        self.shrinker.as_ref()
    }

    pub fn has_shrinks(&self) -> bool {
        self.shrinker.is_some()
    }

    /// Drive this value's shrinker. A terminal value is immediately exhausted.
    pub fn shrink(&self, send: &mut dyn FnMut(Generated<T>) -> Verdict) -> ShrinkResult {
        match &self.shrinker {
            Some(shrinker) => shrinker.shrink(&self.value, send),
            None => ShrinkResult::Exhausted,
        }
    }
}

impl<T> Generated<T>
where
    T: Clone + 'static,
{
    /// Map a function over the value, keeping the source's shrinks.
    ///
    /// Candidates are produced by shrinking the source value and mapping
    /// each candidate through `f`.
    pub fn map<U, F>(self, f: F) -> Generated<U>
    where
        F: Fn(T) -> U + 'static,
    {
        self.map_shared(Rc::new(f))
    }

    pub(crate) fn map_shared<U, F>(self, f: Rc<F>) -> Generated<U>
    where
        F: Fn(T) -> U + 'static,
    {
        let value = f(self.value.clone());
        if !self.has_shrinks() {
            return Generated::terminal(value);
        }

        let source = self;
        Generated::new(
            value,
            Shrinker::new(move |_, send| {
                source.shrink(&mut |candidate: Generated<T>| send(candidate.map_shared(f.clone())))
            }),
        )
    }

    /// Keep only candidates whose value satisfies `predicate`.
    pub fn filter<P>(self, predicate: P) -> Generated<T>
    where
        P: Fn(&T) -> bool + 'static,
    {
        self.filter_shared(Rc::new(predicate))
    }

    pub(crate) fn filter_shared<P>(self, predicate: Rc<P>) -> Generated<T>
    where
        P: Fn(&T) -> bool + 'static,
    {
        if !self.has_shrinks() {
            return self;
        }

        let value = self.value.clone();
        let source = self;
        Generated::new(
            value,
            Shrinker::new(move |_, send| {
                source.shrink(&mut |candidate: Generated<T>| {
                    if predicate(candidate.value()) {
                        send(candidate.filter_shared(predicate.clone()))
                    } else {
                        Verdict::Continue
                    }
                })
            }),
        )
    }
}

impl<T: Clone> Clone for Generated<T> {
    fn clone(&self) -> Self {
        Generated {
            value: self.value.clone(),
            shrinker: self.shrinker.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Generated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generated")
            .field("value", &self.value)
            .field("has_shrinks", &self.has_shrinks())
            .finish()
    }
}

/// Collect every candidate a value offers, rejecting them all.
///
/// Handy for inspecting shrinkers in tests and examples.
pub fn candidates<T: Clone>(generated: &Generated<T>) -> Vec<T> {
    let mut seen = Vec::new();
    generated.shrink(&mut |candidate| {
        seen.push(candidate.value().clone());
        Verdict::Continue
    });
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown(n: u32) -> Generated<u32> {
        if n == 0 {
            return Generated::terminal(0);
        }
        Generated::new(
            n,
            Shrinker::new(|&n, send| {
                for candidate in (0..n).rev() {
                    if send(countdown(candidate)) == Verdict::Stop {
                        return ShrinkResult::Stopped;
                    }
                }
                ShrinkResult::Exhausted
            }),
        )
    }

    #[test]
    fn test_terminal_is_exhausted() {
        let leaf = Generated::terminal(5);
        assert!(!leaf.has_shrinks());
        assert_eq!(leaf.shrink(&mut |_| Verdict::Stop), ShrinkResult::Exhausted);
    }

    #[test]
    fn test_stop_ends_enumeration() {
        let mut offered = Vec::new();
        let result = countdown(5).shrink(&mut |candidate| {
            offered.push(*candidate.value());
            if *candidate.value() == 3 {
                Verdict::Stop
            } else {
                Verdict::Continue
            }
        });
        assert_eq!(result, ShrinkResult::Stopped);
        assert_eq!(offered, vec![4, 3]);
    }

    #[test]
    fn test_exhaustion_offers_everything() {
        assert_eq!(candidates(&countdown(3)), vec![2, 1, 0]);
    }

    #[test]
    fn test_map_shrinks_through_source() {
        let doubled = countdown(3).map(|n| n * 2);
        assert_eq!(*doubled.value(), 6);
        assert_eq!(candidates(&doubled), vec![4, 2, 0]);
    }

    #[test]
    fn test_filter_skips_candidates() {
        let even = countdown(5).filter(|n: &u32| n % 2 == 0);
        assert_eq!(candidates(&even), vec![4, 2, 0]);
    }

    #[test]
    fn test_accepted_candidate_keeps_shrinking() {
        let mut accepted = None;
        countdown(4).shrink(&mut |candidate| {
            accepted = Some(candidate);
            Verdict::Stop
        });
        let accepted = accepted.expect("a candidate");
        assert_eq!(*accepted.value(), 3);
        assert_eq!(candidates(&accepted), vec![2, 1, 0]);
    }
}
