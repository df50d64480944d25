//! The recorded trace of named generation calls.
//!
//! A trace holds values of different types in one ordered sequence. Each
//! entry is an immutable snapshot behind the [`TraceEntry`] capability set,
//! so a trace can be cloned freely and "modified" only by building a new
//! trace that shares its untouched entries.

use crate::data::Printer;
use crate::error::Bindings;
use crate::generated::{Generated, ShrinkResult, Verdict};
use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

/// Type-erased view of one recorded generation call.
pub trait TraceEntry {
    /// The call-site name the value was recorded under.
    fn name(&self) -> &str;

    fn type_name(&self) -> &'static str;

    fn value_any(&self) -> &dyn Any;

    fn value_debug(&self) -> &dyn fmt::Debug;

    fn has_shrinks(&self) -> bool;

    /// Offer replacement entries, each holding a shrink candidate of this
    /// entry's value under the same name.
    fn shrink(&self, send: &mut dyn FnMut(Rc<dyn TraceEntry>) -> Verdict) -> ShrinkResult;
}

/// The typed entry behind every [`TraceEntry`].
pub(crate) struct Recorded<T> {
    name: String,
    generated: Generated<T>,
}

impl<T> Recorded<T> {
    pub(crate) fn new(name: &str, generated: Generated<T>) -> Self {
        Recorded {
            name: name.to_string(),
            generated,
        }
    }
}

impl<T> TraceEntry for Recorded<T>
where
    T: fmt::Debug + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn value_any(&self) -> &dyn Any {
        self.generated.value()
    }

    fn value_debug(&self) -> &dyn fmt::Debug {
        self.generated.value()
    }

    fn has_shrinks(&self) -> bool {
        self.generated.has_shrinks()
    }

    fn shrink(&self, send: &mut dyn FnMut(Rc<dyn TraceEntry>) -> Verdict) -> ShrinkResult {
        self.generated.shrink(&mut |candidate| {
            send(Rc::new(Recorded {
                name: self.name.clone(),
                generated: candidate,
            }))
        })
    }
}

/// An ordered log of named generation calls, in call order.
#[derive(Clone, Default)]
pub struct Trace {
    entries: Vec<Rc<dyn TraceEntry>>,
}

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ix: usize) -> Option<&Rc<dyn TraceEntry>> {
        self.entries.get(ix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn TraceEntry>> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    /// The value recorded at `ix`, if it has type `T`.
    pub fn value<T: 'static>(&self, ix: usize) -> Option<&T> {
        self.entries.get(ix)?.value_any().downcast_ref::<T>()
    }

    /// True if any entry can still offer shrink candidates.
    pub fn has_shrinks(&self) -> bool {
        self.entries.iter().any(|entry| entry.has_shrinks())
    }

    pub(crate) fn push(&mut self, entry: Rc<dyn TraceEntry>) {
        self.entries.push(entry);
    }

    /// A copy of this trace with the entry at `ix` replaced.
    pub fn replaced(&self, ix: usize, entry: Rc<dyn TraceEntry>) -> Trace {
        let mut entries = self.entries.clone();
        entries[ix] = entry;
        Trace { entries }
    }

    /// A copy of this trace keeping only the first `len` entries.
    pub fn truncated(&self, len: usize) -> Trace {
        Trace {
            entries: self.entries.iter().take(len).cloned().collect(),
        }
    }

    /// Render every entry as a `(name, value)` pair.
    pub fn render(&self, printer: &Printer) -> Bindings {
        self.entries
            .iter()
            .map(|entry| (entry.name().to_string(), printer.print(entry.value_debug())))
            .collect()
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.name(), entry.value_debug())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::integral;

    fn entry<T: fmt::Debug + 'static>(name: &str, generated: Generated<T>) -> Rc<dyn TraceEntry> {
        Rc::new(Recorded::new(name, generated))
    }

    fn sample() -> Trace {
        let mut trace = Trace::new();
        trace.push(entry("x", integral(40u8, 0)));
        trace.push(entry("label", Generated::terminal("hi".to_string())));
        trace
    }

    #[test]
    fn test_names_and_values() {
        let trace = sample();
        assert_eq!(trace.names(), vec!["x", "label"]);
        assert_eq!(trace.value::<u8>(0), Some(&40));
        assert_eq!(trace.value::<String>(1).map(String::as_str), Some("hi"));
        assert_eq!(trace.value::<u32>(0), None);
        assert_eq!(trace.get(0).map(|e| e.type_name()), Some("u8"));
    }

    #[test]
    fn test_replaced_leaves_original_untouched() {
        let trace = sample();
        let replaced = trace.replaced(0, entry("x", integral(1u8, 0)));
        assert_eq!(trace.value::<u8>(0), Some(&40));
        assert_eq!(replaced.value::<u8>(0), Some(&1));
        assert_eq!(replaced.value::<String>(1).map(String::as_str), Some("hi"));
    }

    #[test]
    fn test_entry_shrinks_keep_name() {
        let trace = sample();
        let mut offered = Vec::new();
        let result = trace.get(0).unwrap().shrink(&mut |candidate| {
            assert_eq!(candidate.name(), "x");
            offered.push(*candidate.value_any().downcast_ref::<u8>().unwrap());
            Verdict::Continue
        });
        assert_eq!(result, ShrinkResult::Exhausted);
        assert_eq!(offered, vec![1, 20, 39]);
        assert!(!trace.get(1).unwrap().has_shrinks());
    }

    #[test]
    fn test_render_and_truncate() {
        let trace = sample();
        assert_eq!(
            trace.render(&Printer::default()),
            vec![
                ("x".to_string(), "40".to_string()),
                ("label".to_string(), "\"hi\"".to_string()),
            ]
        );
        assert_eq!(trace.truncated(1).names(), vec!["x"]);
        assert_eq!(format!("{trace:?}"), "{\"x\": 40, \"label\": \"hi\"}");
    }
}
