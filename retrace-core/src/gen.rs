//! Generator combinators for property-based testing.

use crate::error::{Error, Result};
use crate::generated::{Generated, ShrinkResult, Shrinker, Verdict};
use crate::numeric;
use rand::{Rng, RngCore};
use std::rc::Rc;

/// How many draws `filter` makes before giving up on a predicate.
const FILTER_ATTEMPTS: usize = 100;

/// Anything that can produce a [`Generated`] value from an entropy source.
///
/// Generators are stateless across calls and may be invoked any number
/// of times.
pub trait Generator<T> {
    fn generate(&self, rng: &mut dyn RngCore) -> Generated<T>;
}

impl<G, T> Generator<T> for &G
where
    G: Generator<T> + ?Sized,
{
    fn generate(&self, rng: &mut dyn RngCore) -> Generated<T> {
        (**self).generate(rng)
    }
}

/// A generator for test data of type `T`.
///
/// Generators are explicit, first-class values that can be composed
/// using combinator functions. Cloning a `Gen` is cheap.
pub struct Gen<T> {
    generator: Rc<dyn Fn(&mut dyn RngCore) -> Generated<T>>,
}

impl<T> Clone for Gen<T> {
    fn clone(&self) -> Self {
        Gen {
            generator: Rc::clone(&self.generator),
        }
    }
}

impl<T> Generator<T> for Gen<T> {
    fn generate(&self, rng: &mut dyn RngCore) -> Generated<T> {
        (self.generator)(rng)
    }
}

impl<T> Gen<T> {
    /// Create a new generator from a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn RngCore) -> Generated<T> + 'static,
    {
        Gen {
            generator: Rc::new(f),
        }
    }
}

impl<T> Gen<T>
where
    T: Clone + 'static,
{
    /// Create a generator that always produces the same value.
    pub fn constant(value: T) -> Self {
        Gen::new(move |_rng| Generated::terminal(value.clone()))
    }

    /// A random value that never shrinks.
    ///
    /// Useful for inputs the property needs but whose exact value is
    /// known not to matter.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut dyn RngCore) -> T + 'static,
    {
        Gen::new(move |rng| Generated::terminal(f(rng)))
    }

    /// Map a function over the generated values.
    pub fn map<U, F>(self, f: F) -> Gen<U>
    where
        F: Fn(T) -> U + 'static,
        U: 'static,
    {
        let f = Rc::new(f);
        Gen::new(move |rng| self.generate(rng).map_shared(f.clone()))
    }

    /// Filter generated values by a predicate.
    ///
    /// Shrink candidates that fail the predicate are skipped. Generation
    /// redraws until the predicate holds, and panics with
    /// [`Error::GeneratorFailed`] if it never does.
    pub fn filter<F>(self, predicate: F) -> Gen<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        Gen::new(move |rng| {
            for _ in 0..FILTER_ATTEMPTS {
                let generated = self.generate(rng);
                if predicate(generated.value()) {
                    return generated.filter_shared(predicate.clone());
                }
            }
            std::panic::panic_any(Error::GeneratorFailed {
                reason: format!("filter rejected {FILTER_ATTEMPTS} consecutive values"),
            })
        })
    }

    /// Choose uniformly among `alternatives`; the result shrinks like the
    /// alternative that produced it.
    pub fn one_of(alternatives: Vec<Gen<T>>) -> Result<Self> {
        if alternatives.is_empty() {
            return Err(Error::InvalidGenerator {
                message: "one_of needs at least one alternative".to_string(),
            });
        }

        Ok(Gen::new(move |rng| {
            let ix = rng.gen_range(0..alternatives.len());
            alternatives[ix].generate(rng)
        }))
    }
}

/// Primitive generators.
impl Gen<bool> {
    /// Generate a random boolean; `true` shrinks to `false`.
    pub fn bool() -> Self {
        Gen::new(|rng| {
            if rng.gen::<bool>() {
                Generated::new(
                    true,
                    Shrinker::new(|_, send| match send(Generated::terminal(false)) {
                        Verdict::Stop => ShrinkResult::Stopped,
                        Verdict::Continue => ShrinkResult::Exhausted,
                    }),
                )
            } else {
                Generated::terminal(false)
            }
        })
    }
}

impl Gen<char> {
    /// Any Unicode scalar value, shrinking toward `'a'`.
    pub fn any() -> Self {
        Gen::new(|rng| character(rng.gen::<char>()))
    }

    /// Printable ASCII, shrinking toward `'a'`.
    pub fn ascii() -> Self {
        Gen::new(|rng| character(char::from(rng.gen_range(0x20u8..=0x7e))))
    }
}

fn character(c: char) -> Generated<char> {
    const TARGET: char = 'a';
    if c == TARGET {
        return Generated::terminal(c);
    }

    Generated::new(
        c,
        Shrinker::new(|&c, send| {
            numeric::for_each_candidate(c as i128, TARGET as i128, &mut |candidate| {
                match u32::try_from(candidate).ok().and_then(char::from_u32) {
                    Some(shrunk) => send(character(shrunk)),
                    // Surrogate code points are not chars; skip them.
                    None => Verdict::Continue,
                }
            })
        }),
    )
}

impl<A, B> Gen<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    /// Generate a pair; the first component shrinks before the second.
    pub fn pair(first: Gen<A>, second: Gen<B>) -> Self {
        Gen::new(move |rng| {
            let a = first.generate(rng);
            let b = second.generate(rng);
            pair(a, b)
        })
    }
}

fn pair<A, B>(a: Generated<A>, b: Generated<B>) -> Generated<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let value = (a.value().clone(), b.value().clone());
    if !a.has_shrinks() && !b.has_shrinks() {
        return Generated::terminal(value);
    }

    Generated::new(
        value,
        Shrinker::new(move |_, send| {
            if a.shrink(&mut |shrunk| send(pair(shrunk, b.clone()))).is_stopped() {
                return ShrinkResult::Stopped;
            }
            b.shrink(&mut |shrunk| send(pair(a.clone(), shrunk)))
        }),
    )
}

impl<T> Gen<Vec<T>>
where
    T: Clone + 'static,
{
    /// Generate a vector whose length lies in `min..=max`.
    ///
    /// Shrinking visits each position in turn, first offering to remove
    /// the element (while the vector is longer than `min`) and then
    /// offering the element's own shrinks with the rest held fixed.
    pub fn vec_of(element: Gen<T>, min: usize, max: usize) -> Result<Self> {
        if max < min {
            return Err(Error::InvalidGenerator {
                message: format!("vec_of maximum length {max} is below minimum {min}"),
            });
        }
        Ok(Self::sized(element, min, max))
    }

    pub(crate) fn sized(element: Gen<T>, min: usize, max: usize) -> Self {
        Gen::new(move |rng| {
            let len = rng.gen_range(min..=max);
            let items = (0..len).map(|_| element.generate(rng)).collect();
            sequence(min, items)
        })
    }
}

fn sequence<T>(min: usize, items: Vec<Generated<T>>) -> Generated<Vec<T>>
where
    T: Clone + 'static,
{
    let value = items.iter().map(|item| item.value().clone()).collect();
    if items.len() <= min && items.iter().all(|item| !item.has_shrinks()) {
        return Generated::terminal(value);
    }

    Generated::new(
        value,
        Shrinker::new(move |_, send| {
            for ix in 0..items.len() {
                if items.len() > min {
                    let mut fewer = items.clone();
                    fewer.remove(ix);
                    if send(sequence(min, fewer)) == Verdict::Stop {
                        return ShrinkResult::Stopped;
                    }
                }

                let shrunk = items[ix].shrink(&mut |candidate| {
                    let mut replaced = items.clone();
                    replaced[ix] = candidate;
                    send(sequence(min, replaced))
                });
                if shrunk.is_stopped() {
                    return ShrinkResult::Stopped;
                }
            }
            ShrinkResult::Exhausted
        }),
    )
}

impl Gen<String> {
    /// Generate a string of `min..=max` characters drawn from `chars`.
    pub fn string_of(chars: Gen<char>, min: usize, max: usize) -> Result<Self> {
        Ok(Gen::<Vec<char>>::vec_of(chars, min, max)?.map(String::from_iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Seed, SplitMix};
    use crate::generated::candidates;

    fn rng(seed: u64) -> SplitMix {
        SplitMix::new(Seed::from_u64(seed))
    }

    #[test]
    fn test_constant_never_shrinks() {
        let generated = Gen::constant(7).generate(&mut rng(1));
        assert_eq!(*generated.value(), 7);
        assert!(!generated.has_shrinks());
    }

    #[test]
    fn test_bool_shrinks_to_false() {
        let gen = Gen::bool();
        let mut source = rng(5);
        let generated = (0..64)
            .map(|_| gen.generate(&mut source))
            .find(|g| *g.value())
            .expect("a true value in 64 draws");
        assert_eq!(candidates(&generated), vec![false]);
    }

    #[test]
    fn test_vec_of_rejects_inverted_bounds() {
        match Gen::<Vec<u8>>::vec_of(Gen::<u8>::any(), 5, 2) {
            Err(Error::InvalidGenerator { .. }) => (),
            Err(other) => panic!("Expected InvalidGenerator, got: {other:?}"),
            Ok(_) => panic!("Expected InvalidGenerator"),
        }
    }

    #[test]
    fn test_vec_of_respects_bounds() {
        let gen = Gen::<Vec<u8>>::vec_of(Gen::<u8>::any(), 2, 6).unwrap();
        let mut source = rng(11);
        for _ in 0..50 {
            let len = gen.generate(&mut source).value().len();
            assert!((2..=6).contains(&len));
        }
    }

    #[test]
    fn test_vec_removal_precedes_element_shrinks() {
        let elements = vec![character('c'), character('a')];
        let generated = sequence(0, elements);
        let offered = candidates(&generated);
        assert_eq!(offered[0], vec!['a']);
        assert!(offered[1..].iter().any(|v| v == &vec!['b', 'a']));
        let first_element_shrink = offered.iter().position(|v| v.len() == 2).unwrap();
        assert!(first_element_shrink > 0);
    }

    #[test]
    fn test_vec_never_shrinks_below_minimum() {
        let gen = Gen::<Vec<u8>>::vec_of(Gen::<u8>::any(), 3, 8).unwrap();
        let mut source = rng(21);
        for _ in 0..20 {
            let generated = gen.generate(&mut source);
            for candidate in candidates(&generated) {
                assert!(candidate.len() >= 3);
                assert!(candidate.len() <= generated.value().len());
            }
        }
    }

    #[test]
    fn test_map_keeps_shrinking() {
        let gen = Gen::<u8>::range(10, 200).unwrap().map(|n| n as u32 * 2);
        let generated = gen.generate(&mut rng(2));
        for candidate in candidates(&generated) {
            assert_eq!(candidate % 2, 0);
            assert!(candidate < *generated.value());
        }
    }

    #[test]
    fn test_filter_generation_and_shrinks() {
        let gen = Gen::<u32>::range(0, 1000).unwrap().filter(|n| n % 2 == 1);
        let mut source = rng(8);
        for _ in 0..20 {
            let generated = gen.generate(&mut source);
            assert_eq!(generated.value() % 2, 1);
            assert!(candidates(&generated).iter().all(|n| n % 2 == 1));
        }
    }

    #[test]
    fn test_one_of() {
        assert!(Gen::<u8>::one_of(Vec::new()).is_err());

        let gen = Gen::one_of(vec![Gen::constant(1u8), Gen::constant(2u8)]).unwrap();
        let mut source = rng(13);
        let values: Vec<u8> = (0..40).map(|_| *gen.generate(&mut source).value()).collect();
        assert!(values.contains(&1));
        assert!(values.contains(&2));
    }

    #[test]
    fn test_pair_shrinks_first_component_first() {
        let generated = pair(character('c'), character('c'));
        let offered = candidates(&generated);
        let first_second = offered.iter().position(|(a, _)| *a == 'c').unwrap();
        assert!(offered[..first_second].iter().all(|(_, b)| *b == 'c'));
    }

    #[test]
    fn test_char_shrinks_toward_a() {
        let generated = character('z');
        for candidate in candidates(&generated) {
            assert!(candidate < 'z');
            assert!(candidate >= 'a');
        }
        assert!(!character('a').has_shrinks());
    }

    #[test]
    fn test_string_of() {
        let gen = Gen::<String>::string_of(Gen::<char>::ascii(), 1, 10).unwrap();
        let mut source = rng(17);
        for _ in 0..20 {
            let s = gen.generate(&mut source).into_value();
            let count = s.chars().count();
            assert!((1..=10).contains(&count));
            assert!(s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()));
        }
    }
}
