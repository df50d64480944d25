//! Default generators for common types.

use crate::gen::Gen;
use std::fmt::Debug;

/// Longest collection produced by the default `Vec` and `String` generators.
const DEFAULT_MAX_LEN: usize = 32;

/// Types with a default generator.
///
/// This is what `#[derive(Generate)]` asks of every field type.
pub trait Arbitrary: Clone + Debug + 'static {
    fn arbitrary() -> Gen<Self>;
}

impl Arbitrary for () {
    fn arbitrary() -> Gen<Self> {
        Gen::constant(())
    }
}

impl Arbitrary for bool {
    fn arbitrary() -> Gen<Self> {
        Gen::bool()
    }
}

impl Arbitrary for char {
    fn arbitrary() -> Gen<Self> {
        Gen::<char>::any()
    }
}

macro_rules! arbitrary_integral {
    ($($t:ty),*) => {
        $(
            impl Arbitrary for $t {
                fn arbitrary() -> Gen<Self> {
                    Gen::<$t>::any()
                }
            }
        )*
    };
}

arbitrary_integral!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Printable ASCII strings.
impl Arbitrary for String {
    fn arbitrary() -> Gen<Self> {
        Gen::<Vec<char>>::sized(Gen::<char>::ascii(), 0, DEFAULT_MAX_LEN).map(String::from_iter)
    }
}

impl<T: Arbitrary> Arbitrary for Vec<T> {
    fn arbitrary() -> Gen<Self> {
        Gen::<Vec<T>>::sized(T::arbitrary(), 0, DEFAULT_MAX_LEN)
    }
}

/// `Some` shrinks to `None` before its payload shrinks.
impl<T: Arbitrary> Arbitrary for Option<T> {
    fn arbitrary() -> Gen<Self> {
        Gen::derive(|runner| {
            if runner.generate("is_some", Gen::bool()) {
                Some(runner.generate("some", T::arbitrary()))
            } else {
                None
            }
        })
    }
}

impl<A: Arbitrary, B: Arbitrary> Arbitrary for (A, B) {
    fn arbitrary() -> Gen<Self> {
        Gen::pair(A::arbitrary(), B::arbitrary())
    }
}
