//! Integer generators and the three-tier numeric shrinker.

use crate::error::{Error, Result};
use crate::gen::Gen;
use crate::generated::{Generated, ShrinkResult, Shrinker, Verdict};
use rand::Rng;

/// Offer the shrink candidates of `value` toward `target`, in order:
///
/// 1. its base-10 order of magnitude, when that is strictly between the
///    value and the target (mirrored for negative values below the target);
/// 2. the point halfway to the target;
/// 3. one unit toward the target.
///
/// Every candidate is strictly closer to the target than `value`, and no
/// candidate is offered twice.
pub(crate) fn for_each_candidate(
    value: i128,
    target: i128,
    visit: &mut dyn FnMut(i128) -> Verdict,
) -> ShrinkResult {
    if value == target {
        return ShrinkResult::Exhausted;
    }

    let mut offered: [Option<i128>; 2] = [None, None];
    let tiers = [magnitude(value, target), Some(halfway(value, target)), Some(step(value, target))];
    for candidate in tiers.into_iter().flatten() {
        if candidate == value || offered.contains(&Some(candidate)) {
            continue;
        }
        if visit(candidate) == Verdict::Stop {
            return ShrinkResult::Stopped;
        }
        if offered[0].is_none() {
            offered[0] = Some(candidate);
        } else {
            offered[1] = Some(candidate);
        }
    }
    ShrinkResult::Exhausted
}

fn magnitude(value: i128, target: i128) -> Option<i128> {
    if value > target && value > 0 {
        let logged = value.ilog10() as i128;
        (logged < value && logged > target).then_some(logged)
    } else if value < target && value < 0 {
        let logged = -(value.unsigned_abs().ilog10() as i128);
        (logged > value && logged < target).then_some(logged)
    } else {
        None
    }
}

fn halfway(value: i128, target: i128) -> i128 {
    target + (value - target) / 2
}

fn step(value: i128, target: i128) -> i128 {
    if value > target {
        value - 1
    } else {
        value + 1
    }
}

/// Lossless conversion to and from the shrinker's working type.
pub(crate) trait Integral: Copy + PartialEq + 'static {
    fn to_i128(self) -> i128;
    /// Only called with values between two valid `Self` values.
    fn from_i128(value: i128) -> Self;
}

pub(crate) fn integral<T: Integral>(value: T, target: T) -> Generated<T> {
    if value == target {
        return Generated::terminal(value);
    }

    Generated::new(
        value,
        Shrinker::new(move |&value: &T, send| {
            for_each_candidate(value.to_i128(), target.to_i128(), &mut |candidate| {
                send(integral(T::from_i128(candidate), target))
            })
        }),
    )
}

macro_rules! integral_gen {
    ($($t:ty),* $(,)?) => {
        $(
            impl Integral for $t {
                fn to_i128(self) -> i128 {
                    self as i128
                }

                fn from_i128(value: i128) -> Self {
                    value as $t
                }
            }

            impl Gen<$t> {
                /// Any value of the type, shrinking toward zero.
                pub fn any() -> Self {
                    Self::towards(0)
                }

                /// Any value of the type, shrinking toward `target`.
                pub fn towards(target: $t) -> Self {
                    Gen::new(move |rng| integral(rng.gen::<$t>(), target))
                }

                /// A value in `min..=max`, shrinking toward the in-range
                /// value closest to zero.
                pub fn range(min: $t, max: $t) -> Result<Self> {
                    if max < min {
                        return Err(Error::InvalidGenerator {
                            message: format!("range maximum {max} is below minimum {min}"),
                        });
                    }

                    let target = (0 as $t).clamp(min, max);
                    Ok(Gen::new(move |rng| integral(rng.gen_range(min..=max), target)))
                }
            }
        )*
    };
}

integral_gen!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Gen<usize> {
    /// An index into a collection of `count` items, shrinking toward 0.
    /// A count of zero is treated as one.
    pub fn index(count: usize) -> Self {
        let max = count.max(1) - 1;
        Gen::new(move |rng| integral(rng.gen_range(0..=max), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Seed, SplitMix};
    use crate::gen::Generator;
    use crate::generated::candidates;

    fn offered(value: i128, target: i128) -> Vec<i128> {
        let mut seen = Vec::new();
        for_each_candidate(value, target, &mut |c| {
            seen.push(c);
            Verdict::Continue
        });
        seen
    }

    #[test]
    fn test_three_tiers_in_order() {
        assert_eq!(offered(5000, 0), vec![3, 2500, 4999]);
        assert_eq!(offered(5, 0), vec![2, 4]);
        assert_eq!(offered(1, 0), vec![0]);
        assert!(offered(0, 0).is_empty());
    }

    #[test]
    fn test_magnitude_must_stay_above_target() {
        // log10(150) = 2 is not above 100
        assert_eq!(offered(150, 100), vec![125, 149]);
    }

    #[test]
    fn test_negative_values_shrink_upward() {
        assert_eq!(offered(-5000, 0), vec![-3, -2500, -4999]);
        assert_eq!(offered(-1, 0), vec![0]);
        assert_eq!(offered(3, 10), vec![7, 4]);
    }

    #[test]
    fn test_candidates_strictly_closer() {
        let cases = [
            (i64::MAX as i128, 0),
            (i64::MIN as i128, 0),
            (u64::MAX as i128, 0),
            (17, -3),
            (-17, 4),
        ];
        for (value, target) in cases {
            for candidate in offered(value, target) {
                assert!((candidate - target).abs() < (value - target).abs());
            }
        }
    }

    #[test]
    fn test_stop_halts_enumeration() {
        let mut seen = Vec::new();
        let result = for_each_candidate(5000, 0, &mut |c| {
            seen.push(c);
            Verdict::Stop
        });
        assert_eq!(result, ShrinkResult::Stopped);
        assert_eq!(seen, vec![3]);
    }

    #[test]
    fn test_greedy_descent_terminates_at_target() {
        let mut current = integral(i64::MIN, 0i64);
        let mut steps = 0;
        loop {
            let mut next = None;
            current.shrink(&mut |candidate| {
                next = Some(candidate);
                Verdict::Stop
            });
            match next {
                Some(candidate) => current = candidate,
                None => break,
            }
            steps += 1;
            assert!(steps < 200);
        }
        assert_eq!(*current.value(), 0);
    }

    #[test]
    fn test_range_generation() {
        let gen = Gen::<i32>::range(-10, 10).unwrap();
        let mut rng = SplitMix::new(Seed::from_u64(4));
        for _ in 0..100 {
            let generated = gen.generate(&mut rng);
            assert!((-10..=10).contains(generated.value()));
            for candidate in candidates(&generated) {
                assert!(candidate.abs() < generated.value().abs());
            }
        }
    }

    #[test]
    fn test_range_target_is_closest_to_zero() {
        let gen = Gen::<i32>::range(5, 9).unwrap();
        let mut rng = SplitMix::new(Seed::from_u64(9));
        for _ in 0..20 {
            let generated = gen.generate(&mut rng);
            assert!(candidates(&generated).iter().all(|&c| c >= 5));
        }
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        match Gen::<u8>::range(9, 1) {
            Err(Error::InvalidGenerator { message }) => assert!(message.contains("below")),
            _ => panic!("Expected InvalidGenerator"),
        }
    }

    #[test]
    fn test_index_bounds() {
        let gen = Gen::<usize>::index(3);
        let mut rng = SplitMix::new(Seed::from_u64(1));
        assert!((0..50).all(|_| *gen.generate(&mut rng).value() < 3));

        let empty = Gen::<usize>::index(0);
        assert_eq!(*empty.generate(&mut rng).value(), 0);
    }

    #[test]
    fn test_towards_custom_target() {
        let gen = Gen::<i16>::towards(100);
        let mut rng = SplitMix::new(Seed::from_u64(12));
        let generated = gen.generate(&mut rng);
        for candidate in candidates(&generated) {
            assert!((candidate as i32 - 100).abs() < (*generated.value() as i32 - 100).abs());
        }
    }
}
