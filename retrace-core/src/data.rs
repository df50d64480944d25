//! Core data types: seeds, the entropy source, configuration and printing.

use crate::error::{Error, Result};
use rand::RngCore;
use std::fmt;
use std::rc::Rc;

/// Splittable random seed for deterministic trial generation.
///
/// Seeds can be split to create independent random streams, so every
/// trial of a run gets its own entropy while the whole run stays
/// reproducible from a single `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed(pub u64, pub u64);

impl Seed {
    /// Create a new seed from a single value.
    pub fn from_u64(value: u64) -> Self {
        let state = splitmix64_mix(value);
        let gamma = mix_gamma(state);
        Seed(state, gamma)
    }

    /// Split a seed into two independent seeds.
    /// Uses SplitMix64 splitting strategy for independence.
    pub fn split(self) -> (Self, Self) {
        let Seed(state, gamma) = self;
        let new_state = state.wrapping_add(gamma);
        let output = splitmix64_mix(new_state);
        let new_gamma = mix_gamma(output);

        (Seed(new_state, gamma), Seed(output, new_gamma))
    }

    /// Generate the next random value and advance the seed.
    pub fn next_u64(self) -> (u64, Self) {
        let Seed(state, gamma) = self;
        let new_state = state.wrapping_add(gamma);
        let output = splitmix64_mix(new_state);
        (output, Seed(new_state, gamma))
    }

    /// Draw a fresh run seed from the thread-local generator.
    pub fn random_u64() -> u64 {
        use rand::Rng;
        rand::thread_rng().gen()
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({}, {})", self.0, self.1)
    }
}

/// The entropy source handed to generators while recording.
///
/// A thin stateful wrapper around [`Seed`] that speaks [`RngCore`], so
/// generators can use the whole `rand` API (`gen_range`, `gen`, ...).
#[derive(Debug, Clone)]
pub struct SplitMix {
    seed: Seed,
}

impl SplitMix {
    pub fn new(seed: Seed) -> Self {
        SplitMix { seed }
    }
}

impl RngCore for SplitMix {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let (value, next) = self.seed.next_u64();
        self.seed = next;
        value
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Configuration for property testing.
///
/// Passed by value when a property is run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of trials to run.
    pub test_limit: usize,

    /// Maximum number of accepted shrinks before the shrink loop stops.
    pub shrink_limit: usize,

    /// Run seed. A random one is drawn (and reported) when absent.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            test_limit: 100,
            shrink_limit: 1000,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new config with the given number of tests.
    pub fn with_tests(mut self, tests: usize) -> Self {
        self.test_limit = tests;
        self
    }

    /// Create a new config with the given shrink limit.
    pub fn with_shrinks(mut self, shrinks: usize) -> Self {
        self.shrink_limit = shrinks;
        self
    }

    /// Create a new config that always starts from `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations no run can honour.
    pub fn validate(&self) -> Result<()> {
        if self.test_limit == 0 {
            return Err(Error::InvalidConfig {
                message: "test_limit must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Value-to-text formatter used when rendering traces in reports.
#[derive(Clone)]
pub struct Printer {
    print: Rc<dyn Fn(&dyn fmt::Debug) -> String>,
}

impl Printer {
    pub fn new<F>(print: F) -> Self
    where
        F: Fn(&dyn fmt::Debug) -> String + 'static,
    {
        Printer {
            print: Rc::new(print),
        }
    }

    /// Multi-line `{:#?}` rendering.
    pub fn pretty() -> Self {
        Printer::new(|value| format!("{value:#?}"))
    }

    pub fn print(&self, value: &dyn fmt::Debug) -> String {
        (self.print)(value)
    }
}

impl Default for Printer {
    fn default() -> Self {
        Printer::new(|value| format!("{value:?}"))
    }
}

impl fmt::Debug for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Printer")
    }
}

/// SplitMix64 mixing function for high-quality output.
fn splitmix64_mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Generate a good gamma value for SplitMix64 splitting.
fn mix_gamma(mut z: u64) -> u64 {
    z = splitmix64_mix(z);
    // Gamma must be odd for maximal period
    (z | 1).wrapping_mul(0x9e3779b97f4a7c15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_deterministic() {
        let (a, _) = Seed::from_u64(7).next_u64();
        let (b, _) = Seed::from_u64(7).next_u64();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_seeds_diverge() {
        let (left, right) = Seed::from_u64(42).split();
        assert_ne!(left.next_u64().0, right.next_u64().0);
    }

    #[test]
    fn test_splitmix_fills_partial_chunks() {
        let mut rng = SplitMix::new(Seed::from_u64(3));
        let mut bytes = [0u8; 13];
        rng.fill_bytes(&mut bytes);
        assert!(bytes.iter().any(|&b| b != 0));

        let mut again = SplitMix::new(Seed::from_u64(3));
        let mut same = [0u8; 13];
        again.fill_bytes(&mut same);
        assert_eq!(bytes, same);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        match Config::default().with_tests(0).validate() {
            Err(Error::InvalidConfig { .. }) => (),
            other => panic!("Expected InvalidConfig, got: {other:?}"),
        }
    }

    #[test]
    fn test_printers() {
        let value = vec![1, 2];
        assert_eq!(Printer::default().print(&value), "[1, 2]");
        assert!(Printer::pretty().print(&value).contains('\n'));
        assert_eq!(Printer::new(|_| "x".to_string()).print(&value), "x");
    }
}
