//! # Deterministic Random Numbers
//!
//! The seeded random stream every generator and spawner in Delve draws from.
//!
//! `XorShift32` is a 32-bit xorshift generator with shift constants (13, 17, 5).
//! Its output is a pure function of the seed, so a level generated from the same
//! seed is bit-identical on every platform. The middle shift propagates the sign
//! bit of the 32-bit state, which keeps the stream identical to the reference
//! levels the game shipped with.

use serde::{Deserialize, Serialize};

/// Divisor mapping a `u32` draw onto `[0, 1)`.
const U32_RANGE: f64 = 4_294_967_296.0;

/// Seedable xorshift generator over a single 32-bit state word.
///
/// # Examples
///
/// ```
/// use delve::XorShift32;
///
/// let mut a = XorShift32::new(42);
/// let mut b = XorShift32::new(42);
/// for _ in 0..100 {
///     assert_eq!(a.next_f64(), b.next_f64());
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XorShift32 {
    state: u32,
}

/// One weighted entry for [`XorShift32::pick_weighted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    /// The value returned when this entry is drawn
    pub item: T,
    /// Relative weight; entries are not required to sum to one
    pub weight: f64,
}

impl<T> Weighted<T> {
    /// Creates a weighted entry.
    pub fn new(item: T, weight: f64) -> Self {
        Self { item, weight }
    }
}

impl XorShift32 {
    /// Creates a generator from a seed.
    ///
    /// A zero seed is kept as-is and yields a constant stream of zeros.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Returns the current internal state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advances the state and returns it.
    pub fn next_state(&mut self) -> u32 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= ((s as i32) >> 17) as u32;
        s ^= s << 5;
        self.state = s;
        s
    }

    /// Draws a uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_state() as f64 / U32_RANGE
    }

    /// Draws an index in `[0, len)` by scaling a float draw.
    ///
    /// Returns 0 for an empty range so callers indexing a non-empty slice
    /// never need a separate branch.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64).floor() as usize).min(len - 1)
    }

    /// Draws `true` with probability `p` (a single `next_f64() < p` test).
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Picks one item proportionally to its weight.
    ///
    /// One draw is scaled by the total weight and the weights are subtracted in
    /// input order; the first entry that brings the remainder to zero or below
    /// wins. If float drift leaves a positive remainder the last entry is
    /// returned. Returns `None` only for an empty option list.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Weighted, XorShift32};
    ///
    /// let mut rng = XorShift32::new(7);
    /// let options = [Weighted::new("a", 1.0), Weighted::new("b", 3.0)];
    /// let picked = rng.pick_weighted(&options).unwrap();
    /// assert!(*picked == "a" || *picked == "b");
    /// ```
    pub fn pick_weighted<'a, T>(&mut self, options: &'a [Weighted<T>]) -> Option<&'a T> {
        let last = options.last()?;
        let total: f64 = options.iter().map(|o| o.weight).sum();
        let mut remainder = self.next_f64() * total;
        for option in options {
            remainder -= option.weight;
            if remainder <= 0.0 {
                return Some(&option.item);
            }
        }
        Some(&last.item)
    }
}
