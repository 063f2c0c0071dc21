//! Wrapped 32-bit sequence numbers
//!
//! On the wire a sequence number is 32 bits, while the stream itself is
//! addressed by 64-bit absolute positions. [`Wrap32`] converts between the two
//! relative to a zero point (the ISN) and, when decoding, a checkpoint that
//! picks which 2^32-period instance the caller means.

use std::fmt;
use std::ops::Add;

/// Size of the wrapped sequence space
const SEQ_SPACE: u64 = 1 << 32;

/// Half the sequence space; the largest distance that still decodes downward
const HALF_SPACE: u64 = 1 << 31;

/// A 32-bit sequence number: `(absolute + zero_point) mod 2^32`
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Wrap32(u32);

impl Wrap32 {
    /// Create a wrapped value from its raw representation
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Wrap32(raw)
    }

    /// Get the raw 32-bit value
    #[inline]
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Wrap an absolute sequence number relative to `zero_point`
    #[inline]
    pub fn wrap(absolute: u64, zero_point: Wrap32) -> Self {
        Wrap32(zero_point.0.wrapping_add(absolute as u32))
    }

    /// Recover the absolute sequence number nearest to `checkpoint`
    ///
    /// Every 64-bit value congruent to `self - zero_point` modulo 2^32 is a
    /// candidate. When two candidates are exactly 2^31 away from the
    /// checkpoint the smaller one is returned.
    pub fn unwrap(self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let offset = u64::from(self.0.wrapping_sub(zero_point.0));

        // No candidate lies below `offset`, so it is the nearest one
        if checkpoint <= offset {
            return offset;
        }

        let below = checkpoint - (checkpoint - offset) % SEQ_SPACE;
        let distance = checkpoint - below;
        if distance <= HALF_SPACE {
            return below;
        }

        below.checked_add(SEQ_SPACE).unwrap_or(below)
    }
}

impl fmt::Debug for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrap32({})", self.0)
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Wrap32 {
    fn from(value: u32) -> Self {
        Wrap32(value)
    }
}

impl From<Wrap32> for u32 {
    fn from(seq: Wrap32) -> u32 {
        seq.0
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32(self.0.wrapping_add(rhs))
    }
}
