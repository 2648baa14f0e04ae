//! Fixed-precision big integers built on top of [`crate::limbs`].
//!
//! `BigInt<LIMBS>` is the unsigned integer type every other layer
//! (Montgomery arithmetic, field elements) is built from. It carries no
//! bit-width of its own beyond `LIMBS * WORD_BITS`; operations that need
//! an announced bit-width narrower than the full limb count (e.g.
//! [`crate::limbs::reduce`]) take it as an explicit parameter.

use crate::limbs::Limbs;
use crate::word::{Borrow, Carry, SecretBool, Word, WORD_BITS};

/// An unsigned `LIMBS * 64`-bit integer, little-endian limb order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BigInt<const LIMBS: usize>(pub(crate) Limbs<LIMBS>);

impl<const LIMBS: usize> BigInt<LIMBS> {
    pub const BITS: u32 = (LIMBS as u32) * WORD_BITS;

    #[inline]
    pub const fn zero() -> Self {
        Self(Limbs::zero())
    }

    #[inline]
    pub const fn one() -> Self {
        Self(Limbs::one())
    }

    #[inline]
    pub const fn from_word(w: Word) -> Self {
        Self(Limbs::from_word(w))
    }

    #[inline]
    pub const fn from_words(words: [Word; LIMBS]) -> Self {
        Self(Limbs::from_words(words))
    }

    #[inline]
    pub fn to_words(self) -> [Word; LIMBS] {
        self.0.to_words()
    }

    /// Decode a little-endian byte string. `bytes.len()` may be shorter
    /// than `LIMBS * 8` (zero-extended) but not longer.
    pub fn from_bytes_le(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= LIMBS * 8);
        let mut words = [0u64; LIMBS];
        for (i, word) in words.iter_mut().enumerate() {
            let start = i * 8;
            if start >= bytes.len() {
                break;
            }
            let end = (start + 8).min(bytes.len());
            let mut buf = [0u8; 8];
            buf[..end - start].copy_from_slice(&bytes[start..end]);
            *word = Word::from_le_bytes(buf);
        }
        Self::from_words(words)
    }

    /// Encode as a little-endian byte string. `out.len()` must be at
    /// least `LIMBS * 8`; any extra trailing bytes are zeroed.
    pub fn to_bytes_le(self, out: &mut [u8]) {
        debug_assert!(out.len() >= LIMBS * 8);
        let words = self.to_words();
        for (i, w) in words.iter().enumerate() {
            out[i * 8..i * 8 + 8].copy_from_slice(&w.to_le_bytes());
        }
        for b in out[LIMBS * 8..].iter_mut() {
            *b = 0;
        }
    }

    #[inline]
    pub fn is_zero(&self) -> SecretBool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_one(&self) -> SecretBool {
        self.0.is_one()
    }

    #[inline]
    pub fn is_odd(&self) -> SecretBool {
        self.0.is_odd()
    }

    #[inline]
    pub fn is_even(&self) -> SecretBool {
        self.0.is_even()
    }

    #[inline]
    pub fn equal(&self, other: &Self) -> SecretBool {
        self.0.equal(&other.0)
    }

    #[inline]
    pub fn less(&self, other: &Self) -> SecretBool {
        self.0.less(&other.0)
    }

    #[inline]
    pub fn less_eq(&self, other: &Self) -> SecretBool {
        self.0.less_eq(&other.0)
    }

    #[inline]
    pub fn ccopy(&mut self, src: &Self, ctl: SecretBool) {
        self.0.ccopy(&src.0, ctl);
    }

    #[inline]
    pub fn cswap(a: &mut Self, b: &mut Self, ctl: SecretBool) {
        Limbs::cswap(&mut a.0, &mut b.0, ctl);
    }

    #[inline]
    pub fn add(&mut self, other: &Self) -> Carry {
        self.0.add(&other.0)
    }

    #[inline]
    pub fn sub(&mut self, other: &Self) -> Borrow {
        self.0.sub(&other.0)
    }

    #[inline]
    pub fn cadd(&mut self, other: &Self, ctl: SecretBool) -> Carry {
        self.0.cadd(&other.0, ctl)
    }

    #[inline]
    pub fn csub(&mut self, other: &Self, ctl: SecretBool) -> Borrow {
        self.0.csub(&other.0, ctl)
    }

    #[inline]
    pub fn cneg(&mut self, ctl: SecretBool) {
        self.0.cneg(ctl);
    }

    #[inline]
    pub fn shift_right(&mut self, k: u32) {
        self.0.shift_right(k);
    }

    /// Doubling, exposed separately since it is the building block of
    /// [`Self::mul_small`] and of Montgomery CIOS/FIPS reduction.
    #[inline]
    pub fn double(&mut self) -> Carry {
        let other = *self;
        self.add(&other)
    }

    /// Multiply by a compile-time-small unsigned constant `k` via a fixed
    /// addition/doubling chain (no data-dependent branches, no loop over
    /// the bits of `k` since `k` is public and bounded).
    ///
    /// `k` must be in `0..=12`; this range covers every small scalar used
    /// by the field and curve layers built on top of this crate (e.g.
    /// curve-specific non-residue multiplications).
    pub fn mul_small(&self, k: u32) -> Self {
        debug_assert!(k <= 12);
        let a = *self;
        match k {
            0 => Self::zero(),
            1 => a,
            2 => {
                let mut r = a;
                r.double();
                r
            }
            3 => {
                let mut r = a;
                r.double();
                r.add(&a);
                r
            }
            4 => {
                let mut r = a;
                r.double();
                r.double();
                r
            }
            5 => {
                let mut r = a;
                r.double();
                r.double();
                r.add(&a);
                r
            }
            6 => {
                // double; capture t2 := 2a (post-first-double, not the
                // original a); double again to 4a; add t2 -> 4a + 2a = 6a.
                let mut r = a;
                r.double();
                let t2 = r;
                r.double();
                r.add(&t2);
                r
            }
            7 => {
                let mut r = a;
                r.double();
                r.double();
                r.double();
                r.sub(&a);
                r
            }
            8 => {
                let mut r = a;
                r.double();
                r.double();
                r.double();
                r
            }
            9 => {
                let mut r = a;
                r.double();
                r.double();
                r.double();
                r.add(&a);
                r
            }
            10 => {
                let mut r = a;
                r.double();
                let t2 = r;
                r.double();
                r.double();
                r.add(&t2);
                r
            }
            11 => {
                let mut r = a;
                r.double();
                let t2 = r;
                r.double();
                r.double();
                r.add(&t2);
                r.add(&a);
                r
            }
            12 => {
                let mut r = a;
                r.double();
                r.double();
                let t4 = r;
                r.double();
                r.add(&t4);
                r
            }
            _ => unreachable!("mul_small only supports k in 0..=12"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mul_small_matches_repeated_addition(a in any::<[u64; 4]>(), k in 0u32..=12) {
            let big = BigInt::<4>::from_words(a);
            let got = big.mul_small(k);

            let mut expected = BigInt::<4>::zero();
            for _ in 0..k {
                expected.add(&big);
            }
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn from_bytes_to_bytes_roundtrip(a in any::<[u64; 4]>()) {
            let big = BigInt::<4>::from_words(a);
            let mut bytes = [0u8; 32];
            big.to_bytes_le(&mut bytes);
            let back = BigInt::<4>::from_bytes_le(&bytes);
            prop_assert_eq!(back, big);
        }
    }
}
