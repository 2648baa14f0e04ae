//! Unreduced double-width (`2*LIMBS`-word) accumulator for lazy reduction.
//!
//! Extension-field towers (Fp2, Fp6, Fp12, ...) perform many
//! multiply-accumulate steps per reduction; reducing eagerly after each
//! `Field::mul` throws away that opportunity. `FpDbl` instead holds the
//! unreduced product/sum in `[0, 2^(LIMBS*WORD_BITS) * MODULUS)` and only
//! pays for a single [`FpDbl::reduce`] once the whole accumulation chain
//! is done.

use crate::field::{Field, ModulusConfig};
use crate::limbs;
use crate::montgomery;
use crate::word::{SecretBool, Word};

/// A value in `[0, 2^(LIMBS*WORD_BITS) * MODULUS)`, little-endian,
/// `2*LIMBS` words wide. Not itself in Montgomery form relative to any
/// particular `R`; it is simply the raw accumulator `Field` values are
/// multiplied and summed into before a final reduction back down.
#[derive(Clone, Copy)]
pub struct FpDbl<C: ModulusConfig<LIMBS>, const LIMBS: usize> {
    value: [Word; 2 * LIMBS],
    _config: core::marker::PhantomData<C>,
}

impl<C: ModulusConfig<LIMBS>, const LIMBS: usize> FpDbl<C, LIMBS> {
    #[inline]
    fn wrap(value: [Word; 2 * LIMBS]) -> Self {
        Self {
            value,
            _config: core::marker::PhantomData,
        }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::wrap([0; 2 * LIMBS])
    }

    /// Double-width modulus `2^(LIMBS*WORD_BITS) * MODULUS`, used by
    /// [`Self::mod_add`]/[`Self::mod_sub`]'s conditional correction.
    fn doubled_modulus() -> [Word; 2 * LIMBS] {
        let mut m = [0u64; 2 * LIMBS];
        m[LIMBS..].copy_from_slice(&C::MODULUS);
        m
    }

    /// Unreduced in-place addition; may exceed `doubled_modulus()` by one
    /// bit, same as plain limb addition.
    pub fn dbl_add(&mut self, other: &Self) {
        let mut carry = 0u64;
        for i in 0..(2 * LIMBS) {
            let (s, c) = crate::word::adc(self.value[i], other.value[i], carry);
            self.value[i] = s;
            carry = c;
        }
    }

    /// Unreduced in-place subtraction; underflows (wraps) exactly like
    /// plain limb subtraction, with no modular correction.
    pub fn dbl_sub(&mut self, other: &Self) {
        let mut borrow = 0u64;
        for i in 0..(2 * LIMBS) {
            let (d, b) = crate::word::sbb(self.value[i], other.value[i], borrow);
            self.value[i] = d;
            borrow = b;
        }
    }

    /// Modular addition: unreduced add, then conditionally subtract
    /// `2^(LIMBS*WORD_BITS) * MODULUS` once if the sum overflowed or still
    /// exceeds it. Keeps the invariant `value < 2^(LIMBS*WORD_BITS) *
    /// MODULUS` across an accumulation chain.
    pub fn mod_add(&mut self, other: &Self) {
        let m2 = Self::doubled_modulus();
        let mut carry = 0u64;
        for i in 0..(2 * LIMBS) {
            let (s, c) = crate::word::adc(self.value[i], other.value[i], carry);
            self.value[i] = s;
            carry = c;
        }
        let ge = cmp_ge(&self.value, &m2);
        let ctl = ge.or(SecretBool::from_word(carry));
        csub_array(&mut self.value, &m2, ctl);
    }

    /// Modular subtraction: unreduced sub, then conditionally add
    /// `2^(LIMBS*WORD_BITS) * MODULUS` back once if it borrowed.
    pub fn mod_sub(&mut self, other: &Self) {
        let mut borrow = 0u64;
        for i in 0..(2 * LIMBS) {
            let (d, b) = crate::word::sbb(self.value[i], other.value[i], borrow);
            self.value[i] = d;
            borrow = b;
        }
        let m2 = Self::doubled_modulus();
        cadd_array(&mut self.value, &m2, SecretBool::from_word(borrow));
    }

    /// `self = a * b`, the full `2*LIMBS`-wide schoolbook product of two
    /// ordinary (Montgomery-form) field elements.
    pub fn mul_dbl(a: &Field<C, LIMBS>, b: &Field<C, LIMBS>) -> Self {
        let mut out = [0u64; 2 * LIMBS];
        limbs::prod(&mut out, a.montgomery_words(), b.montgomery_words());
        Self::wrap(out)
    }

    /// `self = a * a`.
    pub fn square_dbl(a: &Field<C, LIMBS>) -> Self {
        let mut out = [0u64; 2 * LIMBS];
        limbs::square(&mut out, a.montgomery_words());
        Self::wrap(out)
    }

    /// Collapse the accumulator back into a single-width Montgomery field
    /// element via one `monty_redc_2x` call.
    pub fn reduce(&self) -> Field<C, LIMBS> {
        let mut out = [0u64; LIMBS];
        montgomery::monty_redc_2x(&mut out, &self.value, &C::MODULUS, C::INV);
        Field::from_montgomery_words(&out)
    }
}

fn cmp_ge<const M: usize>(a: &[Word; M], b: &[Word; M]) -> SecretBool {
    let mut borrow = 0u64;
    for i in 0..M {
        let (_, bw) = crate::word::sbb(a[i], b[i], borrow);
        borrow = bw;
    }
    SecretBool::from_word(borrow).not()
}

fn csub_array<const M: usize>(a: &mut [Word; M], b: &[Word; M], ctl: SecretBool) {
    let mut tmp = *a;
    let mut borrow = 0u64;
    for i in 0..M {
        let (d, bw) = crate::word::sbb(tmp[i], b[i], borrow);
        tmp[i] = d;
        borrow = bw;
    }
    let _ = borrow;
    let mask = ctl.mask();
    for i in 0..M {
        a[i] ^= (a[i] ^ tmp[i]) & mask;
    }
}

fn cadd_array<const M: usize>(a: &mut [Word; M], b: &[Word; M], ctl: SecretBool) {
    let mut tmp = *a;
    let mut carry = 0u64;
    for i in 0..M {
        let (s, c) = crate::word::adc(tmp[i], b[i], carry);
        tmp[i] = s;
        carry = c;
    }
    let _ = carry;
    let mask = ctl.mask();
    for i in 0..M {
        a[i] ^= (a[i] ^ tmp[i]) & mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::BigInt;

    #[derive(Clone, Copy)]
    struct ToyPrime;

    impl ModulusConfig<1> for ToyPrime {
        const MODULUS: [Word; 1] = [4294967291];
    }

    type ToyField = Field<ToyPrime, 1>;
    type ToyDbl = FpDbl<ToyPrime, 1>;

    /// secp256k1's field modulus: an all-ones top limb, i.e. no spare top
    /// bit, so `FpDbl::reduce`'s `monty_redc_2x` call goes through the
    /// reduction's overflow-word path rather than the friendly-modulus
    /// fast case `ToyPrime` alone would exercise.
    #[derive(Clone, Copy)]
    struct UnfriendlyPrime;

    impl ModulusConfig<4> for UnfriendlyPrime {
        const MODULUS: [Word; 4] = [
            0xFFFFFFFEFFFFFC2F,
            0xFFFFFFFFFFFFFFFF,
            0xFFFFFFFFFFFFFFFF,
            0xFFFFFFFFFFFFFFFF,
        ];
    }

    type UnfriendlyField = Field<UnfriendlyPrime, 4>;
    type UnfriendlyDbl = FpDbl<UnfriendlyPrime, 4>;

    #[test]
    fn mul_dbl_reduce_matches_field_mul() {
        let a = ToyField::from_big(BigInt::from_word(123456));
        let b = ToyField::from_big(BigInt::from_word(987654));
        let via_dbl = ToyDbl::mul_dbl(&a, &b).reduce();
        let direct = a.mul(&b);
        assert_eq!(via_dbl, direct);
    }

    #[test]
    fn square_dbl_reduce_matches_field_square() {
        let a = ToyField::from_big(BigInt::from_word(424242));
        let via_dbl = ToyDbl::square_dbl(&a).reduce();
        let direct = a.square();
        assert_eq!(via_dbl, direct);
    }

    #[test]
    fn mod_add_then_mod_sub_roundtrips() {
        let a = ToyField::from_big(BigInt::from_word(111));
        let b = ToyField::from_big(BigInt::from_word(222));
        let mut acc = ToyDbl::mul_dbl(&a, &b);
        let delta = ToyDbl::mul_dbl(&a, &a);
        let before = acc.reduce();
        acc.mod_add(&delta);
        acc.mod_sub(&delta);
        assert_eq!(acc.reduce(), before);
    }

    #[test]
    fn reduce_matches_field_mul_on_unfriendly_modulus() {
        let a = UnfriendlyField::from_big(BigInt::from_word(u64::MAX));
        let b = UnfriendlyField::from_big(BigInt::from_word(u64::MAX - 1));
        let via_dbl = UnfriendlyDbl::mul_dbl(&a, &b).reduce();
        let direct = a.mul(&b);
        assert_eq!(via_dbl, direct);

        let via_dbl_sq = UnfriendlyDbl::square_dbl(&a).reduce();
        let direct_sq = a.square();
        assert_eq!(via_dbl_sq, direct_sq);
    }
}
