//! Montgomery multiplication, reduction and constant-time exponentiation.
//!
//! Two reduction strategies are provided, selected once per modulus (a
//! public, compile-time choice, not a secret-dependent branch at
//! call-time):
//!
//! - [`monty_mul_cios`] — Coarsely Integrated Operand Scanning. It tracks
//!   the reduction's `< 2m` overflow word explicitly and folds it into the
//!   final conditional subtract, so it is correct for every odd modulus,
//!   not only ones with a spare top bit.
//! - [`monty_mul_sos`] — Separated Operand Scanning, which computes the
//!   full double-width product before reducing. It costs an extra
//!   scratch buffer and more word operations for the same result.
//!
//! [`crate::precompute::can_use_no_carry_mont_mul`] therefore only governs
//! which of the two kernels [`monty_mul`] picks for performance; it is not
//! a correctness precondition on [`monty_mul_cios`] itself (see
//! `cios_matches_sos` below, checked against secp256k1's modulus, which
//! has no spare top bit at all).
//!
//! Every routine here is written to be constant-time with respect to the
//! *values* of `a`, `b` and the exponent: loop bounds only ever depend on
//! the (public) limb count, and data-dependent choices are expressed as
//! masked selects rather than branches.

use crate::word::{adc, mac, sbb, SecretBool, Word};

/// Upper bound on limb count for the fixed-size scratch buffers below;
/// matches [`crate::limbs::MAX_LIMBS`].
const MAX_LIMBS: usize = crate::limbs::MAX_LIMBS;

/// Upper bound on the fixed-window power table, `2^w + 1` entries for
/// window size `w <= 5`.
const MAX_POW_TABLE: usize = 33;

/// `r = a * b * R^-1 mod m`, via CIOS. The running total can reach `2m`
/// before the final correction, which this routine performs itself (using
/// the tracked overflow word), so `r < m` on return regardless of whether
/// `m` has a spare top bit.
pub fn monty_mul_cios(r: &mut [Word], a: &[Word], b: &[Word], m: &[Word], inv: Word) {
    let n = m.len();
    debug_assert!(n <= MAX_LIMBS && a.len() == n && b.len() == n && r.len() == n);

    let mut t = [0u64; MAX_LIMBS + 2];
    for i in 0..n {
        let mut carry = 0u64;
        for j in 0..n {
            let (s, c) = mac(t[j], a[i], b[j], carry);
            t[j] = s;
            carry = c;
        }
        let (s, c) = adc(t[n], carry, 0);
        t[n] = s;
        t[n + 1] = t[n + 1].wrapping_add(c);

        let mu = t[0].wrapping_mul(inv);
        let (_, c0) = mac(t[0], mu, m[0], 0);
        let mut carry2 = c0;
        for j in 1..n {
            let (s, c) = mac(t[j], mu, m[j], carry2);
            t[j - 1] = s;
            carry2 = c;
        }
        let (s, c) = adc(t[n], carry2, 0);
        t[n - 1] = s;
        t[n] = t[n + 1].wrapping_add(c);
        t[n + 1] = 0;
    }

    // `t[..n]` holds the low n words of the reduced value; `t[n]` is the
    // overflow word of the `< 2m` result, which needs an (n+1)-word
    // candidate to represent (spec.md §4.3's FIPS-style "depends on both
    // t[N] != 0 and t < M" final subtract). Dropping it here silently
    // truncated the result whenever `m` has no spare top bit.
    final_conditional_subtract(r, &t[..n], t[n], m);
}

/// `r = a * b * R^-1 mod m`, via Separated Operand Scanning: the full
/// `2n`-word schoolbook product is formed first, then reduced one word
/// at a time. Makes no assumption about spare bits in `m`.
pub fn monty_mul_sos(r: &mut [Word], a: &[Word], b: &[Word], m: &[Word], inv: Word) {
    let n = m.len();
    debug_assert!(n <= MAX_LIMBS && a.len() == n && b.len() == n && r.len() == n);

    let mut t = [0u64; 2 * MAX_LIMBS];
    crate::limbs::prod(&mut t[..2 * n], a, b);
    redc_into(r, &t[..2 * n], m, inv);
}

/// Reduce an arbitrary `2n`-word value `t` (not necessarily a product of
/// two already-reduced operands) by `m`: `r = t * R^-1 mod m`. Used both
/// by [`monty_mul_sos`] and directly by [`monty_redc_2x`] for reducing
/// double-width field accumulators.
pub fn redc_into(r: &mut [Word], t_in: &[Word], m: &[Word], inv: Word) {
    let n = m.len();
    debug_assert!(n <= MAX_LIMBS && r.len() == n && t_in.len() == 2 * n);

    let mut t = [0u64; 2 * MAX_LIMBS + 1];
    t[..2 * n].copy_from_slice(t_in);

    for i in 0..n {
        let mu = t[i].wrapping_mul(inv);
        let mut carry = 0u64;
        for j in 0..n {
            let (s, c) = mac(t[i + j], mu, m[j], carry);
            t[i + j] = s;
            carry = c;
        }
        // Propagate the carry through the rest of the buffer. The trip
        // count (2n + 1 - (i + n)) depends only on the public index `i`,
        // not on the carry value, so this keeps the routine constant-time
        // even once the carry has gone to zero.
        for k in (i + n)..(2 * n + 1) {
            let (s, c) = adc(t[k], 0, carry);
            t[k] = s;
            carry = c;
        }
    }

    // As in `monty_mul_cios`: `t[n..2n]` is only the low n words of a
    // result that can be as large as `< 2m`, which needs `t[2n]` (the
    // overflow word produced by the final carry-propagation pass above)
    // to represent faithfully.
    final_conditional_subtract(r, &t[n..2 * n], t[2 * n], m);
}

/// Commits `candidate - m` into `r` whenever the full `(n+1)`-word value
/// `overflow:candidate` is `>= m`, i.e. whenever `overflow != 0` (which
/// alone already puts the value past any n-word `m`) or `candidate >= m`.
/// `overflow` must be 0 or 1, per the `< 2m` bound every Montgomery
/// reduction in this module produces.
fn final_conditional_subtract(r: &mut [Word], candidate: &[Word], overflow: Word, m: &[Word]) {
    debug_assert!(overflow <= 1);
    let n = m.len();
    let mut tmp = [0u64; MAX_LIMBS];
    let mut borrow = 0u64;
    for i in 0..n {
        let (d, b) = sbb(candidate[i], m[i], borrow);
        tmp[i] = d;
        borrow = b;
    }
    let ge = SecretBool::from_word(borrow).not();
    let commit = ge.or(SecretBool::from_word(overflow));
    let mask = commit.mask();
    for i in 0..n {
        r[i] = candidate[i] ^ ((candidate[i] ^ tmp[i]) & mask);
    }
}

/// Dispatches to [`monty_mul_cios`] or [`monty_mul_sos`] based on a
/// public, per-modulus flag decided once (at `ModulusConfig` definition
/// time), never per call on secret data.
#[inline]
pub fn monty_mul(r: &mut [Word], a: &[Word], b: &[Word], m: &[Word], inv: Word, no_carry_friendly: bool) {
    if no_carry_friendly {
        monty_mul_cios(r, a, b, m, inv);
    } else {
        monty_mul_sos(r, a, b, m, inv);
    }
}

#[inline]
pub fn monty_square(r: &mut [Word], a: &[Word], m: &[Word], inv: Word, no_carry_friendly: bool) {
    monty_mul(r, a, a, m, inv, no_carry_friendly);
}

/// Reduce a double-width value down to Montgomery-reduced form. Alias
/// for [`redc_into`], named to match the field-squaring layer's
/// vocabulary ([`crate::fp_dbl`]).
#[inline]
pub fn monty_redc_2x(r: &mut [Word], t: &[Word], m: &[Word], inv: Word) {
    redc_into(r, t, m, inv);
}

/// Lift `a` (an ordinary residue, `0 <= a < m`) into Montgomery form:
/// `r = a * R mod m`, computed as a single Montgomery multiplication by
/// the precomputed constant `R^2 mod m`.
#[inline]
pub fn monty_residue(r: &mut [Word], a: &[Word], m: &[Word], r2: &[Word], inv: Word, no_carry_friendly: bool) {
    monty_mul(r, a, r2, m, inv, no_carry_friendly);
}

fn get_bit(bytes: &[u8], bit_pos: u32) -> u32 {
    let byte_idx = (bit_pos / 8) as usize;
    if byte_idx >= bytes.len() {
        return 0;
    }
    ((bytes[byte_idx] >> (bit_pos % 8)) & 1) as u32
}

/// Extract window `w_idx` (counting from the most significant) of width
/// `window_bits` from a little-endian exponent byte string, treating any
/// bit position at or beyond `exponent_bits` as zero. All arguments
/// other than `exponent` are public, so the index arithmetic here leaks
/// nothing; only `exponent`'s *bit values* are secret, and those are
/// read via a fixed, publicly-determined sequence of bit positions.
fn extract_window(exponent: &[u8], exponent_bits: u32, w_idx: u32, window_bits: u32, padded_bits: u32) -> u32 {
    let hi = padded_bits - w_idx * window_bits;
    let lo = hi - window_bits;
    let mut value = 0u32;
    for bit_pos in lo..hi {
        let bit = if bit_pos < exponent_bits {
            get_bit(exponent, bit_pos)
        } else {
            0
        };
        value = (value << 1) | bit;
    }
    value
}

/// Constant-time fixed-window modular exponentiation in Montgomery
/// domain: `out = base^exponent * R^-1... ` — more precisely, if `base`
/// is already in Montgomery form, `out` is `base^exponent` in Montgomery
/// form too (Montgomery exponentiation is self-dual: every intermediate
/// product carries exactly one factor of `R^-1` per multiplication, and
/// `exponent` multiplications occur net of the initial identity, leaving
/// the Montgomery scaling invariant).
///
/// `window_bits` must be in `1..=5`; the scratch table holds
/// `2^window_bits + 1` entries (`base^0 ..= base^(2^window_bits)`), each
/// looked up via a full constant-time scan rather than an index.
#[allow(clippy::too_many_arguments)]
pub fn monty_pow(
    out: &mut [Word],
    base: &[Word],
    exponent: &[u8],
    exponent_bits: u32,
    m: &[Word],
    inv: Word,
    montgomery_one: &[Word],
    window_bits: u32,
    no_carry_friendly: bool,
) {
    let n = m.len();
    debug_assert!(window_bits >= 1 && window_bits <= 5);
    debug_assert!(n <= MAX_LIMBS && base.len() == n && out.len() == n && montgomery_one.len() == n);

    let table_len = (1usize << window_bits) + 1;
    debug_assert!(table_len <= MAX_POW_TABLE);

    let mut table = [[0u64; MAX_LIMBS]; MAX_POW_TABLE];
    table[0][..n].copy_from_slice(montgomery_one);
    table[1][..n].copy_from_slice(base);
    for i in 2..table_len {
        let (lo, hi) = table.split_at_mut(i);
        monty_mul(&mut hi[0][..n], &lo[i - 1][..n], base, m, inv, no_carry_friendly);
    }

    let total_windows = exponent_bits.div_ceil(window_bits).max(1);
    let padded_bits = total_windows * window_bits;

    let mut acc = [0u64; MAX_LIMBS];
    acc[..n].copy_from_slice(montgomery_one);

    for w_idx in 0..total_windows {
        for _ in 0..window_bits {
            let cur = acc;
            monty_square(&mut acc[..n], &cur[..n], m, inv, no_carry_friendly);
        }

        let window_value = extract_window(exponent, exponent_bits, w_idx, window_bits, padded_bits);

        let mut selected = [0u64; MAX_LIMBS];
        for (cand, entry) in table.iter().enumerate().take(table_len) {
            let ctl = SecretBool::from_bool(cand as u32 == window_value);
            let mask = ctl.mask();
            for k in 0..n {
                selected[k] ^= (selected[k] ^ entry[k]) & mask;
            }
        }

        let cur = acc;
        monty_mul(&mut acc[..n], &cur[..n], &selected[..n], m, inv, no_carry_friendly);
    }

    out[..n].copy_from_slice(&acc[..n]);
}

/// Square-and-multiply exponentiation that branches directly on the bits
/// of `exponent`. Only sound for **public** exponents (e.g. a curve's
/// fixed cofactor, or a Frobenius/Legendre exponent), since its running
/// time and memory access pattern depend on the exponent's bits.
pub fn monty_pow_unsafe_exponent(
    out: &mut [Word],
    base: &[Word],
    exponent: &[u8],
    exponent_bits: u32,
    m: &[Word],
    inv: Word,
    montgomery_one: &[Word],
    no_carry_friendly: bool,
) {
    let n = m.len();
    debug_assert!(n <= MAX_LIMBS && base.len() == n && out.len() == n);

    let mut acc = [0u64; MAX_LIMBS];
    acc[..n].copy_from_slice(montgomery_one);

    for bit_pos in (0..exponent_bits).rev() {
        let cur = acc;
        monty_square(&mut acc[..n], &cur[..n], m, inv, no_carry_friendly);
        if get_bit(exponent, bit_pos) == 1 {
            let cur = acc;
            monty_mul(&mut acc[..n], &cur[..n], base, m, inv, no_carry_friendly);
        }
    }

    out[..n].copy_from_slice(&acc[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precompute::{mod_inv_word, montgomery_r, montgomery_r2};
    use num_bigint::BigUint;
    use proptest::prelude::*;

    const SECP256K1_P: [Word; 4] = [
        0xFFFFFFFEFFFFFC2F,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
    ];

    fn to_biguint(words: &[Word]) -> BigUint {
        let mut bytes = Vec::with_capacity(words.len() * 8);
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        BigUint::from_bytes_le(&bytes)
    }

    fn from_biguint(v: &BigUint, n: usize) -> [Word; 4] {
        let mut bytes = v.to_bytes_le();
        bytes.resize(n * 8, 0);
        let mut out = [0u64; 4];
        for i in 0..n {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
            out[i] = Word::from_le_bytes(buf);
        }
        out
    }

    fn reduce_mod_p(v: &BigUint) -> BigUint {
        v % to_biguint(&SECP256K1_P)
    }

    proptest! {
        #[test]
        fn cios_matches_sos(a_raw in any::<[u64; 4]>(), b_raw in any::<[u64; 4]>()) {
            let a = from_biguint(&reduce_mod_p(&to_biguint(&a_raw)), 4);
            let b = from_biguint(&reduce_mod_p(&to_biguint(&b_raw)), 4);
            let inv = mod_inv_word(SECP256K1_P[0]);

            let mut r_cios = [0u64; 4];
            monty_mul_cios(&mut r_cios, &a, &b, &SECP256K1_P, inv);
            let mut r_sos = [0u64; 4];
            monty_mul_sos(&mut r_sos, &a, &b, &SECP256K1_P, inv);
            prop_assert_eq!(r_cios, r_sos);
        }

        #[test]
        fn monty_mul_matches_oracle(a_raw in any::<[u64; 4]>(), b_raw in any::<[u64; 4]>()) {
            // secp256k1's modulus has an all-ones top limb, i.e. no spare
            // top bit, so `no_carry_friendly = false` here actually
            // exercises `monty_mul_sos`/`redc_into`'s overflow-word
            // handling, not just `monty_mul_cios`'s.
            let p = to_biguint(&SECP256K1_P);
            let a = reduce_mod_p(&to_biguint(&a_raw));
            let b = reduce_mod_p(&to_biguint(&b_raw));
            let inv = mod_inv_word(SECP256K1_P[0]);
            let r2 = montgomery_r2(SECP256K1_P);

            let mut a_mont = [0u64; 4];
            monty_residue(&mut a_mont, &from_biguint(&a, 4), &SECP256K1_P, &r2, inv, false);
            let mut b_mont = [0u64; 4];
            monty_residue(&mut b_mont, &from_biguint(&b, 4), &SECP256K1_P, &r2, inv, false);

            let mut prod_mont_cios = [0u64; 4];
            monty_mul_cios(&mut prod_mont_cios, &a_mont, &b_mont, &SECP256K1_P, inv);
            let mut prod_mont_sos = [0u64; 4];
            monty_mul_sos(&mut prod_mont_sos, &a_mont, &b_mont, &SECP256K1_P, inv);
            prop_assert_eq!(prod_mont_cios, prod_mont_sos);

            // convert back out of Montgomery form via redc with a 1 in the high half
            let mut wide = [0u64; 8];
            wide[..4].copy_from_slice(&prod_mont_cios);
            let mut prod_plain = [0u64; 4];
            redc_into(&mut prod_plain, &wide, &SECP256K1_P, inv);

            let expected = (&a * &b) % &p;
            prop_assert_eq!(to_biguint(&prod_plain), expected);
        }
    }

    /// Fixed regression for the overflow-word truncation this module used
    /// to have: `a = b = p - 1` pushes the CIOS/SOS running total to
    /// within a word of its `< 2m` bound, so dropping the (n+1)-th word of
    /// the reduction previously produced a result off by exactly `p`.
    #[test]
    fn redc_handles_full_overflow_word() {
        let p = to_biguint(&SECP256K1_P);
        let a = &p - 1u32;
        let inv = mod_inv_word(SECP256K1_P[0]);
        let r2 = montgomery_r2(SECP256K1_P);

        let mut a_mont = [0u64; 4];
        monty_residue(&mut a_mont, &from_biguint(&a, 4), &SECP256K1_P, &r2, inv, false);

        let mut prod_mont = [0u64; 4];
        monty_mul_cios(&mut prod_mont, &a_mont, &a_mont, &SECP256K1_P, inv);
        let mut prod_mont_sos = [0u64; 4];
        monty_mul_sos(&mut prod_mont_sos, &a_mont, &a_mont, &SECP256K1_P, inv);
        assert_eq!(prod_mont, prod_mont_sos);

        let mut wide = [0u64; 8];
        wide[..4].copy_from_slice(&prod_mont);
        let mut prod_plain = [0u64; 4];
        redc_into(&mut prod_plain, &wide, &SECP256K1_P, inv);

        let expected = (&a * &a) % &p;
        assert_eq!(to_biguint(&prod_plain), expected);
    }
}
