//! Constant-time modular inversion via a binary (Möller-style) extended
//! GCD, generalized over the limb count.
//!
//! This is deliberately a different algorithm shape from the
//! divstep/safegcd inversions written for fixed, hardcoded moduli (such
//! as secp256k1's field): those specialize the transition matrix to one
//! curve's prime and branch on a 62-bit signed delta tracked across
//! iterations. Here the modulus is a runtime (const-generic-width, but
//! value-generic) parameter, so the algorithm instead runs one
//! elementary halve-or-subtract micro-step per round, for a fixed round
//! count that only depends on the public bit width — never on the
//! values of `a` or `m`.
//!
//! Loop invariant maintained throughout: `A * a ≡ u (mod m)` and
//! `C * a ≡ v (mod m)`, with `u, v` the evolving binary-GCD magnitudes
//! (`u` starts at `a mod m`, `v` starts at `m`). The algorithm halts once
//! `u = 0`, at which point `v = gcd(a, m)` and `C` is the inverse of `a`
//! whenever that gcd is `1`.

use crate::bigint::BigInt;
use crate::word::SecretBool;

/// `m` must be odd. `a` must be invertible mod `m` (`gcd(a, m) == 1`);
/// callers that cannot guarantee this (e.g. field inversion of zero)
/// must special-case it themselves, as this routine's output is
/// otherwise meaningless. Constant-time in the values of `a` and `m`'s
/// non-top-level structure; the modulus's bit width is public.
pub fn mod_inverse<const LIMBS: usize>(a: &BigInt<LIMBS>, m: &BigInt<LIMBS>) -> BigInt<LIMBS> {
    debug_assert!(m.is_odd().to_bool(), "modulus must be odd");
    debug_assert!(a.less(m).to_bool(), "a must already be reduced mod m");

    let mut u = *a;
    let mut v = *m;
    let mut acc_a = BigInt::<LIMBS>::one();
    let mut acc_c = BigInt::<LIMBS>::zero();

    let bits = BigInt::<LIMBS>::BITS;
    let rounds = 2 * bits;

    for _ in 0..rounds {
        let u_even = u.is_even();
        let v_even = v.is_even();
        // both-odd branch is only meaningful when u is odd; guard it so
        // it never fires on an iteration where `u_even` already did.
        let both_odd = u_even.not().and(v_even.not());

        // Candidate 1: u even -> halve u, halve A (mod m).
        let mut u_halved = u;
        u_halved.shift_right_one_bit();
        let a_halved = half_mod_m(&acc_a, m);

        // Candidate 2: u odd, v even -> halve v, halve C (mod m).
        let mut v_halved = v;
        v_halved.shift_right_one_bit();
        let c_halved = half_mod_m(&acc_c, m);

        // Candidate 3: both odd -> subtract smaller from larger.
        let u_ge_v = v.less(&u).or(u.equal(&v));
        let mut u_minus_v = u;
        u_minus_v.sub(&v);
        let mut v_minus_u = v;
        v_minus_u.sub(&u);
        let a_minus_c = sub_mod_m(&acc_a, &acc_c, m);
        let c_minus_a = sub_mod_m(&acc_c, &acc_a, m);

        let new_u_both_odd_ge = u_minus_v;
        let new_v_both_odd_lt = v_minus_u;

        // Select within the both-odd branch: only one of u, v changes,
        // the other stays put (already its default in `u_both`/`v_both`).
        let mut u_both = u;
        u_both.ccopy(&new_u_both_odd_ge, u_ge_v);
        let mut v_both = v;
        v_both.ccopy(&new_v_both_odd_lt, u_ge_v.not());

        let mut a_both = acc_a;
        a_both.ccopy(&a_minus_c, u_ge_v);
        let mut c_both = acc_c;
        c_both.ccopy(&c_minus_a, u_ge_v.not());

        // Final per-round select across the three mutually exclusive
        // branches.
        let mut new_u = u;
        new_u.ccopy(&u_halved, u_even);
        new_u.ccopy(&u_both, both_odd);

        let mut new_v = v;
        new_v.ccopy(&v_halved, u_even.not().and(v_even));
        new_v.ccopy(&v_both, both_odd);

        let mut new_a = acc_a;
        new_a.ccopy(&a_halved, u_even);
        new_a.ccopy(&a_both, both_odd);

        let mut new_c = acc_c;
        new_c.ccopy(&c_halved, u_even.not().and(v_even));
        new_c.ccopy(&c_both, both_odd);

        u = new_u;
        v = new_v;
        acc_a = new_a;
        acc_c = new_c;
    }

    debug_assert!(u.is_zero().to_bool(), "binary gcd did not converge in the allotted rounds");
    debug_assert!(v.is_one().to_bool(), "a is not invertible mod m (gcd != 1)");
    acc_c
}

fn half_mod_m<const LIMBS: usize>(a: &BigInt<LIMBS>, m: &BigInt<LIMBS>) -> BigInt<LIMBS> {
    let odd = a.is_odd();
    let mut lifted = *a;
    lifted.cadd(m, odd); // a + m if a is odd (always even afterwards, since m is odd)
    lifted.shift_right_one_bit();
    lifted
}

fn sub_mod_m<const LIMBS: usize>(x: &BigInt<LIMBS>, y: &BigInt<LIMBS>, m: &BigInt<LIMBS>) -> BigInt<LIMBS> {
    let mut r = *x;
    let borrow = r.sub(y);
    r.cadd(m, SecretBool::from_word(borrow));
    r
}

impl<const LIMBS: usize> BigInt<LIMBS> {
    /// Shift right by exactly one bit; a thin wrapper kept separate from
    /// [`BigInt::shift_right`] since that routine requires `0 < k <
    /// WORD_BITS` and callers here always want `k = 1`.
    #[inline]
    fn shift_right_one_bit(&mut self) {
        self.shift_right(1);
    }
}
