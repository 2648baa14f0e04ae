//! Raw, untyped, fixed-length multi-precision integers.
//!
//! Every operation here is constant-time with respect to *limb values*.
//! Loop trip counts are always a function of the (public) array lengths
//! passed in, never of the words stored inside them — this is what lets
//! `reduce`, `prod`, etc. accept differently-sized operands (public shape)
//! while staying silent about the secret data flowing through them.

use crate::word::{adc, mac, sbb, widening_mul, Borrow, Carry, SecretBool, Word, WORD_BITS};

/// Upper bound on limb count supported by the cross-width free functions
/// in this module (`prod`, `reduce`, ...), which need a fixed-size stack
/// scratch buffer since the core never allocates. 16 64-bit limbs covers
/// every modulus this engine targets (BLS12-381 needs 6, BN254 and
/// secp256k1 need 4) with ample headroom for larger pairing-friendly
/// families (e.g. BLS24/BLS48 towers).
pub const MAX_LIMBS: usize = 16;

/// A little-endian, fixed-length multi-precision integer with no
/// announced bit-width of its own (that is tracked one layer up, by
/// [`crate::bigint::BigInt`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limbs<const N: usize>(pub [Word; N]);

impl<const N: usize> Default for Limbs<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> Limbs<N> {
    #[inline]
    pub const fn zero() -> Self {
        Self([0; N])
    }

    #[inline]
    pub const fn one() -> Self {
        let mut limbs = [0; N];
        if N > 0 {
            limbs[0] = 1;
        }
        Self(limbs)
    }

    #[inline]
    pub const fn from_word(w: Word) -> Self {
        let mut limbs = [0; N];
        if N > 0 {
            limbs[0] = w;
        }
        Self(limbs)
    }

    #[inline]
    pub fn set_zero(&mut self) {
        *self = Self::zero();
    }

    #[inline]
    pub fn set_one(&mut self) {
        *self = Self::one();
    }

    #[inline]
    pub fn set_word(&mut self, w: Word) {
        *self = Self::from_word(w);
    }

    /// `if ctl { *self = *src }`, with identical memory traffic regardless
    /// of `ctl`.
    #[inline]
    pub fn ccopy(&mut self, src: &Self, ctl: SecretBool) {
        let mask = ctl.mask();
        for i in 0..N {
            self.0[i] ^= (self.0[i] ^ src.0[i]) & mask;
        }
    }

    /// Conditional swap with identical memory traffic regardless of `ctl`.
    #[inline]
    pub fn cswap(a: &mut Self, b: &mut Self, ctl: SecretBool) {
        let mask = ctl.mask();
        for i in 0..N {
            let t = (a.0[i] ^ b.0[i]) & mask;
            a.0[i] ^= t;
            b.0[i] ^= t;
        }
    }

    #[inline]
    pub fn equal(&self, other: &Self) -> SecretBool {
        let mut acc = 0u64;
        for i in 0..N {
            acc |= self.0[i] ^ other.0[i];
        }
        SecretBool::from_bool(acc == 0)
    }

    #[inline]
    pub fn is_zero(&self) -> SecretBool {
        self.equal(&Self::zero())
    }

    #[inline]
    pub fn is_one(&self) -> SecretBool {
        self.equal(&Self::one())
    }

    #[inline]
    pub fn is_odd(&self) -> SecretBool {
        if N == 0 {
            return SecretBool::FALSE;
        }
        SecretBool::from_word(self.0[0] & 1)
    }

    #[inline]
    pub fn is_even(&self) -> SecretBool {
        self.is_odd().not()
    }

    /// Unsigned `self < other`, via subtract-and-observe-borrow.
    #[inline]
    pub fn less(&self, other: &Self) -> SecretBool {
        let mut borrow = 0u64;
        for i in 0..N {
            let (_, b) = sbb(self.0[i], other.0[i], borrow);
            borrow = b;
        }
        SecretBool::from_word(borrow)
    }

    #[inline]
    pub fn less_eq(&self, other: &Self) -> SecretBool {
        self.less(other).or(self.equal(other))
    }

    /// In-place `self += other`, returns the final carry.
    #[inline]
    pub fn add(&mut self, other: &Self) -> Carry {
        let mut carry = 0u64;
        for i in 0..N {
            let (s, c) = adc(self.0[i], other.0[i], carry);
            self.0[i] = s;
            carry = c;
        }
        carry
    }

    /// In-place `self -= other`, returns the final borrow.
    #[inline]
    pub fn sub(&mut self, other: &Self) -> Borrow {
        let mut borrow = 0u64;
        for i in 0..N {
            let (d, b) = sbb(self.0[i], other.0[i], borrow);
            self.0[i] = d;
            borrow = b;
        }
        borrow
    }

    /// Out-of-place `r = a + b`, returns the final carry.
    #[inline]
    pub fn sum(r: &mut Self, a: &Self, b: &Self) -> Carry {
        *r = *a;
        r.add(b)
    }

    /// Out-of-place `r = a - b`, returns the final borrow.
    #[inline]
    pub fn diff(r: &mut Self, a: &Self, b: &Self) -> Borrow {
        *r = *a;
        r.sub(b)
    }

    /// The sum is always computed; it is committed to `self` only when
    /// `ctl` is true. The returned carry always reflects the attempted
    /// addition, independent of `ctl`.
    #[inline]
    pub fn cadd(&mut self, other: &Self, ctl: SecretBool) -> Carry {
        let mut tmp = *self;
        let carry = tmp.add(other);
        self.ccopy(&tmp, ctl);
        carry
    }

    /// As [`Self::cadd`], but subtraction.
    #[inline]
    pub fn csub(&mut self, other: &Self, ctl: SecretBool) -> Borrow {
        let mut tmp = *self;
        let borrow = tmp.sub(other);
        self.ccopy(&tmp, ctl);
        borrow
    }

    /// Conditional two's-complement negation, fused as `(a XOR mask) + ctl`:
    /// when `ctl` is true this computes `-self`; when false, `self` is
    /// unchanged. Both cases perform the identical XOR-then-add-chain.
    #[inline]
    pub fn cneg(&mut self, ctl: SecretBool) {
        let mask = ctl.mask();
        let mut carry = ctl.as_word();
        for i in 0..N {
            let x = self.0[i] ^ mask;
            let (s, c) = adc(x, 0, carry);
            self.0[i] = s;
            carry = c;
        }
    }

    /// Shift the whole value right by `k` bits, `0 < k < WORD_BITS`.
    #[inline]
    pub fn shift_right(&mut self, k: u32) {
        debug_assert!(k > 0 && k < WORD_BITS);
        let mut carry_in = 0u64;
        for i in (0..N).rev() {
            let next_carry = self.0[i] << (WORD_BITS - k);
            self.0[i] = (self.0[i] >> k) | carry_in;
            carry_in = next_carry;
        }
    }

    #[inline]
    pub fn to_words(self) -> [Word; N] {
        self.0
    }

    #[inline]
    pub const fn from_words(words: [Word; N]) -> Self {
        Self(words)
    }
}

/// `r = a * b`, truncated modulo `2^(WORD_BITS * r.len())`. `r` may have
/// fewer or more limbs than `a.len() + b.len()`.
pub fn prod(r: &mut [Word], a: &[Word], b: &[Word]) {
    debug_assert!(a.len() <= MAX_LIMBS && b.len() <= MAX_LIMBS);
    let total = a.len() + b.len();
    let mut acc = [0u64; 2 * MAX_LIMBS];
    for i in 0..a.len() {
        let mut carry = 0u64;
        for j in 0..b.len() {
            let (s, c) = mac(acc[i + j], a[i], b[j], carry);
            acc[i + j] = s;
            carry = c;
        }
        // Fixed trip count (depends only on the public lengths i, a.len(),
        // b.len()), never on the carry value itself.
        for k in (i + b.len())..total {
            let (s, c) = adc(acc[k], 0, carry);
            acc[k] = s;
            carry = c;
        }
    }
    let n = r.len().min(acc.len());
    r[..n].copy_from_slice(&acc[..n]);
    for x in r[n..].iter_mut() {
        *x = 0;
    }
}

/// Barrett-style multiply that only materializes the words of `a * b`
/// starting at `lowest_word_index`; used to compute a quotient estimate
/// without ever producing the full double-width product.
pub fn prod_high_words(r: &mut [Word], a: &[Word], b: &[Word], lowest_word_index: usize) {
    debug_assert!(a.len() <= MAX_LIMBS && b.len() <= MAX_LIMBS);
    let total = a.len() + b.len();
    let mut acc = [0u64; 2 * MAX_LIMBS];
    for i in 0..a.len() {
        let mut carry = 0u64;
        for j in 0..b.len() {
            let (s, c) = mac(acc[i + j], a[i], b[j], carry);
            acc[i + j] = s;
            carry = c;
        }
        for k in (i + b.len())..total {
            let (s, c) = adc(acc[k], 0, carry);
            acc[k] = s;
            carry = c;
        }
    }
    debug_assert!(lowest_word_index <= total);
    let available = total - lowest_word_index;
    let n = r.len().min(available);
    r[..n].copy_from_slice(&acc[lowest_word_index..lowest_word_index + n]);
    for x in r[n..].iter_mut() {
        *x = 0;
    }
}

/// `r = a * a`. Squaring specialization is not implemented separately
/// (spec.md §4.1 permits but does not require one); this falls back to
/// the general product, which is always correct.
pub fn square(r: &mut [Word], a: &[Word]) {
    prod(r, a, a);
}

/// `r = a mod m`, via repeated shift-and-subtract-with-quotient-estimate.
/// `a_bits`/`m_bits` (and therefore the derived limb counts) are public;
/// only the words of `a` and `m` are treated as potentially secret.
/// Requires `m`'s top declared bit to be set and `m_bits <= a_bits`.
pub fn reduce(r: &mut [Word], a: &[Word], a_bits: u32, m: &[Word], m_bits: u32) {
    let m_len = m_bits.div_ceil(WORD_BITS) as usize;
    let a_len = a_bits.div_ceil(WORD_BITS) as usize;
    debug_assert!(m_len >= 1 && m_len <= MAX_LIMBS);
    debug_assert!(a_len >= m_len && a_len <= a.len());
    debug_assert!(m_len <= m.len());
    debug_assert!((m[m_len - 1] >> ((m_bits - 1) % WORD_BITS)) & 1 == 1);

    let seed_len = m_len - 1;
    let mut rbuf = [0u64; MAX_LIMBS];
    for i in 0..seed_len {
        rbuf[i] = a[a_len - seed_len + i];
    }

    let remaining = a_len - seed_len;
    for idx in 0..remaining {
        let next_word = a[remaining - 1 - idx];
        reduce_step(&mut rbuf[..m_len], next_word, &m[..m_len]);
    }

    let n = r.len().min(m_len);
    r[..n].copy_from_slice(&rbuf[..n]);
    for x in r[n..].iter_mut() {
        *x = 0;
    }
}

/// One word-at-a-time step of [`reduce`]: shift `rbuf` left by one word,
/// bringing in `next_word`, then bring the (m_len+1)-word result back
/// into `[0, m)` using a single-word quotient estimate plus two fixed
/// conditional corrections.
fn reduce_step(rbuf: &mut [Word], next_word: Word, m: &[Word]) {
    let n = m.len();
    debug_assert_eq!(rbuf.len(), n);

    let mut ext = [0u64; MAX_LIMBS + 1];
    ext[0] = next_word;
    ext[1..=n].copy_from_slice(rbuf);

    // Quotient digit estimate from the top two words of `ext` and `m`'s
    // top word. By the loop invariant `rbuf < m` before the shift, this
    // is within +1 of the true quotient.
    let top_hi = ext[n];
    let top_lo = if n >= 1 { ext[n - 1] } else { 0 };
    let divisor_top = m[n - 1];
    let dividend = ((top_hi as u128) << WORD_BITS) | (top_lo as u128);
    let q: u64 = (dividend / (divisor_top as u128)) as u64;

    // ext -= q * m
    let mut qm = [0u64; MAX_LIMBS + 1];
    {
        let mut carry = 0u64;
        for i in 0..n {
            let (s, c) = mac(0, q, m[i], carry);
            qm[i] = s;
            carry = c;
        }
        qm[n] = carry;
    }
    let mut borrow = 0u64;
    for i in 0..=n {
        let (d, b) = sbb(ext[i], qm[i], borrow);
        ext[i] = d;
        borrow = b;
    }

    // Correction 1: q overshot by one -> ext went negative -> add m back.
    let add_back = SecretBool::from_word(borrow);
    {
        let mask = add_back.mask();
        let mut carry = 0u64;
        for i in 0..n {
            let (s, c) = adc(ext[i], m[i] & mask, carry);
            ext[i] = s;
            carry = c;
        }
        // the overflow word cancels exactly when the correction fires.
        ext[n] = ext[n].wrapping_add(carry);
    }

    // Correction 2: q undershot by one -> ext[0..n] is still >= m -> subtract.
    let still_ge = cmp_ge(&ext[..n], m);
    {
        let mask = still_ge.mask();
        let mut borrow2 = 0u64;
        for i in 0..n {
            let (d, b) = sbb(ext[i], m[i] & mask, borrow2);
            ext[i] = d;
            borrow2 = b;
        }
    }

    rbuf.copy_from_slice(&ext[..n]);
}

/// Constant-time `a >= b` for equal-length slices.
fn cmp_ge(a: &[Word], b: &[Word]) -> SecretBool {
    debug_assert_eq!(a.len(), b.len());
    let mut borrow = 0u64;
    for i in 0..a.len() {
        let (_, bw) = sbb(a[i], b[i], borrow);
        borrow = bw;
    }
    // borrow=1 means a < b.
    SecretBool::from_word(borrow).not()
}

/// Reinterpret `src` as `dst`, truncating or zero-extending, i.e.
/// `dst = src mod 2^(WORD_BITS * dst.len())`.
pub fn copy_truncated_from(dst: &mut [Word], src: &[Word]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    for x in dst[n..].iter_mut() {
        *x = 0;
    }
}
