//! Curve-modulus fixtures used only by the integration test suite.
//!
//! Mirrors spec.md §8's "test at minimum over BN254, BLS12-381,
//! secp256k1, and a 32-bit toy odd prime" requirement. These are plain
//! `ModulusConfig` impls over hardcoded hex constants — real
//! curve-parameter crates are out of this core's scope (spec.md §1), so
//! the test suite supplies its own minimal fixtures, the same role the
//! teacher's `crypto/tests/secp256r1.rs` has the `p256` crate play as an
//! external oracle.

use arith_core::bigint::BigInt;
use arith_core::field::{Field, ModulusConfig};
use arith_core::word::Word;
use num_bigint::BigUint;

pub fn to_biguint<const N: usize>(words: [Word; N]) -> BigUint {
    let mut bytes = Vec::with_capacity(N * 8);
    for w in words {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    BigUint::from_bytes_le(&bytes)
}

pub fn from_biguint<const N: usize>(v: &BigUint) -> [Word; N] {
    let mut bytes = v.to_bytes_le();
    bytes.resize(N * 8, 0);
    let mut words = [0u64; N];
    for (i, w) in words.iter_mut().enumerate() {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
        *w = Word::from_le_bytes(buf);
    }
    words
}

pub fn modulus_biguint<C: ModulusConfig<N>, const N: usize>() -> BigUint {
    to_biguint(C::MODULUS)
}

/// Reduce an arbitrary `[Word; N]` sample mod the fixture's modulus and
/// lift it into a `Field`, for use as a proptest strategy's mapped value.
pub fn reduced_field<C: ModulusConfig<N>, const N: usize>(raw: [Word; N]) -> Field<C, N> {
    let m = modulus_biguint::<C, N>();
    let reduced = to_biguint(raw) % &m;
    Field::from_big(BigInt::from_words(from_biguint(&reduced)))
}

#[derive(Clone, Copy)]
pub struct Bls12_381Fp;

impl ModulusConfig<6> for Bls12_381Fp {
    const MODULUS: [Word; 6] = [
        0xB9FEFFFFFFFFAAAB,
        0x1EABFFFEB153FFFF,
        0x6730D2A0F6B0F624,
        0x64774B84F38512BF,
        0x4B1BA7B6434BACD7,
        0x1A0111EA397FE69A,
    ];
}
pub type Bls12_381Field = Field<Bls12_381Fp, 6>;

#[derive(Clone, Copy)]
pub struct Bn254Fp;

impl ModulusConfig<4> for Bn254Fp {
    const MODULUS: [Word; 4] = [
        0x3C208C16D87CFD47,
        0x97816A916871CA8D,
        0xB85045B68181585D,
        0x30644E72E131A029,
    ];
}
pub type Bn254Field = Field<Bn254Fp, 4>;

#[derive(Clone, Copy)]
pub struct Secp256k1Fp;

impl ModulusConfig<4> for Secp256k1Fp {
    const MODULUS: [Word; 4] = [
        0xFFFFFFFEFFFFFC2F,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
    ];
}
pub type Secp256k1Field = Field<Secp256k1Fp, 4>;

/// Largest prime below 2^32, a single-limb "toy" modulus used to exercise
/// the general machinery without a 256+-bit fixture.
#[derive(Clone, Copy)]
pub struct ToyFp;

impl ModulusConfig<1> for ToyFp {
    const MODULUS: [Word; 1] = [4294967291];
}
pub type ToyField = Field<ToyFp, 1>;

#[allow(dead_code)]
fn _assert_all_fixtures_compile() {
    let _ = Bls12_381Field::zero();
    let _ = Bn254Field::zero();
    let _ = Secp256k1Field::zero();
    let _ = ToyField::zero();
}
