//! Constant-time multi-precision and Montgomery-form field arithmetic for
//! pairing-friendly elliptic curves.
//!
//! This crate is the arithmetic kernel curve and pairing implementations
//! are built on top of: fixed-width limb arithmetic, Montgomery
//! multiplication/exponentiation, Möller's binary GCD for modular
//! inversion, and odd-prime field arithmetic including square roots. It
//! deliberately stops short of curve point arithmetic, pairings, and any
//! curve-specific parameter tables — those are external collaborators
//! consuming the [`field::ModulusConfig`] interface this crate defines.
//!
//! No heap allocation, no I/O, no panics on defined inputs: every loop
//! bound is a compile-time constant derived from the announced bit width,
//! and every operation on secret data is written to be constant-time
//! (fixed instruction sequence, no secret-indexed memory access) — see
//! each module's documentation for the precise contract.
#![cfg_attr(not(test), no_std)]

pub mod bigint;
pub mod field;
pub mod fp_dbl;
pub mod inversion;
pub mod limbs;
pub mod montgomery;
pub mod precompute;
pub mod word;

pub use bigint::BigInt;
pub use field::{Field, ModulusConfig, SqrtStrategy};
pub use fp_dbl::FpDbl;
pub use limbs::Limbs;
pub use word::{Borrow, Carry, SecretBool, Word, WORD_BITS};
