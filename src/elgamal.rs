//! Exponential ElGamal over the prime-order subgroup of a safe-prime field.
//!
//! A plaintext `m` is encrypted "in the exponent" as `(g^r, g^m * y^r)`, which
//! makes ciphertexts additively homomorphic: multiplying two ciphertexts adds
//! their plaintexts, and raising a ciphertext to a scalar multiplies its
//! plaintext. The price is that decryption only yields `g^m`, from which `m`
//! is recovered by a bounded discrete-log search. Direct encryption is
//! therefore restricted to plaintexts of at most [`MAX_PLAINTEXT_BITS`] bits.
//!
//! The parameters are deliberately small (a ~66-bit modulus): this is a
//! teaching-grade scheme, not a hardened one.
//!
//! The module also provides a non-interactive zero-knowledge proof that a
//! ciphertext encrypts a bit, see [`PublicKey::prove_bit`].
use rand::{CryptoRng, Rng};
use thiserror::Error;

mod ciphertext;
mod dlog;
mod group;
mod keys;
mod proof;

pub use ciphertext::Ciphertext;
pub use group::{GroupConfig, GroupParams};
pub use keys::{PublicKey, SecretKey};
pub use proof::{BitProof, BitProofNonces};

/// Maximum bit length of a directly encrypted plaintext.
pub const MAX_PLAINTEXT_BITS: u32 = 20;

/// Exclusive upper bound of the discrete-log search run by decryption.
pub const DLOG_BOUND: u64 = 1 << MAX_PLAINTEXT_BITS;

/// Errors raised by the cryptosystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElGamalError {
    /// The plaintext has more than [`MAX_PLAINTEXT_BITS`] bits.
    #[error("plaintext {0} has more than {MAX_PLAINTEXT_BITS} bits")]
    PlaintextTooLarge(u64),
    /// A bit-encryption proof was requested for a plaintext other than 0 or 1.
    #[error("plaintext {0} is not a bit")]
    NotABit(u64),
    /// Group parameters received from another party are malformed.
    #[error("invalid group parameters: {0}")]
    InvalidGroup(&'static str),
    /// A public key received from another party is malformed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(&'static str),
    /// A ciphertext has a degenerate modulus or unreduced components.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(&'static str),
}

/// Generates fresh group parameters with the default [`GroupConfig`] and a
/// key pair over them.
pub fn keygen<R: CryptoRng + Rng + ?Sized>(rng: &mut R) -> (PublicKey, SecretKey) {
    keygen_with(&GroupConfig::default(), rng)
}

/// Generates fresh group parameters according to `config` and a key pair
/// over them.
pub fn keygen_with<R: CryptoRng + Rng + ?Sized>(
    config: &GroupConfig,
    rng: &mut R,
) -> (PublicKey, SecretKey) {
    let params = GroupParams::generate_with(config, rng);
    SecretKey::generate(params, rng)
}
