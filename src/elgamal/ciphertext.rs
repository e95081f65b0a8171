//! Ciphertexts and their homomorphic algebra.
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::{ElGamalError, group::invert_mod_prime};

/// An ElGamal ciphertext `(c1, c2) = (g^r, g^m * y^r)` modulo `p`.
///
/// Operations on ciphertexts translate to operations on plaintexts:
///
/// * [`Ciphertext::add`] adds the plaintexts,
/// * [`Ciphertext::negate`] negates the plaintext,
/// * [`Ciphertext::subtract`] subtracts the plaintexts,
/// * [`Ciphertext::scalar_mul`] multiplies the plaintext by an integer.
///
/// The same operations are available as `+`, unary `-`, `-` and `*` on
/// references.
///
/// The modulus is at least 3 and both components are reduced modulo it.
/// Ciphertexts received from another party are checked on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCiphertext")]
pub struct Ciphertext {
    p: BigUint,
    c1: BigUint,
    c2: BigUint,
}

#[derive(Deserialize)]
struct RawCiphertext {
    p: BigUint,
    c1: BigUint,
    c2: BigUint,
}

impl TryFrom<RawCiphertext> for Ciphertext {
    type Error = ElGamalError;

    fn try_from(raw: RawCiphertext) -> Result<Self, Self::Error> {
        Self::new(raw.p, raw.c1, raw.c2)
    }
}

impl Ciphertext {
    /// Creates a ciphertext from its components.
    ///
    /// Fails if `p < 3` or if a component is not reduced modulo `p`.
    pub fn new(p: BigUint, c1: BigUint, c2: BigUint) -> Result<Self, ElGamalError> {
        if p < BigUint::from(3u32) {
            return Err(ElGamalError::InvalidCiphertext("modulus is below 3"));
        }
        if c1 >= p || c2 >= p {
            return Err(ElGamalError::InvalidCiphertext("component is not reduced"));
        }
        Ok(Self { p, c1, c2 })
    }

    /// Components computed modulo a group's `p`, which is at least 3.
    pub(crate) fn from_parts(p: BigUint, c1: BigUint, c2: BigUint) -> Self {
        debug_assert!(p >= BigUint::from(3u32) && c1 < p && c2 < p);
        Self { p, c1, c2 }
    }

    /// The modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// First component, `g^r`.
    pub fn c1(&self) -> &BigUint {
        &self.c1
    }

    /// Second component, `g^m * y^r`.
    pub fn c2(&self) -> &BigUint {
        &self.c2
    }

    /// Encrypts the sum of both plaintexts.
    ///
    /// # Panics
    /// If the ciphertexts use different moduli.
    pub fn add(&self, other: &Ciphertext) -> Ciphertext {
        self.assert_same_modulus(other);
        Ciphertext {
            p: self.p.clone(),
            c1: &self.c1 * &other.c1 % &self.p,
            c2: &self.c2 * &other.c2 % &self.p,
        }
    }

    /// Encrypts the negated plaintext.
    pub fn negate(&self) -> Ciphertext {
        Ciphertext {
            p: self.p.clone(),
            c1: invert_mod_prime(&self.c1, &self.p),
            c2: invert_mod_prime(&self.c2, &self.p),
        }
    }

    /// Encrypts the difference of both plaintexts.
    ///
    /// # Panics
    /// If the ciphertexts use different moduli.
    pub fn subtract(&self, other: &Ciphertext) -> Ciphertext {
        self.add(&other.negate())
    }

    /// Encrypts the plaintext multiplied by `alpha`.
    ///
    /// `alpha` acts as an exponent and is not bound by the plaintext size
    /// limit of direct encryption.
    pub fn scalar_mul(&self, alpha: &BigUint) -> Ciphertext {
        Ciphertext {
            p: self.p.clone(),
            c1: self.c1.modpow(alpha, &self.p),
            c2: self.c2.modpow(alpha, &self.p),
        }
    }

    fn assert_same_modulus(&self, other: &Ciphertext) {
        assert_eq!(
            self.p, other.p,
            "ciphertexts must be encrypted under the same group"
        );
    }
}

impl Add for &Ciphertext {
    type Output = Ciphertext;

    fn add(self, rhs: Self) -> Self::Output {
        Ciphertext::add(self, rhs)
    }
}

impl Neg for &Ciphertext {
    type Output = Ciphertext;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Sub for &Ciphertext {
    type Output = Ciphertext;

    fn sub(self, rhs: Self) -> Self::Output {
        self.subtract(rhs)
    }
}

impl Mul<&BigUint> for &Ciphertext {
    type Output = Ciphertext;

    fn mul(self, rhs: &BigUint) -> Self::Output {
        self.scalar_mul(rhs)
    }
}
