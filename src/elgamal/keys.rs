//! Key pairs, encryption and decryption.
use std::{fmt, sync::OnceLock};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
    Ciphertext, ElGamalError, GroupParams, MAX_PLAINTEXT_BITS, dlog::DlogTable,
    group::random_range,
};

/// An ElGamal public key `y = g^x mod p`.
///
/// Public keys are meant to be shared with the other party, which should
/// [validate](PublicKey::validate) them before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub(crate) params: GroupParams,
    pub(crate) y: BigUint,
}

/// An ElGamal secret key `x` in `[1, q)`.
///
/// Secret keys never leave the party that generated them and are therefore
/// not serializable.
#[derive(Clone)]
pub struct SecretKey {
    params: GroupParams,
    x: BigUint,
    dlog: OnceLock<DlogTable>,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    /// The group this key lives in.
    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    /// The public element `y`.
    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// Checks a public key received from another party: its group must be
    /// well formed and `y` must be an element of the order-`q` subgroup.
    pub fn validate(&self) -> Result<(), ElGamalError> {
        self.params.validate()?;
        if self.y <= BigUint::one() || self.y >= self.params.p {
            return Err(ElGamalError::InvalidPublicKey("y is out of range"));
        }
        if !self.params.in_subgroup(&self.y) {
            return Err(ElGamalError::InvalidPublicKey("y does not have order q"));
        }
        Ok(())
    }

    /// A uniformly random integer in `[1, p]`, used as encryption randomness
    /// and as blinding factor.
    pub fn random<R: CryptoRng + Rng + ?Sized>(&self, rng: &mut R) -> BigUint {
        random_range(rng, &BigUint::one(), &(&self.params.p + 1u32))
    }

    /// Encrypts `m` with fresh randomness.
    ///
    /// Fails if `m` has more than [`MAX_PLAINTEXT_BITS`] bits, because
    /// decryption could not recover it.
    pub fn encrypt<R: CryptoRng + Rng + ?Sized>(
        &self,
        m: u64,
        rng: &mut R,
    ) -> Result<Ciphertext, ElGamalError> {
        let r = self.random(rng);
        self.encrypt_with(m, &r)
    }

    /// Encrypts `m` with the given randomness `r`.
    ///
    /// Fails if `m` has more than [`MAX_PLAINTEXT_BITS`] bits.
    pub fn encrypt_with(&self, m: u64, r: &BigUint) -> Result<Ciphertext, ElGamalError> {
        if u64::BITS - m.leading_zeros() > MAX_PLAINTEXT_BITS {
            return Err(ElGamalError::PlaintextTooLarge(m));
        }
        Ok(self.encode(&BigUint::from(m), r))
    }

    /// `(g^r, g^m * y^r)` without any bound on `m`.
    pub(crate) fn encode(&self, m: &BigUint, r: &BigUint) -> Ciphertext {
        let GroupParams { g, p, .. } = &self.params;
        let c1 = g.modpow(r, p);
        let c2 = g.modpow(m, p) * self.y.modpow(r, p) % p;
        Ciphertext::from_parts(p.clone(), c1, c2)
    }
}

impl SecretKey {
    /// Picks a fresh secret key for `params` and derives its public key.
    pub fn generate<R: CryptoRng + Rng + ?Sized>(
        params: GroupParams,
        rng: &mut R,
    ) -> (PublicKey, SecretKey) {
        let x = random_range(rng, &BigUint::one(), &params.q);
        let y = params.g.modpow(&x, &params.p);
        let pk = PublicKey {
            params: params.clone(),
            y,
        };
        let sk = SecretKey {
            params,
            x,
            dlog: OnceLock::new(),
        };
        (pk, sk)
    }

    /// The group this key lives in.
    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    /// Decrypts `c`.
    ///
    /// Returns `None` if the plaintext is not in `[0, DLOG_BOUND)`, which
    /// is an expected outcome for differences of ciphertexts and for
    /// blinded values, or if `c` belongs to a different group.
    pub fn decrypt(&self, c: &Ciphertext) -> Option<u64> {
        let p = &self.params.p;
        if c.modulus() != p {
            trace!("ciphertext modulus does not match the secret key");
            return None;
        }
        let shared = c.c1().modpow(&self.x, p);
        if shared.is_zero() {
            return None;
        }
        let g_m = c.c2() * self.params.invert(&shared) % p;
        self.dlog
            .get_or_init(|| DlogTable::new(&self.params))
            .find(&g_m)
    }
}
