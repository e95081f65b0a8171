//! Non-interactive proof that a ciphertext encrypts 0 or 1.
//!
//! This is the disjunction of two Chaum-Pedersen proofs, made
//! non-interactive with the Fiat-Shamir transform. For `b ∈ {0, 1}` the
//! statement "`c` encrypts `b`" means `c - (1, g^b) = (g^r, y^r)` for some
//! `r`. The prover answers the true branch honestly and simulates the other
//! one; the verifier only learns that one of the two holds.
use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use super::{Ciphertext, ElGamalError, PublicKey, group::random_range};

const DOMAIN: &str = "yao2pc bit-encryption proof v1";

/// A proof `(u0, u1, t0, t1)` that a ciphertext encrypts a bit.
///
/// `t0`, `t1` are the challenge shares of the two branches (they sum to the
/// Fiat-Shamir challenge modulo `p`) and `u0`, `u1` are the responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitProof {
    /// Response of the "encrypts 0" branch.
    pub u0: BigUint,
    /// Response of the "encrypts 1" branch.
    pub u1: BigUint,
    /// Challenge share of the "encrypts 0" branch.
    pub t0: BigUint,
    /// Challenge share of the "encrypts 1" branch.
    pub t1: BigUint,
}

/// The random values consumed by a bit proof.
///
/// `s` is the commitment exponent of the true branch, `u` and `t` are the
/// response and challenge share chosen for the simulated branch.
#[derive(Clone, PartialEq, Eq)]
pub struct BitProofNonces {
    /// Commitment exponent of the true branch, in `[1, q)`.
    pub s: BigUint,
    /// Response of the simulated branch, in `[0, q)`.
    pub u: BigUint,
    /// Challenge share of the simulated branch, in `[0, p)`.
    pub t: BigUint,
}

impl fmt::Debug for BitProofNonces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitProofNonces").finish_non_exhaustive()
    }
}

impl PublicKey {
    /// Proves that `c = Enc(m, r)` encrypts a bit, given the opening `(m, r)`.
    ///
    /// Fails with [`ElGamalError::NotABit`] unless `m` is 0 or 1. The proof
    /// is only meaningful if `c` really is `encrypt_with(m, r)`.
    pub fn prove_bit<R: CryptoRng + Rng + ?Sized>(
        &self,
        c: &Ciphertext,
        m: u64,
        r: &BigUint,
        rng: &mut R,
    ) -> Result<BitProof, ElGamalError> {
        let p = &self.params.p;
        let q = &self.params.q;
        let nonces = BitProofNonces {
            u: random_range(rng, &BigUint::zero(), q),
            t: random_range(rng, &BigUint::zero(), p),
            s: random_range(rng, &BigUint::one(), q),
        };
        self.prove_bit_with(c, m, r, &nonces)
    }

    /// Proves that `c = Enc(m, r)` encrypts a bit with the given nonces.
    ///
    /// The result is a deterministic function of its arguments. Reusing
    /// nonces for two proofs leaks `r`, so they must be fresh and secret
    /// outside of tests. Out of range nonces are reduced.
    pub fn prove_bit_with(
        &self,
        c: &Ciphertext,
        m: u64,
        r: &BigUint,
        nonces: &BitProofNonces,
    ) -> Result<BitProof, ElGamalError> {
        let real = match m {
            0 => 0,
            1 => 1,
            _ => return Err(ElGamalError::NotABit(m)),
        };
        let p = &self.params.p;
        let q = &self.params.q;

        // simulated branch: pick response and challenge, derive the commitment
        let u_sim = &nonces.u % q;
        let t_sim = &nonces.t % p;
        let w_sim = self.branch_commitment(c, 1 - real, &u_sim, &t_sim);

        // real branch: commit honestly
        let s = &nonces.s % q;
        let w_real = self.encode(&BigUint::zero(), &s);

        let (w0, w1) = if real == 0 {
            (&w_real, &w_sim)
        } else {
            (&w_sim, &w_real)
        };
        let challenge = self.challenge(c, w0, w1);
        let t_real = (challenge + p - &t_sim) % p;
        let u_real = (s + r * &t_real) % q;

        Ok(if real == 0 {
            BitProof {
                u0: u_real,
                u1: u_sim,
                t0: t_real,
                t1: t_sim,
            }
        } else {
            BitProof {
                u0: u_sim,
                u1: u_real,
                t0: t_sim,
                t1: t_real,
            }
        })
    }

    /// Checks a proof that `c` encrypts 0 or 1 under this key.
    pub fn verify_bit(&self, c: &Ciphertext, proof: &BitProof) -> bool {
        let p = &self.params.p;
        let q = &self.params.q;
        let BitProof { u0, u1, t0, t1 } = proof;
        if c.modulus() != p || u0 >= q || u1 >= q || t0 >= p || t1 >= p {
            return false;
        }
        let w0 = self.branch_commitment(c, 0, u0, t0);
        let w1 = self.branch_commitment(c, 1, u1, t1);
        (t0 + t1) % p == self.challenge(c, &w0, &w1)
    }

    /// `Enc(0, u) - t * (c - (1, g^b))`, the commitment that makes branch
    /// `b` verify for response `u` and challenge `t`.
    fn branch_commitment(&self, c: &Ciphertext, b: u64, u: &BigUint, t: &BigUint) -> Ciphertext {
        let shifted = c.subtract(&self.encode(&BigUint::from(b), &BigUint::zero()));
        self.encode(&BigUint::zero(), u)
            .subtract(&shifted.scalar_mul(t))
    }

    /// Fiat-Shamir challenge `H(g, p, q, y, c, w0, w1) mod p`.
    fn challenge(&self, c: &Ciphertext, w0: &Ciphertext, w1: &Ciphertext) -> BigUint {
        let mut hasher = blake3::Hasher::new_derive_key(DOMAIN);
        let elements = [
            &self.params.g,
            &self.params.p,
            &self.params.q,
            &self.y,
            c.c1(),
            c.c2(),
            w0.c1(),
            w0.c2(),
            w1.c1(),
            w1.c2(),
        ];
        for element in elements {
            let bytes = element.to_bytes_be();
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        BigUint::from_bytes_be(hasher.finalize().as_bytes()) % &self.params.p
    }
}
