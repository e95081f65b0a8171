//! Safe-prime group parameters.
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, ToPrimitive, Zero};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::ElGamalError;
use crate::utils::RngCompat;

/// Primes used for trial division before running Miller-Rabin.
const SMALL_PRIMES: [u32; 31] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127,
];

/// Number of Miller-Rabin bases, taken from the front of [`SMALL_PRIMES`].
///
/// The first twelve primes are a deterministic witness set for all
/// `n < 3.3 * 10^24`, which covers the default parameters.
const MILLER_RABIN_BASES: usize = 12;

/// Size of the safe-prime search.
///
/// The search draws `offset < 2^offset_bits` and takes
/// `q = nextPrime(2^base_bits + offset)`, retrying until `p = 2q + 1` is
/// prime as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupConfig {
    /// Bit position of the fixed high bit of `q`.
    pub base_bits: u64,
    /// Bit length of the random offset added to `2^base_bits`.
    pub offset_bits: u64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            base_bits: 64,
            offset_bits: 64,
        }
    }
}

/// The public parameters `(g, p, q)` of a group: `p = 2q + 1` with `p`, `q`
/// prime, and `g` a generator of the order-`q` subgroup of `(Z/pZ)*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParams {
    pub(crate) g: BigUint,
    pub(crate) p: BigUint,
    pub(crate) q: BigUint,
}

impl GroupParams {
    /// Searches for fresh parameters with the default [`GroupConfig`].
    pub fn generate<R: CryptoRng + Rng + ?Sized>(rng: &mut R) -> Self {
        Self::generate_with(&GroupConfig::default(), rng)
    }

    /// Searches for fresh parameters of the size given by `config`.
    ///
    /// The search retries with fresh randomness until it succeeds.
    pub fn generate_with<R: CryptoRng + Rng + ?Sized>(config: &GroupConfig, rng: &mut R) -> Self {
        let mut rng = RngCompat(rng);
        let base = BigUint::one() << config.base_bits;
        let offset_bound = (BigUint::one() << config.offset_bits) + 1u32;

        let mut attempts = 0_u64;
        let (p, q) = loop {
            attempts += 1;
            let offset = rng.gen_biguint_below(&offset_bound);
            let q = next_prime(&(&base + offset));
            let p = (&q << 1) + 1u32;
            if is_probable_prime(&p) {
                break (p, q);
            }
            trace!(attempts, "2q + 1 is composite, retrying");
        };
        debug!(attempts, bits = p.bits(), "found safe prime");

        let two = BigUint::from(2u32);
        let g = loop {
            let h = rng.gen_biguint_range(&BigUint::one(), &p);
            let g = h.modpow(&two, &p);
            // squaring h = +-1 gives the trivial element
            if !g.is_one() && g.modpow(&q, &p).is_one() {
                break g;
            }
        };
        Self { g, p, q }
    }

    /// Assembles parameters from their parts without checking them, see
    /// [`GroupParams::validate`].
    pub fn from_parts(g: BigUint, p: BigUint, q: BigUint) -> Self {
        Self { g, p, q }
    }

    /// The generator `g` of the order-`q` subgroup.
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// The safe prime modulus `p`.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// The prime subgroup order `q = (p - 1) / 2`.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Checks parameters received from another party.
    pub fn validate(&self) -> Result<(), ElGamalError> {
        if self.p != (&self.q << 1) + 1u32 {
            return Err(ElGamalError::InvalidGroup("p != 2q + 1"));
        }
        if !is_probable_prime(&self.q) || !is_probable_prime(&self.p) {
            return Err(ElGamalError::InvalidGroup("p or q is not prime"));
        }
        if self.g <= BigUint::one() || self.g >= self.p {
            return Err(ElGamalError::InvalidGroup("g is out of range"));
        }
        if !self.in_subgroup(&self.g) {
            return Err(ElGamalError::InvalidGroup("g does not have order q"));
        }
        Ok(())
    }

    pub(crate) fn in_subgroup(&self, x: &BigUint) -> bool {
        x.modpow(&self.q, &self.p).is_one()
    }

    /// Inverse of a non-zero element, `x^(p-2) mod p`. Maps 0 to 0.
    pub(crate) fn invert(&self, x: &BigUint) -> BigUint {
        invert_mod_prime(x, &self.p)
    }
}

/// Uniform element of `[low, high)`.
pub(crate) fn random_range<R: CryptoRng + Rng + ?Sized>(
    rng: &mut R,
    low: &BigUint,
    high: &BigUint,
) -> BigUint {
    RngCompat(&mut *rng).gen_biguint_range(low, high)
}

/// Inverse modulo the prime `p` by Fermat's little theorem.
///
/// Callers guarantee `p >= 3`, see [`Ciphertext::new`](super::Ciphertext::new)
/// and [`GroupParams::validate`].
pub(crate) fn invert_mod_prime(x: &BigUint, p: &BigUint) -> BigUint {
    debug_assert!(*p >= BigUint::from(3u32));
    x.modpow(&(p - 2u32), p)
}

/// Miller-Rabin test with the bases in [`MILLER_RABIN_BASES`].
pub(crate) fn is_probable_prime(n: &BigUint) -> bool {
    if n.bits() <= 7 {
        return n
            .to_u32()
            .is_some_and(|small| SMALL_PRIMES.contains(&small));
    }
    if SMALL_PRIMES.iter().any(|&sp| (n % sp).is_zero()) {
        return false;
    }

    let n_minus_one = n - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for &a in &SMALL_PRIMES[..MILLER_RABIN_BASES] {
        let mut x = BigUint::from(a).modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = &x * &x % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// The smallest prime strictly greater than `n`.
pub(crate) fn next_prime(n: &BigUint) -> BigUint {
    let mut candidate = n + 1u32;
    if candidate <= BigUint::from(2u32) {
        return BigUint::from(2u32);
    }
    if !candidate.bit(0) {
        candidate += 1u32;
    }
    while !is_probable_prime(&candidate) {
        candidate += 2u32;
    }
    candidate
}
