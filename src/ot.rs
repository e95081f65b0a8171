//! 1-out-of-2 oblivious transfer of [`Label`]s built on the homomorphism of
//! [exponential ElGamal](crate::elgamal).
//!
//! 1. The [`Receiver`] encrypts its choice bit `b` under a fresh key pair
//!    and sends the ciphertext `c`, its public key and a proof that `c`
//!    encrypts a bit ([`Challenge`]).
//! 2. The [`Sender`] holding `(m0, m1)` answers with ([`Response`])
//!
//!    ```text
//!    e0 = (Enc(1) - c) * m0 + r0 * c
//!    e1 = c * m1 + r1 * (Enc(1) - c)
//!    ```
//!
//!    for fresh random `r0`, `r1`. If `b = 0`, `e0` encrypts `m0` and `e1`
//!    encrypts the blinding value `r1`; if `b = 1`, `e0` encrypts `r0` and
//!    `e1` encrypts `m1`.
//! 3. The receiver decrypts `e_b` only.
//!
//! The transferred label is recovered by the bounded decryption search, so
//! labels must have at most [`MAX_PLAINTEXT_BITS`] significant bits, see
//! [`Label::random_for_ot`].
use std::fmt;

use num_bigint::BigUint;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::{
    elgamal::{
        self, BitProof, Ciphertext, ElGamalError, MAX_PLAINTEXT_BITS, PublicKey, SecretKey,
    },
    label::Label,
};

/// Errors of the oblivious transfer protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OtError {
    /// Encrypting a protocol value failed.
    #[error("encryption failed: {0}")]
    Encryption(#[from] ElGamalError),
    /// The receiver's public key is malformed.
    #[error("the receiver's public key is invalid: {0}")]
    InvalidPublicKey(ElGamalError),
    /// A ciphertext is not in the group of the receiver's public key.
    #[error("ciphertext does not belong to the receiver's group")]
    GroupMismatch,
    /// The receiver could not prove that its challenge encrypts a bit.
    #[error("the challenge proof does not verify")]
    InvalidChallengeProof,
    /// A sender label has more significant bits than can be transferred.
    #[error("a label has {bits} significant bits, more than {MAX_PLAINTEXT_BITS}")]
    LabelTooWide {
        /// Number of significant bits of the offending label.
        bits: u32,
    },
    /// The selected response did not decrypt to a transferable label.
    #[error("the selected response does not decrypt to a label")]
    NotRecoverable,
}

/// First message, from the receiver to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Key under which the choice bit is encrypted.
    pub public_key: PublicKey,
    /// Encryption of the choice bit.
    pub ciphertext: Ciphertext,
    /// Proof that `ciphertext` encrypts 0 or 1.
    pub proof: BitProof,
}

/// Second message, from the sender to the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Encrypts `m0` if the choice bit is 0, a blinding value otherwise.
    pub e0: Ciphertext,
    /// Encrypts `m1` if the choice bit is 1, a blinding value otherwise.
    pub e1: Ciphertext,
}

/// Oblivious transfer sender.
#[derive(Clone)]
pub struct Sender {
    pub(crate) m0: Label,
    pub(crate) m1: Label,
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

impl Sender {
    /// Creates a sender offering `m0` and `m1`.
    pub fn new(m0: Label, m1: Label) -> Self {
        Self { m0, m1 }
    }

    /// Answers a receiver's challenge.
    ///
    /// The challenge is rejected if the receiver's key is malformed or its
    /// proof does not verify.
    pub fn respond<R: CryptoRng + Rng + ?Sized>(
        &self,
        challenge: &Challenge,
        rng: &mut R,
    ) -> Result<Response, OtError> {
        for m in [self.m0, self.m1] {
            let bits = Label::BITS as u32 - m.leading_zeros();
            if bits > MAX_PLAINTEXT_BITS {
                return Err(OtError::LabelTooWide { bits });
            }
        }
        let Challenge {
            public_key: pk,
            ciphertext: c,
            proof,
        } = challenge;
        pk.validate().map_err(OtError::InvalidPublicKey)?;
        if c.modulus() != pk.params().p() {
            return Err(OtError::GroupMismatch);
        }
        if !pk.verify_bit(c, proof) {
            return Err(OtError::InvalidChallengeProof);
        }

        let not_c = pk.encrypt(1, rng)?.subtract(c);
        let r0 = pk.random(rng);
        let r1 = pk.random(rng);
        let m0 = BigUint::from(self.m0.as_u128());
        let m1 = BigUint::from(self.m1.as_u128());

        let e0 = not_c.scalar_mul(&m0).add(&c.scalar_mul(&r0));
        let e1 = c.scalar_mul(&m1).add(&not_c.scalar_mul(&r1));
        trace!("answered OT challenge");
        Ok(Response { e0, e1 })
    }
}

/// Oblivious transfer receiver.
#[derive(Clone)]
pub struct Receiver {
    choice: bool,
    pk: PublicKey,
    sk: SecretKey,
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("pk", &self.pk)
            .finish_non_exhaustive()
    }
}

impl Receiver {
    /// Creates a receiver for `choice` with a freshly generated key pair.
    pub fn new<R: CryptoRng + Rng + ?Sized>(choice: bool, rng: &mut R) -> Self {
        let (pk, sk) = elgamal::keygen(rng);
        Self::with_keys(choice, pk, sk)
    }

    /// Creates a receiver for `choice` using an existing key pair.
    pub fn with_keys(choice: bool, pk: PublicKey, sk: SecretKey) -> Self {
        Self { choice, pk, sk }
    }

    /// The bit selecting which label is received.
    pub fn choice(&self) -> bool {
        self.choice
    }

    /// Encrypts the choice bit and proves that it is a bit.
    pub fn challenge<R: CryptoRng + Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Challenge, OtError> {
        let b = u64::from(self.choice);
        let r = self.pk.random(rng);
        let ciphertext = self.pk.encrypt_with(b, &r)?;
        let proof = self.pk.prove_bit(&ciphertext, b, &r, rng)?;
        Ok(Challenge {
            public_key: self.pk.clone(),
            ciphertext,
            proof,
        })
    }

    /// Recovers the chosen label from the sender's response.
    ///
    /// Only the ciphertext selected by the choice bit is decrypted.
    pub fn receive(&self, response: &Response) -> Result<Label, OtError> {
        let selected = if self.choice {
            &response.e1
        } else {
            &response.e0
        };
        if selected.modulus() != self.pk.params().p() {
            return Err(OtError::GroupMismatch);
        }
        self.sk
            .decrypt(selected)
            .map(|m| Label::from_u128(u128::from(m)))
            .ok_or(OtError::NotRecoverable)
    }
}
