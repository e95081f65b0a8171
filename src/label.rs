//! A 128-bit [`Label`] type.
//!
//! Labels double as AES-128 keys and as the random values standing in for a
//! boolean on a garbled wire. All sequence representations (bytes, hex, bit
//! strings, bit vectors) are in MSB-first order, so that the integer value of
//! a label is the big-endian interpretation of its bytes.
use std::{
    fmt,
    ops::{BitXor, BitXorAssign},
    str::FromStr,
};

use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::elgamal::MAX_PLAINTEXT_BITS;

/// Number of leading zero bits of the labels that are moved by oblivious
/// transfer.
///
/// OT moves a label as a homomorphic plaintext, which the receiver recovers
/// by a bounded discrete-log search. The label entropy is therefore tied to
/// [`MAX_PLAINTEXT_BITS`].
pub const OT_LABEL_LEADING_ZEROS: u32 = Label::BITS as u32 - MAX_PLAINTEXT_BITS;

/// A 128-bit label, usable as an AES-128 key.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub(crate) u128);

/// Errors raised when parsing a [`Label`] from one of its representations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    /// The input has the wrong number of bytes, digits or bits.
    #[error("expected {expected} elements, found {actual}")]
    WrongLength {
        /// Number of elements a label representation has.
        expected: usize,
        /// Number of elements provided.
        actual: usize,
    },
    /// The input contains a character that is not a digit of the expected radix.
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),
    /// The number does not fit into 128 bits.
    #[error("value does not fit into 128 bits")]
    Overflow,
}

impl Label {
    /// All bits set to 0.
    pub const ZERO: Self = Self(0);
    /// 16 bytes in a label.
    pub const BYTES: usize = 16;
    /// 128 bits in a label.
    pub const BITS: usize = 128;

    /// Samples a label with all 128 bits uniformly random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.random()
    }

    /// Samples a label whose `zeros` most significant bits are 0 and whose
    /// remaining bits are uniformly random.
    ///
    /// `zeros >= 128` yields [`Label::ZERO`].
    pub fn random_with_leading_zeros<R: Rng + ?Sized>(rng: &mut R, zeros: u32) -> Self {
        match u128::MAX.checked_shr(zeros) {
            Some(mask) => Self(rng.random::<u128>() & mask),
            None => Self::ZERO,
        }
    }

    /// Samples a label that can be moved by oblivious transfer, see
    /// [`OT_LABEL_LEADING_ZEROS`].
    pub fn random_for_ot<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::random_with_leading_zeros(rng, OT_LABEL_LEADING_ZEROS)
    }

    /// Creates a label from its integer value.
    #[inline]
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Integer value of the label.
    #[inline]
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Creates a label from its big-endian bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Big-endian bytes of the label.
    #[inline]
    pub const fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Lowercase hexadecimal representation (32 digits).
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }

    /// Parses the 32 digit hexadecimal representation (either case).
    pub fn from_hex(hex: &str) -> Result<Self, LabelError> {
        parse_radix(hex, 16, 32)
    }

    /// Binary string representation (128 `'0'`/`'1'` characters).
    pub fn to_bin_string(&self) -> String {
        format!("{:0128b}", self.0)
    }

    /// Parses the 128 character binary string representation.
    pub fn from_bin_str(bin: &str) -> Result<Self, LabelError> {
        parse_radix(bin, 2, Self::BITS)
    }

    /// Bits of the label, most significant bit first.
    pub fn to_bits(&self) -> [bool; 128] {
        std::array::from_fn(|i| (self.0 >> (Self::BITS - 1 - i)) & 1 == 1)
    }

    /// Creates a label from its bits, most significant bit first.
    pub fn from_bits(bits: &[bool]) -> Result<Self, LabelError> {
        if bits.len() != Self::BITS {
            return Err(LabelError::WrongLength {
                expected: Self::BITS,
                actual: bits.len(),
            });
        }
        Ok(Self(
            bits.iter().fold(0, |acc, bit| (acc << 1) | u128::from(*bit)),
        ))
    }

    /// Number of leading zero bits.
    #[inline]
    pub const fn leading_zeros(&self) -> u32 {
        self.0.leading_zeros()
    }
}

fn parse_radix(s: &str, radix: u32, digits: usize) -> Result<Label, LabelError> {
    let len = s.chars().count();
    if len != digits {
        return Err(LabelError::WrongLength {
            expected: digits,
            actual: len,
        });
    }
    // from_str_radix would also accept a leading '+'
    if let Some(c) = s.chars().find(|c| !c.is_digit(radix)) {
        return Err(LabelError::InvalidDigit(c));
    }
    u128::from_str_radix(s, radix)
        .map(Label)
        .map_err(|_| LabelError::Overflow)
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Label {}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.to_hex())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Binary for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

impl BitXor for Label {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for Label {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Distribution<Label> for StandardUniform {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Label {
        let mut bytes = [0; 16];
        rng.fill_bytes(&mut bytes);
        Label::from_bytes(bytes)
    }
}

impl From<u128> for Label {
    #[inline]
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<Label> for u128 {
    #[inline]
    fn from(value: Label) -> Self {
        value.0
    }
}

impl From<[u8; 16]> for Label {
    #[inline]
    fn from(value: [u8; 16]) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Label> for [u8; 16] {
    #[inline]
    fn from(value: Label) -> Self {
        value.to_bytes()
    }
}

impl TryFrom<&[u8]> for Label {
    type Error = LabelError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 16] = value.try_into().map_err(|_| LabelError::WrongLength {
            expected: Self::BYTES,
            actual: value.len(),
        })?;
        Ok(Self::from_bytes(arr))
    }
}
