//! The symmetric primitive used to encrypt garbled table rows.
//!
//! Garbling only needs a deterministic "encrypt/decrypt whole blocks under a
//! 128-bit key" capability, so the cipher is a trait. [`Aes128Ecb`] is the
//! default instantiation, built on the [aes](`aes`) crate.
use aes::{
    Aes128,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use thiserror::Error;

use crate::label::Label;

/// Size of a cipher block in bytes.
pub const BLOCK_BYTES: usize = 16;

/// Errors raised by a [`BlockCipher`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The buffer is not a whole number of blocks.
    #[error("buffer of {0} bytes is not a multiple of the block size")]
    UnalignedLength(usize),
}

/// A deterministic block cipher keyed by a [`Label`].
///
/// Implementations must not keep any nonce or IV state between calls:
/// encrypting the same buffer under the same key always gives the same
/// result.
pub trait BlockCipher {
    /// Encrypts `buf` in place. `buf.len()` must be a multiple of
    /// [`BLOCK_BYTES`].
    fn encrypt(&self, key: &Label, buf: &mut [u8]) -> Result<(), CipherError>;

    /// Decrypts `buf` in place. `buf.len()` must be a multiple of
    /// [`BLOCK_BYTES`].
    fn decrypt(&self, key: &Label, buf: &mut [u8]) -> Result<(), CipherError>;
}

/// AES-128 in electronic-codebook mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes128Ecb;

impl Aes128Ecb {
    fn keyed(key: &Label, len: usize) -> Result<Aes128, CipherError> {
        if len % BLOCK_BYTES != 0 {
            return Err(CipherError::UnalignedLength(len));
        }
        Ok(Aes128::new(&GenericArray::from(key.to_bytes())))
    }
}

impl BlockCipher for Aes128Ecb {
    fn encrypt(&self, key: &Label, buf: &mut [u8]) -> Result<(), CipherError> {
        let aes = Self::keyed(key, buf.len())?;
        for block in buf.chunks_exact_mut(BLOCK_BYTES) {
            aes.encrypt_block(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }

    fn decrypt(&self, key: &Label, buf: &mut [u8]) -> Result<(), CipherError> {
        let aes = Self::keyed(key, buf.len())?;
        for block in buf.chunks_exact_mut(BLOCK_BYTES) {
            aes.decrypt_block(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }
}
