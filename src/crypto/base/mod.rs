//! The crypto base wraps the algorithms we use for asymmetric encryption,
//! signing, and hashing of data.
//!
//! Specific algorithms are wrapped in descriptive enums (`CryptoKeypair`,
//! `SignKeypair`, `Hash`) so new algorithms can be slotted in without building
//! new interfaces around them.

use crate::error::{Error, Result};
use rand::{rngs::OsRng, RngCore, SeedableRng};

mod crypto_key;
mod hash;
mod sign_key;

pub use crypto_key::*;
pub use hash::*;
pub use sign_key::*;

/// A convenience function that returns a ChaCha20 CSRNG seeded with OS random bytes. Use this if
/// you want a nice, strong random number generator, you don't want to wire one up yourself, and
/// your platform provides good entropy.
pub fn rng_chacha20() -> rand_chacha::ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    rand_chacha::ChaCha20Rng::from_seed(seed_bytes)
}

/// Given the bytes from a secret, derive some other key of N length in a secure manner.
pub fn stretch_key<const N: usize>(input: &[u8], output: &mut [u8; N], info: Option<&[u8]>, salt: Option<&[u8]>) -> Result<()> {
    let hkdf = hkdf::SimpleHkdf::<blake3::Hasher>::new(salt, input);
    hkdf.expand(info.unwrap_or(b"attest/hkdf"), output)
        .map_err(|_| Error::BadLength)?;
    Ok(())
}
