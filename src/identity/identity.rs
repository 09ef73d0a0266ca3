//! Identities and the addresses that name them.

use crate::{
    crypto::base::{stretch_key, CryptoKeypair, CryptoKeypairPublic, SignKeypair, SignKeypairPublic, SignKeypairSignature},
    error::{Error, Result},
    util::{base64_decode, base64_encode, Binary},
};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use url::Url;

string_id! {
    /// The address of an identity. This is the base64 of the identity's signing
    /// public key, so anything signed by an identity can be checked against its
    /// address without any other lookups.
    Address
}

impl Address {
    /// Derive an address from a signing public key.
    pub fn from_public(public: &SignKeypairPublic) -> Self {
        Self(base64_encode(public))
    }

    /// Pull the signing public key back out of this address.
    pub fn verification_key(&self) -> Result<SignKeypairPublic> {
        let bytes = base64_decode(self.as_str()).map_err(|_| Error::AddressInvalid(self.0.clone()))?;
        let arr = Binary::try_from_slice(&bytes).map_err(|_| Error::AddressInvalid(self.0.clone()))?;
        Ok(SignKeypairPublic::Ed25519(arr))
    }

    /// Verify that `signature` over `data` was made by the owner of this
    /// address.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        self.verification_key()?.verify(signature, data)
    }
}

/// The public face of an identity: what other people need to send us messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    /// Our address
    address: Address,
    /// The public key others encrypt messages to us with
    #[serde(rename = "boxPublicKeyAsHex")]
    box_public_key: CryptoKeypairPublic,
    /// Where our messaging service lives, if we advertise one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_address: Option<Url>,
}

impl PublicIdentity {
    pub fn new(address: Address, box_public_key: CryptoKeypairPublic, service_address: Option<Url>) -> Self {
        Self {
            address,
            box_public_key,
            service_address,
        }
    }
}

/// An identity owned by this wallet. Holds a signing keypair and an
/// encryption keypair. Identities are never modified once created, only
/// replaced.
#[derive(Debug, Clone, getset::Getters)]
#[getset(get = "pub")]
pub struct Identity {
    /// Our address, derived from the signing keypair
    address: Address,
    /// Signs things (request for attestation, delegations, envelopes)
    sign_keypair: SignKeypair,
    /// Boxes things
    crypto_keypair: CryptoKeypair,
}

impl Identity {
    /// Build an identity from existing keypairs.
    pub fn from_keypairs(sign_keypair: SignKeypair, crypto_keypair: CryptoKeypair) -> Self {
        let address = Address::from_public(&sign_keypair.public());
        Self {
            address,
            sign_keypair,
            crypto_keypair,
        }
    }

    /// Generate a brand new identity.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_keypairs(SignKeypair::new_ed25519(rng), CryptoKeypair::new_curve25519xchacha20poly1305(rng))
    }

    /// Restore an identity from its recovery phrase. The same phrase always
    /// produces the same identity. Words are normalized by whitespace, so
    /// stray spaces and newlines don't matter.
    pub fn from_phrase(phrase: &str) -> Result<Self> {
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            Err(Error::CryptoBadSeed)?;
        }
        let mut sign_seed = [0u8; 32];
        let mut box_seed = [0u8; 32];
        stretch_key(normalized.as_bytes(), &mut sign_seed, Some(b"attest/identity/sign"), None)?;
        stretch_key(normalized.as_bytes(), &mut box_seed, Some(b"attest/identity/box"), None)?;
        Ok(Self::from_keypairs(
            SignKeypair::new_ed25519_from_seed(&sign_seed),
            CryptoKeypair::new_curve25519xchacha20poly1305_from_seed(&box_seed),
        ))
    }

    /// Our public identity.
    pub fn public_identity(&self) -> PublicIdentity {
        PublicIdentity::new(self.address.clone(), self.crypto_keypair.public(), None)
    }

    /// Sign some data with our signing key.
    pub fn sign(&self, data: &[u8]) -> Result<SignKeypairSignature> {
        self.sign_keypair.sign(data)
    }
}
