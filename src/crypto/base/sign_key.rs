use crate::{
    error::{Error, Result},
    util::ser::{Binary, BinarySecret},
};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;

/// A signature derived from a signing keypair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignKeypairSignature {
    Ed25519(Binary<64>),
}

impl AsRef<[u8]> for SignKeypairSignature {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Ed25519(sig) => sig.as_ref(),
        }
    }
}

/// An asymmetric signing keypair.
#[derive(Debug, Clone)]
pub enum SignKeypair {
    /// Ed25519 signing keypair
    Ed25519 {
        public: Binary<32>,
        secret: Option<BinarySecret<32>>,
    },
}

impl SignKeypair {
    /// Create a new ed25519 keypair from a 32-byte seed
    pub fn new_ed25519_from_seed(seed: &[u8; 32]) -> Self {
        let secret = ed25519_consensus::SigningKey::from(*seed);
        let public = secret.verification_key();
        Self::Ed25519 {
            public: Binary::new(public.to_bytes()),
            secret: Some(BinarySecret::new(*seed)),
        }
    }

    /// Create a new random ed25519 keypair
    pub fn new_ed25519<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Self::new_ed25519_from_seed(&randbuf)
    }

    /// Sign a value with our secret key.
    pub fn sign(&self, data: &[u8]) -> Result<SignKeypairSignature> {
        match self {
            Self::Ed25519 { secret: ref sec_opt, .. } => {
                let sec = sec_opt.as_ref().ok_or(Error::CryptoBadKey)?;
                let seckey = ed25519_consensus::SigningKey::from(*sec.expose_secret());
                let sig_obj = seckey.sign(data);
                Ok(SignKeypairSignature::Ed25519(Binary::new(sig_obj.to_bytes())))
            }
        }
    }

    /// Verify a value with a detached signature.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        self.public().verify(signature, data)
    }

    /// Grab the public half of this keypair.
    pub fn public(&self) -> SignKeypairPublic {
        match self {
            Self::Ed25519 { public, .. } => SignKeypairPublic::Ed25519(public.clone()),
        }
    }
}

/// An asymmetric signing public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignKeypairPublic {
    /// Ed25519 public key
    Ed25519(Binary<32>),
}

impl SignKeypairPublic {
    /// Verify a value with a detached signature given the public key of the
    /// signer.
    pub fn verify(&self, signature: &SignKeypairSignature, data: &[u8]) -> Result<()> {
        match (self, signature) {
            (Self::Ed25519(ref pubkey_bytes), SignKeypairSignature::Ed25519(ref sig_bytes)) => {
                let pubkey = ed25519_consensus::VerificationKey::try_from(*pubkey_bytes.deref())
                    .map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                let sig = ed25519_consensus::Signature::from(*sig_bytes.deref());
                pubkey.verify(&sig, data).map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                Ok(())
            }
        }
    }
}

impl AsRef<[u8]> for SignKeypairPublic {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Ed25519(pubkey) => pubkey.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signkeypair_ed25519_sign_verify() {
        let mut rng = crate::util::test::rng();
        let keypair = SignKeypair::new_ed25519(&mut rng);
        let fake_keypair = SignKeypair::new_ed25519(&mut rng);

        let message = b"the king is dead. long live the king.";
        let sig = keypair.sign(message).unwrap();
        keypair.verify(&sig, message).unwrap();
        keypair.public().verify(&sig, message).unwrap();

        let res = fake_keypair.verify(&sig, message);
        assert_eq!(res, Err(Error::CryptoSignatureVerificationFailed));
        let res = keypair.verify(&sig, b"the king is alive");
        assert_eq!(res, Err(Error::CryptoSignatureVerificationFailed));
    }

    #[test]
    fn signkeypair_ed25519_from_seed_is_deterministic() {
        let keypair1 = SignKeypair::new_ed25519_from_seed(&[42u8; 32]);
        let keypair2 = SignKeypair::new_ed25519_from_seed(&[42u8; 32]);
        let keypair3 = SignKeypair::new_ed25519_from_seed(&[43u8; 32]);
        assert_eq!(keypair1.public(), keypair2.public());
        assert!(keypair1.public() != keypair3.public());
        let sig1 = keypair1.sign(b"hi").unwrap();
        let sig2 = keypair2.sign(b"hi").unwrap();
        assert_eq!(sig1, sig2);
    }
}
