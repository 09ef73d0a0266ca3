use crate::{
    error::{Error, Result},
    util::ser::{Binary, BinarySecret},
};
use crypto_box::aead::{self, generic_array::GenericArray, Aead};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;

/// An asymmetric crypto keypair nonce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CryptoKeypairNonce {
    /// Nonce for Curve25519XChaCha20Poly1305
    Curve25519XChaCha20Poly1305(Binary<24>),
}

impl CryptoKeypairNonce {
    fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = [0u8; 24];
        rng.fill_bytes(&mut randbuf);
        Self::Curve25519XChaCha20Poly1305(Binary::new(randbuf))
    }
}

impl AsRef<[u8]> for CryptoKeypairNonce {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Curve25519XChaCha20Poly1305(nonce) => nonce.as_ref(),
        }
    }
}

/// A message we encrypt with their pubkey and our seckey. Meant for
/// non-anonymous, authenticated messaging.
#[derive(Debug, Clone, getset::Getters)]
#[getset(get = "pub")]
pub struct CryptoKeypairMessage {
    /// Our heroic nonce
    nonce: CryptoKeypairNonce,
    /// The message ciphertext
    ciphertext: Vec<u8>,
}

impl CryptoKeypairMessage {
    /// Create a new message
    pub fn new(nonce: CryptoKeypairNonce, ciphertext: Vec<u8>) -> Self {
        Self { nonce, ciphertext }
    }
}

/// An asymmetric encryption keypair.
#[derive(Debug, Clone)]
pub enum CryptoKeypair {
    /// Curve25519XChaCha20Poly1305 keypair for encryption/decryption
    Curve25519XChaCha20Poly1305 {
        public: Binary<32>,
        secret: Option<BinarySecret<32>>,
    },
}

impl CryptoKeypair {
    /// Create a new keypair from a 32-byte seed.
    pub fn new_curve25519xchacha20poly1305_from_seed(seed: &[u8; 32]) -> Self {
        let secret = crypto_box::SecretKey::from(*seed);
        let public = secret.public_key();
        Self::Curve25519XChaCha20Poly1305 {
            public: Binary::new(*public.as_bytes()),
            secret: Some(BinarySecret::new(*seed)),
        }
    }

    /// Create a new random keypair.
    pub fn new_curve25519xchacha20poly1305<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Self::new_curve25519xchacha20poly1305_from_seed(&randbuf)
    }

    /// Encrypt a message to a recipient (that's us, `self`) using the sender's
    /// secret key. A fresh nonce is pulled from `rng` on every call.
    pub fn seal<R: RngCore + CryptoRng>(&self, rng: &mut R, sender_keypair: &CryptoKeypair, data: &[u8]) -> Result<CryptoKeypairMessage> {
        match (sender_keypair, self) {
            (
                Self::Curve25519XChaCha20Poly1305 { secret: ref sender_seckey_opt, .. },
                Self::Curve25519XChaCha20Poly1305 { public: ref recipient_pubkey, .. },
            ) => {
                let sender_seckey = sender_seckey_opt.as_ref().ok_or(Error::CryptoBadKey)?;
                let sender_seckey = crypto_box::SecretKey::from(*sender_seckey.expose_secret());
                let recipient_pubkey = crypto_box::PublicKey::from(*recipient_pubkey.deref());
                let cardboard_box = crypto_box::ChaChaBox::new(&recipient_pubkey, &sender_seckey);
                let nonce = CryptoKeypairNonce::generate(rng);
                let msg = cardboard_box
                    .encrypt(GenericArray::from_slice(nonce.as_ref()), aead::Payload::from(data))
                    .map_err(|_| Error::CryptoSealFailed)?;
                Ok(CryptoKeypairMessage::new(nonce, msg))
            }
        }
    }

    /// Open a message encrypted with our public key and verify the sender of
    /// the message using their public key.
    pub fn open(&self, sender_pubkey: &CryptoKeypairPublic, message: &CryptoKeypairMessage) -> Result<Vec<u8>> {
        match (self, sender_pubkey) {
            (
                Self::Curve25519XChaCha20Poly1305 { secret: ref recipient_seckey_opt, .. },
                CryptoKeypairPublic::Curve25519XChaCha20Poly1305(ref sender_pubkey),
            ) => {
                let recipient_seckey = recipient_seckey_opt.as_ref().ok_or(Error::CryptoBadKey)?;
                let recipient_seckey = crypto_box::SecretKey::from(*recipient_seckey.expose_secret());
                let nonce = match message.nonce() {
                    CryptoKeypairNonce::Curve25519XChaCha20Poly1305(nonce) => GenericArray::from_slice(nonce.as_ref()),
                };
                let sender_pubkey = crypto_box::PublicKey::from(*sender_pubkey.deref());
                let cardboard_box = crypto_box::ChaChaBox::new(&sender_pubkey, &recipient_seckey);
                cardboard_box
                    .decrypt(nonce, aead::Payload::from(message.ciphertext().as_slice()))
                    .map_err(|_| Error::CryptoOpenFailed)
            }
        }
    }

    /// Grab the public half of this keypair.
    pub fn public(&self) -> CryptoKeypairPublic {
        match self {
            Self::Curve25519XChaCha20Poly1305 { public, .. } => CryptoKeypairPublic::Curve25519XChaCha20Poly1305(public.clone()),
        }
    }

    pub fn has_private(&self) -> bool {
        match self {
            Self::Curve25519XChaCha20Poly1305 { secret, .. } => secret.is_some(),
        }
    }
}

/// An asymmetric encryption public key.
///
/// On the wire this is the `0x`-prefixed hex of the key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CryptoKeypairPublic {
    /// Public key for Curve25519XChaCha20Poly1305
    Curve25519XChaCha20Poly1305(Binary<32>),
}

impl CryptoKeypairPublic {
    /// Hex representation (`0x...`) of this key.
    pub fn as_hex(&self) -> String {
        match self {
            Self::Curve25519XChaCha20Poly1305(pubkey) => format!("0x{}", hex::encode(pubkey.as_ref())),
        }
    }

    /// Parse a `0x`-prefixed (or bare) hex string.
    pub fn from_hex(hexstr: &str) -> Result<Self> {
        let bytes = hex::decode(hexstr.trim_start_matches("0x"))?;
        Ok(Self::Curve25519XChaCha20Poly1305(Binary::try_from_slice(&bytes)?))
    }
}

impl From<CryptoKeypair> for CryptoKeypairPublic {
    fn from(kp: CryptoKeypair) -> Self {
        kp.public()
    }
}

impl From<CryptoKeypairPublic> for CryptoKeypair {
    /// A keypair with only the public half filled in. Good for sealing a
    /// message *to* someone, useless for opening one.
    fn from(public: CryptoKeypairPublic) -> Self {
        match public {
            CryptoKeypairPublic::Curve25519XChaCha20Poly1305(public) => Self::Curve25519XChaCha20Poly1305 { public, secret: None },
        }
    }
}

impl serde::Serialize for CryptoKeypairPublic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> serde::Deserialize<'de> for CryptoKeypairPublic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn cryptokeypair_curve25519xchacha20poly1305_enc_dec() {
        let mut rng = crate::util::test::rng();
        let sender_keypair = CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng);
        let recipient_keypair = CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng);
        let fake_keypair = CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng);

        let message = String::from("HI JERRY I'M BUTCH");
        let sealed = recipient_keypair.seal(&mut rng, &sender_keypair, message.as_bytes()).unwrap();
        let opened = recipient_keypair.open(&sender_keypair.public(), &sealed).unwrap();

        assert_eq!(&opened[..], message.as_bytes());

        let opened2 = recipient_keypair.open(&fake_keypair.public(), &sealed);
        assert_eq!(opened2, Err(Error::CryptoOpenFailed));

        let sealed2 = recipient_keypair.seal(&mut rng, &sender_keypair, message.as_bytes()).unwrap();
        assert!(sealed.nonce() != sealed2.nonce());
    }

    #[test]
    fn cryptokeypair_public_only_cannot_seal() {
        let mut rng = crate::util::test::rng();
        let recipient_keypair = CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng);
        let sender_public = CryptoKeypair::from(CryptoKeypair::new_curve25519xchacha20poly1305(&mut rng).public());
        assert!(!sender_public.has_private());
        let res = recipient_keypair.seal(&mut rng, &sender_public, b"get a job");
        assert_eq!(res.err(), Some(Error::CryptoBadKey));
    }

    #[test]
    fn cryptokeypair_public_hex() {
        let keypair = CryptoKeypair::new_curve25519xchacha20poly1305_from_seed(&[7u8; 32]);
        let public = keypair.public();
        let hexed = public.as_hex();
        assert!(hexed.starts_with("0x"));
        assert_eq!(hexed.len(), 66);
        assert_eq!(CryptoKeypairPublic::from_hex(&hexed).unwrap(), public);
        assert_eq!(CryptoKeypairPublic::from_hex(&hexed[2..]).unwrap(), public);
        assert_eq!(CryptoKeypairPublic::from_hex("0x1234").err(), Some(Error::BadLength));
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, format!("\"{}\"", hexed));
    }
}
