//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while sending, receiving, and working through the
//! attestation protocol.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// An address could not be decoded into a verification key.
    #[error("address is invalid: {0}")]
    AddressInvalid(String),

    /// A request for attestation failed verification (root hash or claimer
    /// signature mismatch).
    #[error("attestation request is invalid: {0}")]
    AttestationInvalid(&'static str),

    /// Data of the wrong length was given to a crypto function.
    #[error("bad length")]
    BadLength,

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// We tried to look up a contact that doesn't exist in the registry.
    #[error("contact not found: {0}")]
    ContactNotFound(String),

    /// Bad key.
    #[error("key is invalid")]
    CryptoBadKey,

    /// Bad seed (or recovery phrase) given for a keypair.
    #[error("incorrect seed given for keypair")]
    CryptoBadSeed,

    /// Failed to open a boxed message. Wrong key, bad nonce, or someone has been
    /// fiddling with the ciphertext.
    #[error("failed to open a sealed object")]
    CryptoOpenFailed,

    /// Failed to box up a message.
    #[error("failed to seal an object")]
    CryptoSealFailed,

    /// A signature failed to verify.
    #[error("the given signature/public key/data combo does not verify")]
    CryptoSignatureVerificationFailed,

    /// An error while decoding base64.
    #[error("deserialization error")]
    DeserializeBase64(#[from] base64::DecodeError),

    /// An error while decoding hex.
    #[error("deserialization error")]
    DeserializeHex(#[from] hex::FromHexError),

    /// A low-level HTTP failure (connection refused, bad response body, etc).
    #[error("http error: {0}")]
    Http(String),

    /// The decrypted message body is not a known, well-formed message.
    #[error("could not parse message body: {0}")]
    MessageParse(String),

    /// The message claims to be from someone other than who actually sent it.
    #[error("message sender does not match the owner of its contents")]
    MessageSpoofedSender,

    /// The unregistered sender of a message didn't include their box public key
    /// so we have no way to open it.
    #[error("sender box public key missing")]
    MessageSenderKeyMissing,

    /// An error while serializing/deserializing JSON.
    #[error("json serialization error")]
    SerializeJson(#[from] serde_json::Error),

    /// An error while engaging in yaml serialization.
    #[error("yaml serialization error")]
    SerializeYaml(#[from] serde_yaml::Error),

    /// The messaging service answered with a non-success status.
    #[error("transport failure: {status} {reason}")]
    Transport {
        /// HTTP status returned by the endpoint
        status: u16,
        /// Status text (or body) returned by the endpoint
        reason: String,
    },

    /// The messaging service refused an operation needing proof of
    /// authorship, or we had no signature to give it.
    #[error("not authorized")]
    Unauthorized,

    /// A task was asked to send before it had everything it needs.
    #[error("workflow precondition failed: {0}")]
    WorkflowPrecondition(&'static str),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // serde_json::Error et al are not eq-able, so compare the debug form.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::Transport {
                status: status.as_u16(),
                reason: err.to_string(),
            },
            None => Error::Http(err.to_string()),
        }
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
