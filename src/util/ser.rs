//! Helpful serialization tools.
//!
//! Everything on the wire is JSON, so any binary data we carry around gets
//! base64'd (URL-safe, no padding) on its way out and decoded on its way in.

use crate::error::{Error, Result};
use base64::Engine;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;
use zeroize::Zeroize;

/// Convert bytes to base64
pub fn base64_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes.as_ref())
}

/// Convert base64 to bytes
pub fn base64_decode<T: AsRef<[u8]>>(bytes: T) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bytes.as_ref())?)
}

/// Serialize an object to JSON bytes.
pub(crate) fn serialize<T: Serialize>(obj: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(obj)?)
}

/// A fixed-length byte array that serializes as base64.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary<const N: usize>([u8; N]);

impl<const N: usize> Binary<N> {
    pub fn new(data: [u8; N]) -> Self {
        Self(data)
    }

    /// Build from a slice, failing if the length is off.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self> {
        let arr: [u8; N] = slice.try_into().map_err(|_| Error::BadLength)?;
        Ok(Self(arr))
    }
}

impl<const N: usize> Deref for Binary<N> {
    type Target = [u8; N];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> AsRef<[u8]> for Binary<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl<const N: usize> Serialize for Binary<N> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64_encode(self.0))
    }
}

impl<'de, const N: usize> Deserialize<'de> for Binary<N> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String>::deserialize(deserializer)?;
        let vec = base64_decode(s).map_err(de::Error::custom)?;
        Self::try_from_slice(&vec).map_err(|_| de::Error::custom(String::from("bad slice length")))
    }
}

/// A fixed-length chunk of secret bytes that wipes itself when dropped. Never
/// serialized.
#[derive(Clone)]
pub struct BinarySecret<const N: usize>([u8; N]);

impl<const N: usize> BinarySecret<N> {
    pub fn new(data: [u8; N]) -> Self {
        Self(data)
    }

    pub fn expose_secret(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> std::fmt::Debug for BinarySecret<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BinarySecret(<{} bytes>)", N)
    }
}

impl<const N: usize> Drop for BinarySecret<N> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Serialize a `Vec<u8>` as a base64 string.
pub(crate) mod human_bytes {
    use super::{base64_decode, base64_encode};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&base64_encode(bytes.as_slice()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String>::deserialize(deserializer)?;
        base64_decode(s).map_err(de::Error::custom)
    }
}
