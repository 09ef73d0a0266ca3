use crate::{error::Result, util::ser::Binary};
use serde::Serialize;

/// A cryptographic hash. By defining this as an enum, we allow expansion of
/// hash algorithms in the future.
///
/// Stringified, a hash is `0x` followed by the hex of the hash bytes, which is
/// how ctype hashes and claim root hashes travel on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Hash {
    /// Blake3 256bit hash
    Blake3(Binary<32>),
}

impl Hash {
    /// Create a new blake3 hash from a message
    pub fn new_blake3(message: &[u8]) -> Self {
        let hash = blake3::hash(message);
        Self::Blake3(Binary::new(*hash.as_bytes()))
    }

    /// Hash the canonical JSON form of a serializable value.
    pub fn of_json<T: Serialize>(value: &T) -> Result<Self> {
        // serde_json::Value keeps maps sorted, which gets us a stable byte form
        // regardless of field order in whatever produced `value`.
        let val = serde_json::to_value(value)?;
        let bytes = serde_json::to_vec(&val)?;
        Ok(Self::new_blake3(&bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Blake3(bin) => bin.as_ref(),
        }
    }

    /// `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }

    pub fn from_hex(hexstr: &str) -> Result<Self> {
        let bytes = hex::decode(hexstr.trim_start_matches("0x"))?;
        Ok(Self::Blake3(Binary::try_from_slice(&bytes)?))
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn hash_blake3() {
        let hash = Hash::new_blake3(b"GET A JOB");
        let hash2 = Hash::new_blake3(b"GET A JOB");
        let hash3 = Hash::new_blake3(b"get a job");
        assert_eq!(hash, hash2);
        assert!(hash != hash3);
        assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
        assert_eq!(Hash::from_hex("0xabcd").err(), Some(Error::BadLength));
    }

    #[test]
    fn hash_json_ignores_field_order() {
        let one: serde_json::Value = serde_json::from_str(r#"{"name":"jerry","age":42}"#).unwrap();
        let two: serde_json::Value = serde_json::from_str(r#"{"age":42,"name":"jerry"}"#).unwrap();
        assert_eq!(Hash::of_json(&one).unwrap(), Hash::of_json(&two).unwrap());
    }
}
