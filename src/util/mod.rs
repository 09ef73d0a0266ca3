//! Utilities. OBVIOUSLY.

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

pub(crate) mod ser;

pub use ser::{base64_decode, base64_encode, Binary};

/// Creates a string-backed identifier type. These show up all over the wire
/// format (message ids, ctype hashes, delegation ids) and we want them to be
/// distinct types even though they're all strings underneath.
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde_derive::Serialize, serde_derive::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Grab the string value of this id.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(val: String) -> Self {
                Self(val)
            }
        }

        impl From<&str> for $name {
            fn from(val: &str) -> Self {
                Self(String::from(val))
            }
        }
    }
}

/// A library-local representation of a time. Serializes as RFC3339 on the
/// wire, and derefs to the underlying [DateTime<Utc>](chrono::DateTime) if you
/// need to do real date things with it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a new Timestamp from the current date/time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The RFC3339 form of this timestamp, which is what we sign.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        Self(date)
    }
}

impl FromStr for Timestamp {
    type Err = chrono::format::ParseError;
    fn from_str(s: &str) -> std::result::Result<Timestamp, Self::Err> {
        let datetime: DateTime<Utc> = s.parse()?;
        Ok(Timestamp(datetime))
    }
}
