//! The identity module defines who is talking to whom, and what they're
//! talking about.
//!
//! An [Identity] is owned by the wallet and holds the keys used for signing and
//! encryption. A [Contact] is somebody else's public identity plus some
//! metadata. Claims, attestations, and delegations are the payloads that flow
//! between identities in messages.

pub mod attestation;
pub mod claim;
pub mod contact;
pub mod delegation;
#[allow(clippy::module_inception)]
pub mod identity;

pub use attestation::*;
pub use claim::*;
pub use contact::*;
pub use delegation::*;
pub use identity::*;
