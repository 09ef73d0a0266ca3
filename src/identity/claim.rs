//! A claim is a set of attributes asserted about its owner, shaped according
//! to a CTYPE (a claim-type schema, referenced by its hash).
//!
//! A claim by itself doesn't mean much. The claimer wraps it into a
//! [RequestForAttestation], signs it, and ships it to an attester who may
//! [attest](crate::identity::attestation) it.

use crate::{
    crypto::base::{Hash, SignKeypairSignature},
    error::{Error, Result},
    identity::{attestation::AttestedClaim, delegation::DelegationId, identity::{Address, Identity}},
};
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

string_id! {
    /// The hash identifying a CTYPE.
    CTypeHash
}

/// The attribute values of a claim.
pub type ClaimContents = Map<String, Value>;

/// A claim that may be missing its contents or owner. Used while negotiating
/// terms, before the claimer has filled everything in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct PartialClaim {
    c_type_hash: CTypeHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contents: Option<ClaimContents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<Address>,
}

impl PartialClaim {
    pub fn new(c_type_hash: CTypeHash, contents: Option<ClaimContents>, owner: Option<Address>) -> Self {
        Self {
            c_type_hash,
            contents,
            owner,
        }
    }

    /// Fill in the blanks and turn this into a full claim owned by `owner`.
    pub fn complete(&self, owner: Address) -> Claim {
        Claim::new(self.c_type_hash.clone(), self.contents.clone().unwrap_or_default(), owner)
    }
}

/// A full claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    c_type_hash: CTypeHash,
    contents: ClaimContents,
    owner: Address,
}

impl Claim {
    pub fn new(c_type_hash: CTypeHash, contents: ClaimContents, owner: Address) -> Self {
        Self {
            c_type_hash,
            contents,
            owner,
        }
    }
}

impl From<Claim> for PartialClaim {
    fn from(claim: Claim) -> Self {
        Self::new(claim.c_type_hash, Some(claim.contents), Some(claim.owner))
    }
}

/// The parts of a request for attestation that the root hash covers. Never
/// stored, only hashed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RootHashContainer<'a> {
    claim: &'a Claim,
    legitimations: &'a [AttestedClaim],
    delegation_id: &'a Option<DelegationId>,
}

impl<'a> RootHashContainer<'a> {
    fn hash(&self) -> Result<Hash> {
        Hash::of_json(self)
    }
}

/// A claim bundled with its supporting legitimations, signed by the claimer.
/// This is what gets sent to an attester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct RequestForAttestation {
    claim: Claim,
    legitimations: Vec<AttestedClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delegation_id: Option<DelegationId>,
    /// `0x`-hex hash over the claim, legitimations, and delegation id
    root_hash: String,
    /// The claimer's signature of the root hash
    claimer_signature: SignKeypairSignature,
}

impl RequestForAttestation {
    /// Build and sign a request. The claim must be owned by `claimer`.
    pub fn new(claimer: &Identity, claim: Claim, legitimations: Vec<AttestedClaim>, delegation_id: Option<DelegationId>) -> Result<Self> {
        if claim.owner() != claimer.address() {
            Err(Error::AttestationInvalid("claim is not owned by the requesting identity"))?;
        }
        let root_hash = RootHashContainer {
            claim: &claim,
            legitimations: &legitimations,
            delegation_id: &delegation_id,
        }
        .hash()?;
        let claimer_signature = claimer.sign(root_hash.as_bytes())?;
        Ok(Self {
            claim,
            legitimations,
            delegation_id,
            root_hash: root_hash.to_hex(),
            claimer_signature,
        })
    }

    /// Check that the root hash matches what it covers.
    pub fn verify_data(&self) -> Result<()> {
        let computed = RootHashContainer {
            claim: &self.claim,
            legitimations: &self.legitimations,
            delegation_id: &self.delegation_id,
        }
        .hash()?;
        if computed.to_hex() != self.root_hash {
            Err(Error::AttestationInvalid("root hash does not match request contents"))?;
        }
        Ok(())
    }

    /// Check that the claim owner signed the root hash.
    pub fn verify_signature(&self) -> Result<()> {
        let root_hash = Hash::from_hex(&self.root_hash).map_err(|_| Error::AttestationInvalid("root hash is malformed"))?;
        self.claim
            .owner()
            .verify(&self.claimer_signature, root_hash.as_bytes())
            .map_err(|_| Error::AttestationInvalid("claimer signature does not verify"))
    }

    /// Full verification: data, then signature.
    pub fn verify(&self) -> Result<()> {
        self.verify_data()?;
        self.verify_signature()
    }

    #[cfg(test)]
    pub(crate) fn claim_mut(&mut self) -> &mut Claim {
        &mut self.claim
    }
}
