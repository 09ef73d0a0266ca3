//! An attestation is a signed seal of approval on a
//! [request for attestation](crate::identity::RequestForAttestation), made by
//! an attester after they've looked the claim over.
//!
//! The attestation is created by the attester and shipped back to the claimer,
//! who bundles the two together as an [AttestedClaim] and can then present it
//! to anyone who asks.

use crate::{
    crypto::base::{Hash, SignKeypairSignature},
    error::{Error, Result},
    identity::{
        claim::{CTypeHash, RequestForAttestation},
        delegation::DelegationId,
        identity::{Address, Identity},
    },
};
use serde_derive::{Deserialize, Serialize};

/// An ephemeral container used for signing the attestation's fields. Not
/// stored anywhere, we only keep the resulting signature.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttestationSignatureContainer<'a> {
    claim_hash: &'a str,
    c_type_hash: &'a CTypeHash,
    owner: &'a Address,
    delegation_id: &'a Option<DelegationId>,
}

impl<'a> AttestationSignatureContainer<'a> {
    fn bytes(&self) -> Result<Vec<u8>> {
        Ok(Hash::of_json(self)?.as_bytes().to_vec())
    }
}

/// An attester's seal of approval on a request for attestation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    /// The root hash of the request being attested
    claim_hash: String,
    /// The CTYPE of the attested claim
    c_type_hash: CTypeHash,
    /// The attester
    owner: Address,
    /// The delegation the attester acts under, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delegation_id: Option<DelegationId>,
    /// Whether the attester has since taken this back
    #[serde(default)]
    revoked: bool,
    /// The attester's signature over the fields above (minus `revoked`)
    signature: SignKeypairSignature,
}

impl Attestation {
    /// Attest a request. The request is verified first: we don't put our name
    /// on something the claimer didn't sign.
    pub fn attest(attester: &Identity, request: &RequestForAttestation, delegation_id: Option<DelegationId>) -> Result<Self> {
        request.verify()?;
        let container = AttestationSignatureContainer {
            claim_hash: request.root_hash(),
            c_type_hash: request.claim().c_type_hash(),
            owner: attester.address(),
            delegation_id: &delegation_id,
        };
        let signature = attester.sign(&container.bytes()?)?;
        Ok(Self {
            claim_hash: request.root_hash().clone(),
            c_type_hash: request.claim().c_type_hash().clone(),
            owner: attester.address().clone(),
            delegation_id,
            revoked: false,
            signature,
        })
    }

    /// Take this attestation back. The signature still verifies, but any
    /// attested claim carrying it won't.
    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    /// Verify the attester signed this attestation.
    pub fn verify(&self) -> Result<()> {
        let container = AttestationSignatureContainer {
            claim_hash: &self.claim_hash,
            c_type_hash: &self.c_type_hash,
            owner: &self.owner,
            delegation_id: &self.delegation_id,
        };
        self.owner
            .verify(&self.signature, &container.bytes()?)
            .map_err(|_| Error::AttestationInvalid("attester signature does not verify"))
    }
}

/// A request for attestation along with the attestation that approves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct AttestedClaim {
    request: RequestForAttestation,
    attestation: Attestation,
}

impl AttestedClaim {
    pub fn new(request: RequestForAttestation, attestation: Attestation) -> Self {
        Self { request, attestation }
    }

    /// The CTYPE of the claim this attests.
    pub fn c_type_hash(&self) -> &CTypeHash {
        self.request.claim().c_type_hash()
    }

    /// The owner of the attested claim (not the attester).
    pub fn owner(&self) -> &Address {
        self.request.claim().owner()
    }

    /// Check the request and attestation both verify, that they belong
    /// together, and that the attestation hasn't been revoked.
    pub fn verify(&self) -> Result<()> {
        self.request.verify()?;
        self.attestation.verify()?;
        if self.attestation.claim_hash() != self.request.root_hash() {
            Err(Error::AttestationInvalid("attestation does not match request"))?;
        }
        if self.attestation.c_type_hash() != self.c_type_hash() {
            Err(Error::AttestationInvalid("attestation ctype does not match claim"))?;
        }
        if *self.attestation.revoked() {
            Err(Error::AttestationInvalid("attestation revoked"))?;
        }
        Ok(())
    }
}
