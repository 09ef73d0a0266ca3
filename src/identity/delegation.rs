//! Delegations let one identity grant another the right to attest (or to
//! delegate further) under a delegation node.
//!
//! The flow is an invitation: the inviter builds a [RequestAcceptDelegation]
//! and signs it, the invitee counter-signs it as a [SubmitAcceptDelegation],
//! and once the inviter records it on their side they send an
//! [InformCreateDelegation] so the invitee knows it's live.

use crate::{
    crypto::base::{Hash, SignKeypairSignature},
    error::{Error, Result},
    identity::identity::{Address, Identity},
};
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

string_id! {
    /// Identifies a delegation node.
    DelegationId
}

impl DelegationId {
    /// A fresh, random delegation id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// What a delegate is allowed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub attest: bool,
    #[serde(default)]
    pub delegate: bool,
}

impl Permissions {
    pub fn attest() -> Self {
        Self { attest: true, delegate: false }
    }

    pub fn any(&self) -> bool {
        self.attest || self.delegate
    }
}

/// A reference to a delegation we hold, along with what it lets us do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct DelegationRef {
    id: DelegationId,
    permissions: Permissions,
}

impl DelegationRef {
    pub fn new(id: DelegationId, permissions: Permissions) -> Self {
        Self { id, permissions }
    }
}

/// The data describing a proposed delegation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct DelegationData {
    /// The invitee
    account: Address,
    /// The id of the new delegation node
    id: DelegationId,
    /// The delegation node we're delegating from
    parent_id: DelegationId,
    permissions: Permissions,
    /// Whether this is a PCR (public credential registry) delegation
    #[serde(rename = "isPCR", default)]
    is_pcr: bool,
}

impl DelegationData {
    pub fn new(account: Address, parent_id: DelegationId, permissions: Permissions, is_pcr: bool) -> Self {
        Self {
            account,
            id: DelegationId::random(),
            parent_id,
            permissions,
            is_pcr,
        }
    }

    fn signable(&self) -> Result<Vec<u8>> {
        Ok(Hash::of_json(self)?.as_bytes().to_vec())
    }
}

/// Signatures gathered on a delegation invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
pub struct DelegationSignatures {
    /// The inviter's signature over the delegation data
    inviter: SignKeypairSignature,
    /// The invitee's signature over the inviter's signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invitee: Option<SignKeypairSignature>,
}

/// An invitation to accept a delegation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct RequestAcceptDelegation {
    delegation_data: DelegationData,
    /// Who's doing the inviting
    inviter: Address,
    signatures: DelegationSignatures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,
}

impl RequestAcceptDelegation {
    /// Create and sign an invitation.
    pub fn new(inviter: &Identity, delegation_data: DelegationData, metadata: Option<Map<String, Value>>) -> Result<Self> {
        let sig = inviter.sign(&delegation_data.signable()?)?;
        Ok(Self {
            delegation_data,
            inviter: inviter.address().clone(),
            signatures: DelegationSignatures { inviter: sig, invitee: None },
            metadata,
        })
    }

    /// Verify the inviter signed the delegation data.
    pub fn verify(&self) -> Result<()> {
        self.inviter.verify(&self.signatures.inviter, &self.delegation_data.signable()?)
    }
}

/// An accepted delegation invitation, carrying both signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct SubmitAcceptDelegation {
    delegation_data: DelegationData,
    inviter: Address,
    signatures: DelegationSignatures,
}

impl SubmitAcceptDelegation {
    /// Accept an invitation. Only the invitee named in the delegation data may
    /// do this, and only for an invitation that verifies.
    pub fn accept(invitee: &Identity, request: &RequestAcceptDelegation) -> Result<Self> {
        request.verify()?;
        if request.delegation_data().account() != invitee.address() {
            Err(Error::WorkflowPrecondition("delegation is for another account"))?;
        }
        let invitee_sig = invitee.sign(request.signatures().inviter().as_ref())?;
        Ok(Self {
            delegation_data: request.delegation_data().clone(),
            inviter: request.inviter().clone(),
            signatures: DelegationSignatures {
                inviter: request.signatures().inviter().clone(),
                invitee: Some(invitee_sig),
            },
        })
    }

    /// Verify both signatures.
    pub fn verify(&self) -> Result<()> {
        self.inviter.verify(&self.signatures.inviter, &self.delegation_data.signable()?)?;
        let invitee_sig = self.signatures.invitee.as_ref().ok_or(Error::CryptoSignatureVerificationFailed)?;
        self.delegation_data
            .account()
            .verify(invitee_sig, self.signatures.inviter.as_ref())
    }
}

/// Lets the invitee know their delegation has been created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct InformCreateDelegation {
    delegation_id: DelegationId,
    #[serde(rename = "isPCR", default)]
    is_pcr: bool,
}

impl InformCreateDelegation {
    pub fn new(delegation_id: DelegationId, is_pcr: bool) -> Self {
        Self { delegation_id, is_pcr }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test;

    #[test]
    fn delegation_invite_accept() {
        let mut rng = test::rng();
        let inviter = Identity::generate(&mut rng);
        let invitee = Identity::generate(&mut rng);
        let data = DelegationData::new(invitee.address().clone(), DelegationId::from("root-node"), Permissions::attest(), false);
        let request = RequestAcceptDelegation::new(&inviter, data, None).unwrap();
        request.verify().unwrap();

        let submit = SubmitAcceptDelegation::accept(&invitee, &request).unwrap();
        submit.verify().unwrap();
        assert_eq!(submit.delegation_data(), request.delegation_data());

        // a third party can't accept someone else's invite
        let interloper = Identity::generate(&mut rng);
        let res = SubmitAcceptDelegation::accept(&interloper, &request);
        assert_eq!(res.err(), Some(Error::WorkflowPrecondition("delegation is for another account")));
    }

    #[test]
    fn delegation_data_serde() {
        let data = DelegationData::new(Address::from("jerry"), DelegationId::from("parent"), Permissions { attest: true, delegate: true }, true);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["isPCR"], Value::Bool(true));
        assert_eq!(json["parentId"], Value::String("parent".into()));
        assert_eq!(json["permissions"]["delegate"], Value::Bool(true));
        assert!(DelegationId::random() != DelegationId::random());
    }

    #[test]
    fn delegation_ref_permissions() {
        assert!(!Permissions::default().any());
        assert!(Permissions::attest().any());
        assert!(Permissions { attest: false, delegate: true }.any());

        let node = DelegationRef::new(DelegationId::from("node"), Permissions::attest());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], Value::String("node".into()));
        assert_eq!(json["permissions"]["attest"], Value::Bool(true));
        let node2: DelegationRef = serde_json::from_value(json).unwrap();
        assert_eq!(node, node2);
    }
}
