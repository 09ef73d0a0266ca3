//! One-shot helpers for each step of the attestation and delegation
//! protocols. These don't go through the [Orchestrator](super::Orchestrator),
//! they just build the right body and send it where it needs to go.

use crate::{
    error::{Error, Result},
    identity::{
        Address, Attestation, AttestedClaim, CTypeHash, Claim, Contact, DelegationData, DelegationId, Identity,
        InformCreateDelegation, PartialClaim, RequestAcceptDelegation, RequestForAttestation, SubmitAcceptDelegation,
    },
    message::{MessageBody, RequestAttestationForClaim, RequestClaimsForCType, Terms},
    service::sender::{FanOutSender, SendOutcome},
};
use serde_json::{Map, Value};
use tracing::info;

/// Protocol steps, sent through a fan-out sender.
#[derive(Clone)]
pub struct Workflow {
    fanout: FanOutSender,
}

impl Workflow {
    pub fn new(fanout: FanOutSender) -> Self {
        Self { fanout }
    }

    /// Ask attesters what it'd take to get a claim attested.
    pub async fn request_terms(&self, identity: &Identity, claim: PartialClaim, attesters: &[Contact]) -> Vec<SendOutcome> {
        self.fanout.send(identity, attesters, &MessageBody::RequestTerms(claim)).await
    }

    /// Send terms back to the claimer who asked for them.
    pub async fn submit_terms(&self, identity: &Identity, terms: Terms, claimer: &Address) -> Vec<SendOutcome> {
        self.fanout
            .send_to_addresses(identity, &[claimer.clone()], &MessageBody::SubmitTerms(terms))
            .await
    }

    /// Tell the attester we don't like their terms.
    pub async fn reject_terms(&self, identity: &Identity, terms: Terms, attester: &Address) -> Vec<SendOutcome> {
        self.fanout
            .send_to_addresses(identity, &[attester.clone()], &MessageBody::RejectTerms(terms))
            .await
    }

    /// Sign a request for attestation and send it off to the attesters.
    pub async fn request_attestation_for_claim(
        &self,
        identity: &Identity,
        claim: Claim,
        attesters: &[Contact],
        legitimations: Vec<AttestedClaim>,
        delegation_id: Option<DelegationId>,
    ) -> Result<Vec<SendOutcome>> {
        let request = RequestForAttestation::new(identity, claim, legitimations, delegation_id)?;
        let body = MessageBody::RequestAttestationForClaim(RequestAttestationForClaim::new(request));
        Ok(self.fanout.send(identity, attesters, &body).await)
    }

    /// Check a request over, attest it, and send the attested claim back to
    /// the claimer (and only the claimer). The attested claim is returned so
    /// the attester can keep a record of it.
    pub async fn approve_and_submit_attestation(
        &self,
        attester: &Identity,
        request: &RequestForAttestation,
        claimer: &Address,
        delegation_id: Option<DelegationId>,
    ) -> Result<(AttestedClaim, SendOutcome)> {
        if request.claim().owner() != claimer {
            Err(Error::MessageSpoofedSender)?;
        }
        let contact = self.fanout.resolve(claimer)?;
        let attestation = Attestation::attest(attester, request, delegation_id)?;
        let attested = AttestedClaim::new(request.clone(), attestation);
        info!(claimer = %claimer, ctype = %attested.c_type_hash(), "claim attested");
        let body = MessageBody::SubmitAttestationForClaim(attested.clone());
        let mut outcomes = self.fanout.send(attester, &[contact], &body).await;
        let outcome = outcomes.pop().ok_or_else(|| Error::ContactNotFound(claimer.to_string()))?;
        Ok((attested, outcome))
    }

    /// Turn down a request for attestation.
    pub async fn reject_attestation_for_claim(&self, attester: &Identity, request: &RequestForAttestation, claimer: &Address) -> Vec<SendOutcome> {
        let body = MessageBody::RejectAttestationForClaim(request.root_hash().clone());
        self.fanout.send_to_addresses(attester, &[claimer.clone()], &body).await
    }

    /// Ask verifiees for attested claims of the given CTYPEs.
    pub async fn request_claims_for_ctypes(&self, identity: &Identity, ctypes: &[CTypeHash], receivers: &[Contact]) -> Vec<SendOutcome> {
        let body = MessageBody::RequestClaimsForCTypes(ctypes.iter().map(|x| RequestClaimsForCType::new(Some(x.clone()))).collect());
        self.fanout.send(identity, receivers, &body).await
    }

    /// Hand attested claims over to a verifier.
    pub async fn submit_claims_for_ctypes(&self, identity: &Identity, attested_claims: Vec<AttestedClaim>, verifier: &Address) -> Vec<SendOutcome> {
        let body = MessageBody::SubmitClaimsForCTypes(attested_claims);
        self.fanout.send_to_addresses(identity, &[verifier.clone()], &body).await
    }

    /// Invite someone to a delegation.
    pub async fn request_accept_delegation(
        &self,
        inviter: &Identity,
        delegation_data: DelegationData,
        metadata: Option<Map<String, Value>>,
        invitee: &Contact,
    ) -> Result<SendOutcome> {
        if delegation_data.account() != invitee.address() {
            Err(Error::WorkflowPrecondition("delegation is for another account"))?;
        }
        let request = RequestAcceptDelegation::new(inviter, delegation_data, metadata)?;
        let body = MessageBody::RequestAcceptDelegation(request);
        let mut outcomes = self.fanout.send(inviter, std::slice::from_ref(invitee), &body).await;
        outcomes.pop().ok_or(Error::WorkflowPrecondition("no invitee"))
    }

    /// Accept a delegation invite and let the inviter know.
    pub async fn accept_delegation(&self, invitee: &Identity, request: &RequestAcceptDelegation) -> Result<Vec<SendOutcome>> {
        let submit = SubmitAcceptDelegation::accept(invitee, request)?;
        let body = MessageBody::SubmitAcceptDelegation(submit);
        Ok(self.fanout.send_to_addresses(invitee, &[request.inviter().clone()], &body).await)
    }

    /// Turn down a delegation invite.
    pub async fn reject_delegation(&self, invitee: &Identity, request: &RequestAcceptDelegation) -> Vec<SendOutcome> {
        let body = MessageBody::RejectAcceptDelegation(request.clone());
        self.fanout.send_to_addresses(invitee, &[request.inviter().clone()], &body).await
    }

    /// Let a delegate know their delegation node now exists.
    pub async fn inform_create_delegation(&self, identity: &Identity, delegation_id: DelegationId, is_pcr: bool, delegate: &Address) -> Vec<SendOutcome> {
        let body = MessageBody::InformCreateDelegation(InformCreateDelegation::new(delegation_id, is_pcr));
        self.fanout.send_to_addresses(identity, &[delegate.clone()], &body).await
    }
}
