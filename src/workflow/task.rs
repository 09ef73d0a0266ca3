//! The task state machine. A task is one interactive step of the protocol
//! (request some terms, invite a delegate, etc). While a task is open we
//! collect which CTYPEs and which receivers it applies to, and once both are
//! picked the task can be sent.

use crate::{
    error::{Error, Result},
    identity::{
        Address, AttestedClaim, CTypeHash, Claim, ClaimContents, Contact, DelegationData, DelegationId, DelegationRef,
        Identity, PartialClaim, Permissions, RequestAcceptDelegation, RequestForAttestation,
    },
    message::{DecryptedMessage, MessageBody, RequestAttestationForClaim, RequestClaimsForCType, Terms},
    service::sender::{FanOutSender, SendOutcome},
};
use serde_json::{Map, Value};
use tracing::debug;

/// What the currently open task is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Objective {
    #[default]
    None,
    RequestTerms,
    SubmitTerms,
    RequestAttestationForClaim,
    RequestClaimsForCTypes,
    SubmitClaimsForCTypes,
    RequestAcceptDelegation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTermsProps {
    /// Anything we already want filled in on the claim
    pub contents: Option<ClaimContents>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitTermsProps {
    pub claim_contents: Option<ClaimContents>,
    pub legitimations: Vec<AttestedClaim>,
    pub delegation_id: Option<DelegationId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestAttestationProps {
    pub claim: Claim,
    pub legitimations: Vec<AttestedClaim>,
    pub delegation_id: Option<DelegationId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestClaimsForCTypesProps {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitClaimsForCTypesProps {
    /// The attested claims we're willing to hand over. Only the ones matching
    /// the selected CTYPEs are sent.
    pub attested_claims: Vec<AttestedClaim>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestAcceptDelegationProps {
    /// The delegation we hold and are delegating from
    pub parent: DelegationRef,
    /// What the invitees get
    pub permissions: Permissions,
    pub is_pcr: bool,
    pub metadata: Option<Map<String, Value>>,
}

/// A task: an objective along with the props that objective needs. There's
/// no way to build one with the wrong props.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Task {
    #[default]
    None,
    RequestTerms(RequestTermsProps),
    SubmitTerms(SubmitTermsProps),
    RequestAttestationForClaim(RequestAttestationProps),
    RequestClaimsForCTypes(RequestClaimsForCTypesProps),
    SubmitClaimsForCTypes(SubmitClaimsForCTypesProps),
    RequestAcceptDelegation(RequestAcceptDelegationProps),
}

impl Task {
    pub fn objective(&self) -> Objective {
        match self {
            Self::None => Objective::None,
            Self::RequestTerms(..) => Objective::RequestTerms,
            Self::SubmitTerms(..) => Objective::SubmitTerms,
            Self::RequestAttestationForClaim(..) => Objective::RequestAttestationForClaim,
            Self::RequestClaimsForCTypes(..) => Objective::RequestClaimsForCTypes,
            Self::SubmitClaimsForCTypes(..) => Objective::SubmitClaimsForCTypes,
            Self::RequestAcceptDelegation(..) => Objective::RequestAcceptDelegation,
        }
    }

    /// The task that answers an inbound message, if there is one. `me` is the
    /// identity the message was sent to and `wallet_claims` are the attested
    /// claims we hold.
    pub fn reply_to(message: &DecryptedMessage, me: &Address, wallet_claims: &[AttestedClaim]) -> Option<Self> {
        match message.body() {
            MessageBody::RequestTerms(claim) => Some(Self::SubmitTerms(SubmitTermsProps {
                claim_contents: claim.contents().clone(),
                legitimations: vec![],
                delegation_id: None,
            })),
            MessageBody::SubmitTerms(terms) => Some(Self::RequestAttestationForClaim(RequestAttestationProps {
                claim: terms.claim().complete(me.clone()),
                legitimations: terms.legitimations().clone(),
                delegation_id: terms.delegation_id().clone(),
            })),
            MessageBody::RequestClaimsForCTypes(..) => {
                let wanted = message.ctype_hashes();
                let attested_claims = wallet_claims
                    .iter()
                    .filter(|x| wanted.contains(x.c_type_hash()))
                    .cloned()
                    .collect();
                Some(Self::SubmitClaimsForCTypes(SubmitClaimsForCTypesProps { attested_claims }))
            }
            _ => None,
        }
    }
}

/// One body and who it goes to.
#[derive(Debug, Clone, PartialEq, getset::Getters)]
#[getset(get = "pub")]
pub struct Outgoing {
    body: MessageBody,
    receivers: Vec<Contact>,
}

/// Everything a task will send once it goes. Most tasks send one body to all
/// receivers, but delegation invites are made out to each invitee.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedSend(Vec<Outgoing>);

impl PreparedSend {
    pub fn outgoing(&self) -> &[Outgoing] {
        &self.0
    }
}

/// Keeps track of the open task and what's been picked for it.
#[derive(Debug, Clone, Default, getset::Getters)]
#[getset(get = "pub")]
pub struct Orchestrator {
    task: Task,
    selected_ctypes: Vec<CTypeHash>,
    selected_receivers: Vec<Contact>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objective(&self) -> Objective {
        self.task.objective()
    }

    /// Open a task. Opening a task with a different objective than the current
    /// one throws out whatever was selected.
    pub fn open(&mut self, task: Task) {
        if task.objective() != self.objective() {
            self.selected_ctypes.clear();
            self.selected_receivers.clear();
        }
        // the claim already says what CTYPE it is
        if let Task::RequestAttestationForClaim(props) = &task {
            self.selected_ctypes = vec![props.claim.c_type_hash().clone()];
        }
        debug!(objective = ?task.objective(), "task opened");
        self.task = task;
    }

    /// Open whatever task answers `message`, with its sender picked as the
    /// receiver and the CTYPEs it mentions picked as well. Returns false if
    /// the message doesn't call for an answer.
    pub fn open_reply(&mut self, message: &DecryptedMessage, me: &Address, wallet_claims: &[AttestedClaim]) -> bool {
        match Task::reply_to(message, me, wallet_claims) {
            Some(task) => {
                self.open(task);
                let ctypes = message.ctype_hashes();
                if !ctypes.is_empty() {
                    self.select_ctypes(ctypes);
                }
                self.select_receivers(vec![message.sender().clone()]);
                true
            }
            None => false,
        }
    }

    pub fn select_ctypes(&mut self, ctypes: Vec<CTypeHash>) {
        self.selected_ctypes = ctypes;
    }

    pub fn select_receivers(&mut self, receivers: Vec<Contact>) {
        self.selected_receivers = receivers;
    }

    /// Close the current task and forget everything about it. Always safe.
    pub fn cancel(&mut self) {
        self.task = Task::None;
        self.selected_ctypes.clear();
        self.selected_receivers.clear();
    }

    /// Build what the current task would send, without sending it or touching
    /// any state.
    pub fn prepare(&self, identity: &Identity) -> Result<PreparedSend> {
        if self.objective() == Objective::None {
            Err(Error::WorkflowPrecondition("no task is open"))?;
        }
        if self.selected_receivers.is_empty() {
            Err(Error::WorkflowPrecondition("no receivers selected"))?;
        }
        let first_ctype = self
            .selected_ctypes
            .first()
            .ok_or(Error::WorkflowPrecondition("no ctypes selected"))?;
        let for_everyone = |body: MessageBody| {
            PreparedSend(vec![Outgoing {
                body,
                receivers: self.selected_receivers.clone(),
            }])
        };
        let prepared = match &self.task {
            Task::None => Err(Error::WorkflowPrecondition("no task is open"))?,
            Task::RequestTerms(props) => for_everyone(MessageBody::RequestTerms(PartialClaim::new(
                first_ctype.clone(),
                props.contents.clone(),
                Some(identity.address().clone()),
            ))),
            Task::SubmitTerms(props) => for_everyone(MessageBody::SubmitTerms(Terms::new(
                PartialClaim::new(first_ctype.clone(), props.claim_contents.clone(), None),
                props.legitimations.clone(),
                props.delegation_id.clone(),
            ))),
            Task::RequestAttestationForClaim(props) => {
                let request = RequestForAttestation::new(identity, props.claim.clone(), props.legitimations.clone(), props.delegation_id.clone())?;
                for_everyone(MessageBody::RequestAttestationForClaim(RequestAttestationForClaim::new(request)))
            }
            Task::RequestClaimsForCTypes(_) => for_everyone(MessageBody::RequestClaimsForCTypes(
                self.selected_ctypes
                    .iter()
                    .map(|x| RequestClaimsForCType::new(Some(x.clone())))
                    .collect(),
            )),
            Task::SubmitClaimsForCTypes(props) => {
                let attested_claims = props
                    .attested_claims
                    .iter()
                    .filter(|x| self.selected_ctypes.contains(x.c_type_hash()))
                    .cloned()
                    .collect::<Vec<_>>();
                if attested_claims.is_empty() {
                    Err(Error::WorkflowPrecondition("no attested claims for the selected ctypes"))?;
                }
                for_everyone(MessageBody::SubmitClaimsForCTypes(attested_claims))
            }
            Task::RequestAcceptDelegation(props) => {
                if !props.parent.permissions().delegate {
                    Err(Error::WorkflowPrecondition("delegation does not allow delegating"))?;
                }
                if !props.permissions.any() {
                    Err(Error::WorkflowPrecondition("no permissions granted"))?;
                }
                let mut metadata = props.metadata.clone().unwrap_or_default();
                metadata.insert("cTypeHash".into(), Value::String(first_ctype.to_string()));
                let mut outgoing = Vec::with_capacity(self.selected_receivers.len());
                for receiver in &self.selected_receivers {
                    let data = DelegationData::new(receiver.address().clone(), props.parent.id().clone(), props.permissions, props.is_pcr);
                    let request = RequestAcceptDelegation::new(identity, data, Some(metadata.clone()))?;
                    outgoing.push(Outgoing {
                        body: MessageBody::RequestAcceptDelegation(request),
                        receivers: vec![receiver.clone()],
                    });
                }
                PreparedSend(outgoing)
            }
        };
        Ok(prepared)
    }

    /// Send the current task and close it. If the task isn't ready to go,
    /// nothing is sent and nothing changes.
    pub async fn send(&mut self, fanout: &FanOutSender, identity: &Identity) -> Result<Vec<SendOutcome>> {
        let prepared = self.prepare(identity)?;
        let mut outcomes = Vec::new();
        for outgoing in prepared.0 {
            outcomes.extend(fanout.send(identity, &outgoing.receivers, &outgoing.body).await);
        }
        self.cancel();
        Ok(outcomes)
    }
}
