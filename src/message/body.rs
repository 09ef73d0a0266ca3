//! Message bodies: the typed payloads that travel inside an envelope.
//!
//! A body is serialized as `{"type": "<kebab-name>", "content": <payload>}`.
//! Each type has exactly one payload shape, so once a body has parsed we know
//! exactly what it holds.

use crate::{
    error::{Error, Result},
    identity::{
        AttestedClaim, CTypeHash, DelegationId, InformCreateDelegation, PartialClaim, RequestAcceptDelegation,
        RequestForAttestation, SubmitAcceptDelegation,
    },
};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The terms under which a claimer may request an attestation. Sent by the
/// attester in reply to [MessageBody::RequestTerms], or sent back when the
/// claimer rejects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Terms {
    claim: PartialClaim,
    #[serde(default)]
    legitimations: Vec<AttestedClaim>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delegation_id: Option<DelegationId>,
}

impl Terms {
    pub fn new(claim: PartialClaim, legitimations: Vec<AttestedClaim>, delegation_id: Option<DelegationId>) -> Self {
        Self {
            claim,
            legitimations,
            delegation_id,
        }
    }
}

/// Wraps a request for attestation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct RequestAttestationForClaim {
    request_for_attestation: RequestForAttestation,
}

impl RequestAttestationForClaim {
    pub fn new(request_for_attestation: RequestForAttestation) -> Self {
        Self { request_for_attestation }
    }
}

/// One entry in a request for claims. The hash may be missing, in which case
/// the entry doesn't ask for anything in particular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct RequestClaimsForCType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    c_type_hash: Option<CTypeHash>,
}

impl RequestClaimsForCType {
    pub fn new(c_type_hash: Option<CTypeHash>) -> Self {
        Self { c_type_hash }
    }
}

/// A message body. One variant per message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum MessageBody {
    #[serde(rename = "request-terms")]
    RequestTerms(PartialClaim),
    #[serde(rename = "submit-terms")]
    SubmitTerms(Terms),
    #[serde(rename = "reject-terms")]
    RejectTerms(Terms),
    #[serde(rename = "request-attestation-for-claim")]
    RequestAttestationForClaim(RequestAttestationForClaim),
    #[serde(rename = "submit-attestation-for-claim")]
    SubmitAttestationForClaim(AttestedClaim),
    /// Holds the root hash of the rejected request
    #[serde(rename = "reject-attestation-for-claim")]
    RejectAttestationForClaim(String),
    #[serde(rename = "request-claims-for-ctypes")]
    RequestClaimsForCTypes(Vec<RequestClaimsForCType>),
    #[serde(rename = "submit-claims-for-ctypes")]
    SubmitClaimsForCTypes(Vec<AttestedClaim>),
    #[serde(rename = "request-accept-delegation")]
    RequestAcceptDelegation(RequestAcceptDelegation),
    #[serde(rename = "submit-accept-delegation")]
    SubmitAcceptDelegation(SubmitAcceptDelegation),
    #[serde(rename = "reject-accept-delegation")]
    RejectAcceptDelegation(RequestAcceptDelegation),
    #[serde(rename = "inform-create-delegation")]
    InformCreateDelegation(InformCreateDelegation),
}

/// Just the type of a message body, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageBodyType {
    RequestTerms,
    SubmitTerms,
    RejectTerms,
    RequestAttestationForClaim,
    SubmitAttestationForClaim,
    RejectAttestationForClaim,
    RequestClaimsForCTypes,
    SubmitClaimsForCTypes,
    RequestAcceptDelegation,
    SubmitAcceptDelegation,
    RejectAcceptDelegation,
    InformCreateDelegation,
}

impl MessageBodyType {
    /// The name this type goes by on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestTerms => "request-terms",
            Self::SubmitTerms => "submit-terms",
            Self::RejectTerms => "reject-terms",
            Self::RequestAttestationForClaim => "request-attestation-for-claim",
            Self::SubmitAttestationForClaim => "submit-attestation-for-claim",
            Self::RejectAttestationForClaim => "reject-attestation-for-claim",
            Self::RequestClaimsForCTypes => "request-claims-for-ctypes",
            Self::SubmitClaimsForCTypes => "submit-claims-for-ctypes",
            Self::RequestAcceptDelegation => "request-accept-delegation",
            Self::SubmitAcceptDelegation => "submit-accept-delegation",
            Self::RejectAcceptDelegation => "reject-accept-delegation",
            Self::InformCreateDelegation => "inform-create-delegation",
        }
    }
}

impl fmt::Display for MessageBodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MessageBody {
    /// Parse a body out of a JSON value. Anything that isn't a known type with
    /// a matching payload is a [MessageParse](Error::MessageParse) error.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::MessageParse(e.to_string()))
    }

    pub fn body_type(&self) -> MessageBodyType {
        match self {
            Self::RequestTerms(..) => MessageBodyType::RequestTerms,
            Self::SubmitTerms(..) => MessageBodyType::SubmitTerms,
            Self::RejectTerms(..) => MessageBodyType::RejectTerms,
            Self::RequestAttestationForClaim(..) => MessageBodyType::RequestAttestationForClaim,
            Self::SubmitAttestationForClaim(..) => MessageBodyType::SubmitAttestationForClaim,
            Self::RejectAttestationForClaim(..) => MessageBodyType::RejectAttestationForClaim,
            Self::RequestClaimsForCTypes(..) => MessageBodyType::RequestClaimsForCTypes,
            Self::SubmitClaimsForCTypes(..) => MessageBodyType::SubmitClaimsForCTypes,
            Self::RequestAcceptDelegation(..) => MessageBodyType::RequestAcceptDelegation,
            Self::SubmitAcceptDelegation(..) => MessageBodyType::SubmitAcceptDelegation,
            Self::RejectAcceptDelegation(..) => MessageBodyType::RejectAcceptDelegation,
            Self::InformCreateDelegation(..) => MessageBodyType::InformCreateDelegation,
        }
    }

    /// The CTYPE hashes this body references. Missing and empty hashes in a
    /// request for claims are skipped, and the hashes of submitted claims are
    /// deduplicated, first occurrence wins.
    pub fn ctype_hashes(&self) -> Vec<CTypeHash> {
        match self {
            Self::RequestTerms(claim) => vec![claim.c_type_hash().clone()],
            Self::SubmitTerms(terms) | Self::RejectTerms(terms) => vec![terms.claim().c_type_hash().clone()],
            Self::RequestAttestationForClaim(req) => vec![req.request_for_attestation().claim().c_type_hash().clone()],
            Self::SubmitAttestationForClaim(attested) => vec![attested.attestation().c_type_hash().clone()],
            Self::RequestClaimsForCTypes(entries) => entries
                .iter()
                .filter_map(|x| x.c_type_hash().clone())
                .filter(|x| !x.is_empty())
                .collect(),
            Self::SubmitClaimsForCTypes(attested_claims) => {
                let mut hashes: Vec<CTypeHash> = Vec::with_capacity(attested_claims.len());
                for hash in attested_claims.iter().map(|x| x.c_type_hash()) {
                    if !hashes.contains(hash) {
                        hashes.push(hash.clone());
                    }
                }
                hashes
            }
            Self::RejectAttestationForClaim(..)
            | Self::RequestAcceptDelegation(..)
            | Self::SubmitAcceptDelegation(..)
            | Self::RejectAcceptDelegation(..)
            | Self::InformCreateDelegation(..) => vec![],
        }
    }
}

/// Like [MessageBody::ctype_hashes] but for a raw JSON body that may be of a
/// type we don't know about (or just plain garbage). Never fails, you just
/// get nothing back.
pub fn ctype_hashes_from_json(raw: &Value) -> Vec<CTypeHash> {
    match MessageBody::from_value(raw.clone()) {
        Ok(body) => body.ctype_hashes(),
        Err(_) => vec![],
    }
}
