//! Welcome to attest-core, the messaging core of a claims and attestation
//! wallet.
//!
//! Identities in the wallet hold a signing keypair and an encryption keypair,
//! and talk to each other by sending encrypted, signed messages through a
//! messaging service. The messages carry the attestation protocol: a claimer
//! asks an attester for their terms, gets them back, sends a signed request
//! for attestation, and gets an attested claim in return. Later, verifiers ask
//! for attested claims of certain CTYPEs and the claimer hands them over.
//! Attesters can also invite others to attest on their behalf through
//! delegations.
//!
//! This crate handles:
//!
//! 1. The typed message bodies of the protocol ([message::MessageBody]).
//! 1. Sealing bodies into envelopes and opening them again
//! ([message::Envelope]).
//! 1. Fanning a message out to many recipients, where one failure never
//! sinks the rest ([service::FanOutSender]).
//! 1. Fetching and opening the inbox, dropping whatever doesn't check out
//! ([service::Inbox]).
//! 1. The task state machine that decides what gets sent next
//! ([workflow::Orchestrator]).
//!
//! Storing identities and contacts, showing anything to a user, and writing to
//! a blockchain all happen elsewhere. The pieces of those we need are reached
//! through traits ([service::ContactResolver], [service::Notifier],
//! [service::Interceptor], [service::Transport]).

pub mod error;
#[macro_use]
pub(crate) mod util;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod message;
pub mod service;
pub mod workflow;
