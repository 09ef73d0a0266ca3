//! Messages are how identities talk to each other: typed [bodies](body)
//! sealed into [envelopes](envelope) and shipped through the messaging
//! service.

use crate::{
    identity::{Address, Contact},
    util::Timestamp,
};

pub mod body;
pub mod envelope;

pub use body::{ctype_hashes_from_json, MessageBody, MessageBodyType, RequestAttestationForClaim, RequestClaimsForCType, Terms};
pub use envelope::{ensure_owner_is_sender, Envelope};

string_id! {
    /// Identifies a message in the messaging service.
    MessageId
}

impl MessageId {
    /// A fresh (v4) message id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// A message that's been opened and checked.
#[derive(Debug, Clone, PartialEq, getset::Getters)]
#[getset(get = "pub")]
pub struct DecryptedMessage {
    message_id: MessageId,
    body: MessageBody,
    created_at: Timestamp,
    sender_address: Address,
    receiver_address: Address,
    /// The envelope this came out of
    encrypted_message: Envelope,
    /// Who sent it. May be an unregistered placeholder.
    sender: Contact,
}

impl DecryptedMessage {
    pub(crate) fn new(
        message_id: MessageId,
        body: MessageBody,
        created_at: Timestamp,
        sender_address: Address,
        receiver_address: Address,
        encrypted_message: Envelope,
        sender: Contact,
    ) -> Self {
        Self {
            message_id,
            body,
            created_at,
            sender_address,
            receiver_address,
            encrypted_message,
            sender,
        }
    }

    pub fn body_type(&self) -> MessageBodyType {
        self.body.body_type()
    }

    /// CTYPE hashes referenced by this message's body.
    pub fn ctype_hashes(&self) -> Vec<crate::identity::CTypeHash> {
        self.body.ctype_hashes()
    }
}
