//! The inbox pipeline: fetch everything addressed to us, open what we can,
//! and drop (and log) what we can't.

use crate::{
    error::{Error, Result},
    identity::{Contact, Identity},
    message::{ensure_owner_is_sender, DecryptedMessage, Envelope, MessageId},
    service::{contacts::ContactResolver, dispatch::Dispatcher},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// An envelope that didn't make it through the pipeline, and why.
#[derive(Debug, getset::Getters)]
#[getset(get = "pub")]
pub struct RejectedEnvelope {
    /// The envelope as the service handed it to us
    envelope: Value,
    error: Error,
}

/// Everything that came out of an inbox fetch.
#[derive(Debug, Default, getset::Getters)]
#[getset(get = "pub")]
pub struct InboxReport {
    /// Messages that opened and checked out, in the order the service sent
    /// them
    messages: Vec<DecryptedMessage>,
    rejected: Vec<RejectedEnvelope>,
}

impl InboxReport {
    pub fn into_messages(self) -> Vec<DecryptedMessage> {
        self.messages
    }
}

/// Fetches and opens our mail.
#[derive(Clone)]
pub struct Inbox {
    dispatcher: Dispatcher,
    contacts: Arc<dyn ContactResolver>,
}

impl Inbox {
    pub fn new(dispatcher: Dispatcher, contacts: Arc<dyn ContactResolver>) -> Self {
        Self { dispatcher, contacts }
    }

    /// Fetch the messages addressed to `identity`. Only a failure to fetch the
    /// inbox itself is an error, bad messages are just left out.
    pub async fn fetch_inbox(&self, identity: &Identity) -> Result<Vec<DecryptedMessage>> {
        Ok(self.fetch_inbox_report(identity).await?.into_messages())
    }

    /// Like [fetch_inbox](Self::fetch_inbox) but also hands back whatever was
    /// rejected.
    pub async fn fetch_inbox_report(&self, identity: &Identity) -> Result<InboxReport> {
        let raw = self.dispatcher.inbox(identity.address()).await?;
        debug!(address = %identity.address(), count = raw.len(), "fetched inbox");
        let mut report = InboxReport::default();
        for value in raw {
            match self.open(identity, &value) {
                Ok(message) => report.messages.push(message),
                Err(e) => {
                    error!("error on decrypting message: {}: {}", e, value);
                    report.rejected.push(RejectedEnvelope { envelope: value, error: e });
                }
            }
        }
        Ok(report)
    }

    /// Fetch and open a single message by id. Unlike the full inbox fetch, a
    /// message that doesn't check out is an error here.
    pub async fn fetch_message(&self, identity: &Identity, message_id: &MessageId) -> Result<DecryptedMessage> {
        let value = self.dispatcher.message(identity.address(), message_id).await?;
        self.open(identity, &value).map_err(|e| {
            error!(message_id = %message_id, "error on decrypting message: {}", e);
            e
        })
    }

    fn open(&self, identity: &Identity, value: &Value) -> Result<DecryptedMessage> {
        let envelope: Envelope = serde_json::from_value(value.clone()).map_err(|e| Error::MessageParse(e.to_string()))?;
        let sender = self.resolve_sender(&envelope)?;
        let message = envelope.decrypt(identity, sender)?;
        ensure_owner_is_sender(&message)?;
        Ok(message)
    }

    /// Find who sent an envelope. Strangers get an unregistered placeholder
    /// built from the box key they sent along, if they sent one.
    fn resolve_sender(&self, envelope: &Envelope) -> Result<Contact> {
        if let Some(contact) = self.contacts.find_by_address(envelope.sender_address()) {
            return Ok(contact);
        }
        let box_key = envelope.sender_box_public_key().clone().ok_or(Error::MessageSenderKeyMissing)?;
        Ok(Contact::unregistered(envelope.sender_address().clone(), box_key))
    }
}
