//! Fan-out sending: one body, many recipients, one envelope each.
//!
//! Recipients are handled one after another in the order given. A failure
//! for one recipient never stops the others, and every recipient gets
//! exactly one notification saying how it went.

use crate::{
    crypto::base::rng_chacha20,
    error::{Error, Result},
    identity::{Address, Contact, Identity, PublicIdentity},
    message::{Envelope, MessageBody},
    service::{
        contacts::ContactResolver,
        dispatch::Dispatcher,
        intercept::Interceptor,
        notify::Notifier,
        transport::Receipt,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

/// How sending to a single recipient went.
#[derive(Debug, getset::Getters)]
#[getset(get = "pub")]
pub struct SendOutcome {
    recipient: Address,
    /// The recipient's name, or their address if they don't have one
    recipient_name: String,
    result: Result<Receipt>,
}

impl SendOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sends message bodies to lists of recipients.
#[derive(Clone)]
pub struct FanOutSender {
    dispatcher: Dispatcher,
    contacts: Arc<dyn ContactResolver>,
    notifier: Arc<dyn Notifier>,
    interceptor: Arc<dyn Interceptor>,
}

impl FanOutSender {
    pub fn new(dispatcher: Dispatcher, contacts: Arc<dyn ContactResolver>, notifier: Arc<dyn Notifier>, interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            dispatcher,
            contacts,
            notifier,
            interceptor,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn contacts(&self) -> &Arc<dyn ContactResolver> {
        &self.contacts
    }

    /// Look up the contact for an address we're about to send to. A miss
    /// gets its own (non-blocking) failure notification.
    pub fn resolve(&self, address: &Address) -> Result<Contact> {
        match self.contacts.find_by_address(address) {
            Some(contact) => Ok(contact),
            None => {
                warn!(address = %address, "no contact for address");
                self.notifier
                    .notify_failure(&format!("Could not send message to this address: {}", address), false);
                Err(Error::ContactNotFound(address.to_string()))
            }
        }
    }

    /// Send `body` to each recipient. Outcomes come back in recipient order.
    pub async fn send(&self, sender: &Identity, recipients: &[Contact], body: &MessageBody) -> Vec<SendOutcome> {
        let mut outcomes = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            outcomes.push(self.single_send(sender, recipient, body).await);
        }
        outcomes
    }

    /// Send `body` to a list of addresses, looking each one up in the contact
    /// list first. Addresses we can't find fail without stopping the rest.
    pub async fn send_to_addresses(&self, sender: &Identity, addresses: &[Address], body: &MessageBody) -> Vec<SendOutcome> {
        let mut outcomes = Vec::with_capacity(addresses.len());
        for address in addresses {
            let outcome = match self.resolve(address) {
                Ok(contact) => self.single_send(sender, &contact, body).await,
                Err(e) => SendOutcome {
                    recipient: address.clone(),
                    recipient_name: address.to_string(),
                    result: Err(e),
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Send to someone we only have a public identity for.
    pub async fn send_to_public_identity(&self, sender: &Identity, public_identity: &PublicIdentity, body: &MessageBody) -> SendOutcome {
        let contact = Contact::from_public_identity(public_identity.clone());
        self.single_send(sender, &contact, body).await
    }

    /// Send several bodies to the same set of addresses, one body at a time.
    pub async fn multi_send_to_addresses(&self, sender: &Identity, addresses: &[Address], bodies: &[MessageBody]) -> Vec<SendOutcome> {
        let mut outcomes = Vec::with_capacity(addresses.len() * bodies.len());
        for body in bodies {
            outcomes.extend(self.send_to_addresses(sender, addresses, body).await);
        }
        outcomes
    }

    async fn single_send(&self, sender: &Identity, recipient: &Contact, body: &MessageBody) -> SendOutcome {
        let body_type = body.body_type();
        let name = recipient.display_name().to_string();
        let body = self.interceptor.intercept(body).await.resolve(body.clone());
        let mut rng = rng_chacha20();
        let result = match Envelope::encrypt(&mut rng, &body, sender, recipient.public_identity()) {
            Ok(envelope) => match self.dispatcher.dispatch(&envelope).await {
                Ok(receipt) => {
                    info!(receiver = %recipient.address(), "sent {}", body_type);
                    self.notifier
                        .notify_success(&format!("Message '{}' to receiver {} successfully sent.", body_type, name));
                    Ok(receipt)
                }
                Err(e) => {
                    self.notifier
                        .notify_failure(&format!("Could not send message '{}' to receiver '{}'", body_type, name), true);
                    Err(e)
                }
            },
            Err(e) => {
                self.notifier
                    .notify_failure(&format!("Could not create message '{}' to receiver '{}'", body_type, name), true);
                Err(e)
            }
        };
        SendOutcome {
            recipient: recipient.address().clone(),
            recipient_name: name,
            result,
        }
    }
}
