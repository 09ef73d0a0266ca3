//! Delivery of sealed envelopes and cleanup of delivered ones.

use crate::{
    crypto::base::SignKeypairSignature,
    error::{Error, Result},
    identity::{Address, Identity},
    message::{Envelope, MessageId},
    service::transport::{Receipt, Transport},
    util::base64_encode,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Sign a message id so the messaging service lets us delete it.
pub fn sign_deletion(identity: &Identity, message_id: &MessageId) -> Result<SignKeypairSignature> {
    identity.sign(message_id.as_bytes())
}

/// Hands envelopes to the transport. Does not retry: a failure is reported
/// once and it's up to the caller to decide what to do about it.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Deliver an envelope.
    pub async fn dispatch(&self, envelope: &Envelope) -> Result<Receipt> {
        debug!(
            receiver = %envelope.receiver_address(),
            message_id = ?envelope.message_id(),
            "dispatching message"
        );
        self.transport.post_message(envelope).await.map_err(|e| {
            error!(receiver = %envelope.receiver_address(), "dispatch failed: {}", e);
            e
        })
    }

    /// Delete a message from the service. Without a signature we don't even
    /// bother asking.
    pub async fn delete_by_id(&self, message_id: &MessageId, signature: Option<&SignKeypairSignature>) -> Result<()> {
        let signature = signature.ok_or(Error::Unauthorized)?;
        debug!(message_id = %message_id, "deleting message");
        self.transport.delete_message(message_id, &base64_encode(signature)).await
    }

    /// Grab the raw inbox for an address.
    pub async fn inbox(&self, address: &Address) -> Result<Vec<Value>> {
        self.transport.get_inbox(address).await
    }

    /// Grab a single raw envelope out of an address' inbox.
    pub async fn message(&self, address: &Address, message_id: &MessageId) -> Result<Value> {
        self.transport.get_message(address, message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identity::{CTypeHash, PartialClaim},
        message::MessageBody,
        util::test::{self, MemoryTransport},
    };

    #[tokio::test]
    async fn dispatch_and_delete() {
        test::init_logging();
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Dispatcher::new(transport.clone());

        let body = MessageBody::RequestTerms(PartialClaim::new(CTypeHash::from("0x1"), None, None));
        let envelope = Envelope::encrypt(&mut rng, &body, &sender, &receiver.public_identity()).unwrap();
        let receipt = dispatcher.dispatch(&envelope).await.unwrap();
        let message_id = receipt.message_id().clone().unwrap();
        assert_eq!(dispatcher.inbox(receiver.address()).await.unwrap().len(), 1);

        let res = dispatcher.delete_by_id(&message_id, None).await;
        assert_eq!(res, Err(Error::Unauthorized));

        let nosy = Identity::generate(&mut rng);
        let bad_sig = sign_deletion(&nosy, &message_id).unwrap();
        let res = dispatcher.delete_by_id(&message_id, Some(&bad_sig)).await;
        assert_eq!(res, Err(Error::Unauthorized));
        assert_eq!(dispatcher.inbox(receiver.address()).await.unwrap().len(), 1);

        let sig = sign_deletion(&receiver, &message_id).unwrap();
        dispatcher.delete_by_id(&message_id, Some(&sig)).await.unwrap();
        assert_eq!(dispatcher.inbox(receiver.address()).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn dispatch_failure_is_surfaced() {
        test::init_logging();
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let transport = Arc::new(MemoryTransport::new());
        transport.fail_for(receiver.address(), 503);
        let dispatcher = Dispatcher::new(transport.clone());
        let body = MessageBody::RejectAttestationForClaim("0xdead".into());
        let envelope = Envelope::encrypt(&mut rng, &body, &sender, &receiver.public_identity()).unwrap();
        let res = dispatcher.dispatch(&envelope).await;
        assert!(matches!(res, Err(Error::Transport { status: 503, .. })));
        assert_eq!(transport.post_count(), 1);
    }
}
