//! Envelopes are what actually travel over the wire: a boxed body plus enough
//! addressing and signing data for the receiver to figure out who sent it and
//! whether to believe them.

use crate::{
    crypto::base::{CryptoKeypair, CryptoKeypairMessage, CryptoKeypairNonce, CryptoKeypairPublic, SignKeypairSignature},
    error::{Error, Result},
    identity::{Address, Contact, Identity, PublicIdentity},
    message::{body::MessageBody, DecryptedMessage, MessageId},
    util::{ser, Binary, Timestamp},
};
use rand::{CryptoRng, RngCore};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

/// The plaintext that gets boxed up inside an envelope. The addressing is
/// repeated in here so it can't be swapped out on the outside.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InnerPayload<T> {
    body: T,
    created_at: Timestamp,
    sender_address: Address,
    receiver_address: Address,
}

/// An encrypted message, as stored and shipped by the messaging service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The ciphertext
    #[getset(get = "pub", get_mut = "pub(crate)")]
    #[serde(with = "ser::human_bytes")]
    message: Vec<u8>,
    /// The nonce used to box the ciphertext
    nonce: Binary<24>,
    created_at: Timestamp,
    sender_address: Address,
    receiver_address: Address,
    /// Lets receivers who don't know us yet open the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender_box_public_key: Option<CryptoKeypairPublic>,
    /// Assigned at creation, although the service may hand out its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<MessageId>,
    /// Sender's signature over the ciphertext, nonce, creation date, and
    /// receiver address
    signature: SignKeypairSignature,
}

impl Envelope {
    /// Seal a body from `sender` to `receiver`. Every call produces a fresh
    /// nonce and message id.
    pub fn encrypt<R: RngCore + CryptoRng>(rng: &mut R, body: &MessageBody, sender: &Identity, receiver: &PublicIdentity) -> Result<Self> {
        Self::seal(rng, body, sender, receiver)
    }

    fn seal<R: RngCore + CryptoRng, T: serde::Serialize>(rng: &mut R, body: &T, sender: &Identity, receiver: &PublicIdentity) -> Result<Self> {
        let created_at = Timestamp::now();
        let inner = InnerPayload {
            body,
            created_at: created_at.clone(),
            sender_address: sender.address().clone(),
            receiver_address: receiver.address().clone(),
        };
        let plaintext = ser::serialize(&inner)?;
        let recipient_keypair = CryptoKeypair::from(receiver.box_public_key().clone());
        let sealed = recipient_keypair.seal(rng, sender.crypto_keypair(), &plaintext)?;
        let nonce = match sealed.nonce() {
            CryptoKeypairNonce::Curve25519XChaCha20Poly1305(nonce) => nonce.clone(),
        };
        let ciphertext = sealed.ciphertext().clone();
        let signature = sender.sign(&Self::signable(&ciphertext, &nonce, &created_at, receiver.address()))?;
        Ok(Self {
            message: ciphertext,
            nonce,
            created_at,
            sender_address: sender.address().clone(),
            receiver_address: receiver.address().clone(),
            sender_box_public_key: Some(sender.crypto_keypair().public()),
            message_id: Some(MessageId::random()),
            signature,
        })
    }

    /// The bytes a sender signs.
    fn signable(ciphertext: &[u8], nonce: &Binary<24>, created_at: &Timestamp, receiver: &Address) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ciphertext.len() + 24 + 64);
        bytes.extend_from_slice(ciphertext);
        bytes.extend_from_slice(nonce.as_ref());
        bytes.extend_from_slice(created_at.to_rfc3339().as_bytes());
        bytes.extend_from_slice(receiver.as_bytes());
        bytes
    }

    /// Open this envelope. `sender` is whoever we believe sent it: a known
    /// contact, or an unregistered placeholder built from the envelope's own
    /// sender box key.
    ///
    /// Checks run in order: the box must open, the plaintext must parse into a
    /// known body, the inner addressing must match the outer, and the
    /// signature must verify against the sender's address.
    pub fn decrypt(&self, receiver: &Identity, sender: Contact) -> Result<DecryptedMessage> {
        let sealed = CryptoKeypairMessage::new(CryptoKeypairNonce::Curve25519XChaCha20Poly1305(self.nonce.clone()), self.message.clone());
        let plaintext = receiver
            .crypto_keypair()
            .open(sender.public_identity().box_public_key(), &sealed)?;
        let inner: InnerPayload<Value> = serde_json::from_slice(&plaintext).map_err(|e| Error::MessageParse(e.to_string()))?;
        let body = MessageBody::from_value(inner.body)?;
        if inner.sender_address != self.sender_address
            || inner.receiver_address != self.receiver_address
            || inner.created_at != self.created_at
            || sender.address() != &self.sender_address
        {
            Err(Error::MessageSpoofedSender)?;
        }
        self.sender_address
            .verify(&self.signature, &Self::signable(&self.message, &self.nonce, &self.created_at, &self.receiver_address))
            .map_err(|_| Error::MessageSpoofedSender)?;
        Ok(DecryptedMessage::new(
            self.message_id.clone().unwrap_or_else(MessageId::random),
            body,
            self.created_at.clone(),
            self.sender_address.clone(),
            self.receiver_address.clone(),
            self.clone(),
            sender,
        ))
    }

    /// Give this envelope the id the messaging service knows it by.
    pub fn with_message_id(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }
}

/// Make sure whoever sent a message is the owner of the claims inside of it.
/// Stops someone from forwarding another person's request for attestation (or
/// attested claims) as their own.
pub fn ensure_owner_is_sender(message: &DecryptedMessage) -> Result<()> {
    let sender = message.sender_address();
    let owned = match message.body() {
        MessageBody::RequestAttestationForClaim(req) => req.request_for_attestation().claim().owner() == sender,
        MessageBody::SubmitAttestationForClaim(attested) => attested.attestation().owner() == sender,
        MessageBody::SubmitClaimsForCTypes(attested_claims) => attested_claims.iter().all(|x| x.owner() == sender),
        _ => true,
    };
    if !owned {
        Err(Error::MessageSpoofedSender)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identity::{CTypeHash, PartialClaim},
        message::body::RequestAttestationForClaim,
        util::test,
    };

    fn body() -> MessageBody {
        MessageBody::RequestTerms(PartialClaim::new(CTypeHash::from("0xc7e5"), None, None))
    }

    #[test]
    fn envelope_round_trip() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let envelope = Envelope::encrypt(&mut rng, &body(), &sender, &receiver.public_identity()).unwrap();
        assert_eq!(envelope.sender_address(), sender.address());
        assert_eq!(envelope.receiver_address(), receiver.address());
        assert!(envelope.message_id().is_some());

        let decrypted = envelope.decrypt(&receiver, test::contact(&sender, "Butch")).unwrap();
        assert_eq!(decrypted.body(), &body());
        assert_eq!(decrypted.sender_address(), sender.address());
        assert_eq!(decrypted.message_id(), envelope.message_id().as_ref().unwrap());
        assert_eq!(decrypted.encrypted_message(), &envelope);
        assert_eq!(decrypted.sender().display_name(), "Butch");

        // survives the trip through json
        let json = serde_json::to_string(&envelope).unwrap();
        let envelope2: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope2, envelope);
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["senderBoxPublicKey"].as_str().unwrap().starts_with("0x"));
        assert!(value["receiverAddress"].is_string());
    }

    #[test]
    fn envelope_nonces_and_ids_are_unique() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let mut nonces = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..10 {
            let envelope = Envelope::encrypt(&mut rng, &body(), &sender, &receiver.public_identity()).unwrap();
            assert!(!nonces.contains(envelope.nonce()));
            assert!(!ids.contains(envelope.message_id()));
            nonces.push(envelope.nonce().clone());
            ids.push(envelope.message_id().clone());
        }
    }

    #[test]
    fn envelope_tampered_ciphertext() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let mut envelope = Envelope::encrypt(&mut rng, &body(), &sender, &receiver.public_identity()).unwrap();
        envelope.message_mut()[3] ^= 0x01;
        let res = envelope.decrypt(&receiver, test::contact(&sender, "Butch"));
        assert_eq!(res.err(), Some(Error::CryptoOpenFailed));
    }

    #[test]
    fn envelope_wrong_receiver() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let nosy = Identity::generate(&mut rng);
        let envelope = Envelope::encrypt(&mut rng, &body(), &sender, &receiver.public_identity()).unwrap();
        let res = envelope.decrypt(&nosy, test::contact(&sender, "Butch"));
        assert_eq!(res.err(), Some(Error::CryptoOpenFailed));
    }

    #[test]
    fn envelope_swapped_addressing() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let impostor = Identity::generate(&mut rng);
        let mut envelope = Envelope::encrypt(&mut rng, &body(), &sender, &receiver.public_identity()).unwrap();
        // claim the message came from someone else, but keep the real box key
        envelope.sender_address = impostor.address().clone();
        let contact = Contact::unregistered(impostor.address().clone(), sender.crypto_keypair().public());
        let res = envelope.decrypt(&receiver, contact);
        assert_eq!(res.err(), Some(Error::MessageSpoofedSender));
    }

    #[test]
    fn envelope_bad_signature() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let mut envelope = Envelope::encrypt(&mut rng, &body(), &sender, &receiver.public_identity()).unwrap();
        envelope.signature = sender.sign(b"something else entirely").unwrap();
        let res = envelope.decrypt(&receiver, test::contact(&sender, "Butch"));
        assert_eq!(res.err(), Some(Error::MessageSpoofedSender));
    }

    #[test]
    fn envelope_unknown_body_type() {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let raw = serde_json::json!({"type": "request-pizza", "content": {}});
        let envelope = Envelope::seal(&mut rng, &raw, &sender, &receiver.public_identity()).unwrap();
        let res = envelope.decrypt(&receiver, test::contact(&sender, "Butch"));
        assert!(matches!(res, Err(Error::MessageParse(_))));
    }

    #[test]
    fn envelope_ensure_owner_is_sender() {
        let mut rng = test::rng();
        let claimer = Identity::generate(&mut rng);
        let forwarder = Identity::generate(&mut rng);
        let attester = Identity::generate(&mut rng);
        let attested = test::attested_claim(&claimer, &attester, "0xc7e5");
        let body = MessageBody::RequestAttestationForClaim(RequestAttestationForClaim::new(attested.request().clone()));

        let honest = Envelope::encrypt(&mut rng, &body, &claimer, &attester.public_identity())
            .unwrap()
            .decrypt(&attester, test::contact(&claimer, "Jerry"))
            .unwrap();
        ensure_owner_is_sender(&honest).unwrap();

        let forwarded = Envelope::encrypt(&mut rng, &body, &forwarder, &attester.public_identity())
            .unwrap()
            .decrypt(&attester, test::contact(&forwarder, "Butch"))
            .unwrap();
        assert_eq!(ensure_owner_is_sender(&forwarded), Err(Error::MessageSpoofedSender));

        let submit = MessageBody::SubmitClaimsForCTypes(vec![attested.clone()]);
        let forwarded = Envelope::encrypt(&mut rng, &submit, &forwarder, &attester.public_identity())
            .unwrap()
            .decrypt(&attester, test::contact(&forwarder, "Butch"))
            .unwrap();
        assert_eq!(ensure_owner_is_sender(&forwarded), Err(Error::MessageSpoofedSender));

        // attestations are owned by the attester
        let submit = MessageBody::SubmitAttestationForClaim(attested);
        let from_attester = Envelope::encrypt(&mut rng, &submit, &attester, &claimer.public_identity())
            .unwrap()
            .decrypt(&claimer, test::contact(&attester, "Notary"))
            .unwrap();
        ensure_owner_is_sender(&from_attester).unwrap();
    }
}
