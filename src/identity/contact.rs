//! Contacts are other people's public identities, plus whatever we know about
//! them.

use crate::{
    crypto::base::CryptoKeypairPublic,
    identity::identity::{Address, PublicIdentity},
    util::Timestamp,
};
use serde_derive::{Deserialize, Serialize};

fn is_false(val: &bool) -> bool {
    !*val
}

/// What we know about a contact beyond their keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct ContactMetadata {
    /// Display name. May be empty.
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_by: Option<Address>,
    /// Set on placeholder contacts we made up for senders we've never heard
    /// of. These are the lowest trust level and stay that way until a user
    /// adds them for real.
    #[serde(default, skip_serializing_if = "is_false")]
    unregistered: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    favorite: bool,
}

impl ContactMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Record who added this contact and when.
    pub fn added(mut self, added_by: Address, added_at: Timestamp) -> Self {
        self.added_by = Some(added_by);
        self.added_at = Some(added_at);
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

/// A contact: someone we can send messages to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "metaData")]
    metadata: ContactMetadata,
    public_identity: PublicIdentity,
}

impl Contact {
    pub fn new(metadata: ContactMetadata, public_identity: PublicIdentity) -> Self {
        Self { metadata, public_identity }
    }

    /// Wrap a bare public identity in a nameless contact.
    pub fn from_public_identity(public_identity: PublicIdentity) -> Self {
        Self::new(ContactMetadata::default(), public_identity)
    }

    /// Make a placeholder for a sender who isn't in our contact list, using the
    /// box key they included in their envelope.
    pub fn unregistered(address: Address, box_public_key: CryptoKeypairPublic) -> Self {
        let metadata = ContactMetadata {
            unregistered: true,
            ..ContactMetadata::default()
        };
        Self::new(metadata, PublicIdentity::new(address, box_public_key, None))
    }

    pub fn address(&self) -> &Address {
        self.public_identity.address()
    }

    pub fn is_unregistered(&self) -> bool {
        self.metadata.unregistered
    }

    /// The name to show people: the contact's name, or their address if they
    /// don't have one.
    pub fn display_name(&self) -> &str {
        if self.metadata.name.is_empty() {
            self.address().as_str()
        } else {
            self.metadata.name.as_str()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[test]
    fn contact_display_name() {
        let identity = Identity::from_phrase("hot fudge sundae").unwrap();
        let named = Contact::new(ContactMetadata::new("Butch"), identity.public_identity());
        assert_eq!(named.display_name(), "Butch");
        let nameless = Contact::from_public_identity(identity.public_identity());
        assert_eq!(nameless.display_name(), identity.address().as_str());
        assert!(!nameless.is_unregistered());
    }

    #[test]
    fn contact_unregistered_serde() {
        let identity = Identity::from_phrase("hot fudge sundae").unwrap();
        let contact = Contact::unregistered(identity.address().clone(), identity.crypto_keypair().public());
        assert!(contact.is_unregistered());
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["metaData"]["unregistered"], serde_json::Value::Bool(true));
        assert_eq!(json["metaData"]["name"], serde_json::Value::String(String::new()));
        assert!(json["metaData"].get("favorite").is_none());
        let contact2: Contact = serde_json::from_value(json).unwrap();
        assert_eq!(contact, contact2);
    }

    #[test]
    fn contact_metadata_added_favorite() {
        let me = Identity::from_phrase("gimme the loot").unwrap();
        let now = Timestamp::now();
        let metadata = ContactMetadata::new("Marsellus").added(me.address().clone(), now.clone()).with_favorite(true);
        assert_eq!(metadata.added_by(), &Some(me.address().clone()));
        assert_eq!(metadata.added_at(), &Some(now));
        assert!(*metadata.favorite());

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["addedBy"], serde_json::Value::String(me.address().to_string()));
        assert_eq!(json["favorite"], serde_json::Value::Bool(true));
        assert!(json.get("unregistered").is_none());
        let metadata2: ContactMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(metadata, metadata2);
        assert!(!*ContactMetadata::new("Marsellus").with_favorite(false).favorite());
    }
}
