//! Looking up who's who. The contact list lives somewhere else (wallet
//! storage, usually) and we only ever read from it.

use crate::{
    error::Result,
    identity::{Address, Contact},
};
use async_trait::async_trait;
use std::sync::RwLock;

/// Finds contacts.
#[async_trait]
pub trait ContactResolver: Send + Sync {
    /// Look up a contact by address from whatever is already loaded.
    fn find_by_address(&self, address: &Address) -> Option<Contact>;

    /// Load every contact we know about.
    async fn find_all(&self) -> Result<Vec<Contact>>;
}

/// A contact list that lives in memory.
#[derive(Debug, Default)]
pub struct MemoryContacts {
    contacts: RwLock<Vec<Contact>>,
}

impl MemoryContacts {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: RwLock::new(contacts),
        }
    }

    /// Add a contact, replacing any existing one with the same address.
    pub fn upsert(&self, contact: Contact) {
        let mut guard = self.contacts.write().unwrap_or_else(|e| e.into_inner());
        match guard.iter_mut().find(|x| x.address() == contact.address()) {
            Some(existing) => *existing = contact,
            None => guard.push(contact),
        }
    }

    pub fn remove(&self, address: &Address) -> Option<Contact> {
        let mut guard = self.contacts.write().unwrap_or_else(|e| e.into_inner());
        let idx = guard.iter().position(|x| x.address() == address)?;
        Some(guard.remove(idx))
    }
}

#[async_trait]
impl ContactResolver for MemoryContacts {
    fn find_by_address(&self, address: &Address) -> Option<Contact> {
        let guard = self.contacts.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().find(|x| x.address() == address).cloned()
    }

    async fn find_all(&self) -> Result<Vec<Contact>> {
        let guard = self.contacts.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }
}
