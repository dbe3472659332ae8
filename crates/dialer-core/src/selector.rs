//! Next-contact selection
//!
//! Contacts are offered strictly in the order the server returned them. A
//! contact is dialable when it has a (non-blank) phone number, is not
//! blacklisted, and its number is not in the [`CalledRegistry`]. Selection has
//! no hidden state: as the registry grows the candidate set only shrinks.

use crate::api::model::Contact;
use crate::registry::CalledRegistry;

pub struct ContactSelector;

impl ContactSelector {
    /// First dialable contact, or `None` when the queue is exhausted
    pub fn next<'a>(contacts: &'a [Contact], registry: &CalledRegistry) -> Option<&'a Contact> {
        contacts.iter().find(|contact| Self::is_dialable(contact, registry))
    }

    /// How many dialable contacts are left
    pub fn remaining(contacts: &[Contact], registry: &CalledRegistry) -> usize {
        contacts.iter().filter(|contact| Self::is_dialable(contact, registry)).count()
    }

    pub fn is_dialable(contact: &Contact, registry: &CalledRegistry) -> bool {
        match contact.phone_number() {
            Some(number) => !contact.is_blacklisted() && !registry.contains(number),
            None => false,
        }
    }
}
