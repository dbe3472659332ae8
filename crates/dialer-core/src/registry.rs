//! Numbers already dialed in the current list session
//!
//! A number lands in the registry after a confirmed call or an explicit skip.
//! Its presence means "do not offer this contact again", whatever the call
//! outcome was. The registry is cleared whenever the selected campaign or list
//! changes.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalledRegistry {
    numbers: HashSet<String>,
}

impl CalledRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `number` as called.
    ///
    /// Returns `false` if it was already present; marking twice is the same as
    /// marking once.
    pub fn mark_called(&mut self, number: &str) -> bool {
        let number = number.trim();
        if self.numbers.contains(number) {
            return false;
        }
        self.numbers.insert(number.to_string())
    }

    pub fn contains(&self, number: &str) -> bool {
        self.numbers.contains(number.trim())
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }

    pub fn numbers(&self) -> impl Iterator<Item = &str> {
        self.numbers.iter().map(String::as_str)
    }
}
