//! Source-address allow-list.

use std::collections::HashSet;

/// An immutable set of client addresses exempt from the allow-list denial.
///
/// Built once from configuration; membership is checked before any window
/// accounting so non-members never consume rate-limit capacity. Members are
/// exempt from the allow-list denial only, not from rate limiting.
#[derive(Debug, Clone)]
pub struct AllowList {
    clients: HashSet<String>,
}

impl AllowList {
    /// Build an allow-list from configured client addresses.
    ///
    /// Addresses are trimmed so whitespace in hand-edited config files does
    /// not silently exclude a client.
    pub fn new<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            clients: clients
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Whether the given client address is a member.
    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains(client_id)
    }

    /// Number of configured addresses.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
