//! Connected-player roster, keyed by client id.
//!
//! Records stay in join order; an id index makes lookups constant time.

use std::collections::HashMap;

use sandlink_shared::Client;

/// Clients currently in the session, in join order.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    clients: Vec<Client>,
    /// Client id -> slot in `clients`.
    index: HashMap<String, usize>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clients.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if nobody is connected.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Looks up a client by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Client> {
        self.index.get(id).map(|&slot| &self.clients[slot])
    }

    /// Iterates in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    /// Inserts or replaces by id. Returns the previous record.
    pub fn upsert(&mut self, client: Client) -> Option<Client> {
        if let Some(&slot) = self.index.get(&client.id) {
            return Some(std::mem::replace(&mut self.clients[slot], client));
        }
        self.index.insert(client.id.clone(), self.clients.len());
        self.clients.push(client);
        None
    }

    /// Removes by id. Later joiners shift down one slot.
    pub fn remove(&mut self, id: &str) -> Option<Client> {
        let slot = self.index.remove(id)?;
        let client = self.clients.remove(slot);
        for later in &self.clients[slot..] {
            if let Some(i) = self.index.get_mut(&later.id) {
                *i -= 1;
            }
        }
        Some(client)
    }

    /// Replaces the whole roster. A repeated id keeps its last record.
    pub fn reset(&mut self, clients: Vec<Client>) {
        self.clear();
        for client in clients {
            self.upsert(client);
        }
    }

    /// Removes everyone.
    pub fn clear(&mut self) {
        self.clients.clear();
        self.index.clear();
    }

    /// Snapshot of the roster.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Client> {
        self.clients.clone()
    }
}
