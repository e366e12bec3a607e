//! Participant name interning.
//!
//! Ledgers live in a `Vec` indexed by participant id, so every name lookup on
//! the search hot path is one hash probe followed by an index.

use rustc_hash::FxHashMap;

/// Interned participant id (index into the calendar's ledger vector).
pub type ParticipantId = u32;

/// Bidirectional map between participant names and dense integer ids.
#[derive(Debug, Clone)]
pub struct ParticipantInterner {
    to_int: FxHashMap<String, ParticipantId>,
    from_int: Vec<String>,
}

impl ParticipantInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_int: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_int: Vec::with_capacity(capacity),
        }
    }

    /// Intern a name, returning its id and whether it was newly added.
    pub fn intern(&mut self, name: &str) -> (ParticipantId, bool) {
        if let Some(&id) = self.to_int.get(name) {
            return (id, false);
        }
        let id = self.from_int.len() as ParticipantId;
        self.from_int.push(name.to_string());
        self.to_int.insert(name.to_string(), id);
        (id, true)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<ParticipantId> {
        self.to_int.get(name).copied()
    }

    #[inline]
    pub fn resolve(&self, id: ParticipantId) -> Option<&str> {
        self.from_int.get(id as usize).map(|s| s.as_str())
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.from_int.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.from_int.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_int.is_empty()
    }
}

impl Default for ParticipantInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
