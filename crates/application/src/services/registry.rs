//! In-flight query tracking.
//!
//! Slots live in an arena and are addressed by generation-tagged tokens, so
//! a completion carrying the token of a previous occupant of a reused slot
//! is reported as not found instead of hitting the current query.

use crate::ports::QueryToken;
use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Cancelled,
}

struct Entry {
    state: EntryState,
    query: Query,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token the next [`Registry::insert`] will hand out.
    pub fn next_token(&self) -> QueryToken {
        let index = self.free.last().copied().unwrap_or(self.slots.len() as u32);
        let generation = self
            .slots
            .get(index as usize)
            .map(|slot| slot.generation)
            .unwrap_or(0);
        QueryToken { index, generation }
    }

    /// Tracks `query` as pending.
    pub fn insert(&mut self, query: Query) -> QueryToken {
        let entry = Entry {
            state: EntryState::Pending,
            query,
        };

        let token = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                QueryToken {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                QueryToken {
                    index,
                    generation: 0,
                }
            }
        };

        self.len += 1;
        token
    }

    #[cfg(test)]
    fn state(&self, token: QueryToken) -> Option<EntryState> {
        self.entry(token).map(|entry| entry.state)
    }

    /// Flips a pending entry to cancelled. Returns `false` for entries that
    /// are already cancelled or not tracked.
    pub fn cancel(&mut self, token: QueryToken) -> bool {
        match self.entry_mut(token) {
            Some(entry) if entry.state == EntryState::Pending => {
                entry.state = EntryState::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Forgets the entry for `token`. Removing an unknown or stale token is
    /// a no-op that returns `None`.
    pub fn remove(&mut self, token: QueryToken) -> Option<(EntryState, Query)> {
        let slot = self.slots.get_mut(token.index as usize)?;
        if slot.generation != token.generation {
            return None;
        }

        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(token.index);
        self.len -= 1;
        Some((entry.state, entry.query))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn entry(&self, token: QueryToken) -> Option<&Entry> {
        self.slots
            .get(token.index as usize)
            .filter(|slot| slot.generation == token.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, token: QueryToken) -> Option<&mut Entry> {
        self.slots
            .get_mut(token.index as usize)
            .filter(|slot| slot.generation == token.generation)
            .and_then(|slot| slot.entry.as_mut())
    }
}
