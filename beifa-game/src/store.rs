//! In-memory session store.
//!
//! Sessions are kept as serialized JSON snapshots, so every `get` hands out an
//! independent copy and a failed operation that never calls `save` leaves the
//! stored snapshot untouched.

use std::cell::RefCell;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::SessionStore;
use crate::session::GameSession;

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("session `{0}` already exists")]
    Duplicate(String),
    #[error("session `{0}` was never created")]
    Missing(String),
    #[error("session snapshot is corrupt: {0}")]
    Snapshot(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.borrow().is_empty()
    }
}

impl SessionStore for MemoryStore {
    type Error = MemoryStoreError;

    fn create(&self, session: &GameSession) -> Result<(), Self::Error> {
        let id = session.game_id().to_string();
        if self.snapshots.borrow().contains_key(&id) {
            return Err(MemoryStoreError::Duplicate(id));
        }
        let snapshot = serde_json::to_string(session)?;
        self.snapshots.borrow_mut().insert(id, snapshot);
        Ok(())
    }

    fn get(&self, game_id: &str) -> Result<Option<GameSession>, Self::Error> {
        self.snapshots
            .borrow()
            .get(game_id)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(Into::into)
    }

    fn save(&self, session: &GameSession) -> Result<(), Self::Error> {
        let id = session.game_id();
        let snapshot = serde_json::to_string(session)?;
        match self.snapshots.borrow_mut().get_mut(id) {
            Some(slot) => {
                *slot = snapshot;
                Ok(())
            }
            None => Err(MemoryStoreError::Missing(id.to_string())),
        }
    }

    fn reset(&self, game_id: Option<&str>) -> Result<(), Self::Error> {
        let mut snapshots = self.snapshots.borrow_mut();
        match game_id {
            Some(id) => {
                snapshots.remove(id);
            }
            None => snapshots.clear(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_hands_out_independent_copies() {
        let store = MemoryStore::new();
        let session = GameSession::new("m-1", 4);
        store.create(&session).unwrap();

        let mut checked_out = store.get("m-1").unwrap().unwrap();
        checked_out.state.food = 1;
        let fresh = store.get("m-1").unwrap().unwrap();
        assert_eq!(fresh.state.food, session.state.food);

        store.save(&checked_out).unwrap();
        assert_eq!(store.get("m-1").unwrap().unwrap().state.food, 1);
    }

    #[test]
    fn create_and_save_enforce_lifecycle() {
        let store = MemoryStore::new();
        let session = GameSession::new("m-2", 4);
        assert!(matches!(
            store.save(&session),
            Err(MemoryStoreError::Missing(_))
        ));
        store.create(&session).unwrap();
        assert!(matches!(
            store.create(&session),
            Err(MemoryStoreError::Duplicate(_))
        ));
    }

    #[test]
    fn reset_drops_one_or_all() {
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store.create(&GameSession::new(id, 1)).unwrap();
        }
        store.reset(Some("b")).unwrap();
        assert!(store.get("b").unwrap().is_none());
        assert_eq!(store.len(), 2);
        store.reset(None).unwrap();
        assert!(store.is_empty());
    }
}
