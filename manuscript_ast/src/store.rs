use crate::Manuscript;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read access to stored manuscripts.
///
/// An export fetches its manuscript exactly once, so it works from a snapshot
/// and never observes edits made while it runs.
pub trait ManuscriptStore: Send + Sync {
    /// A copy of the manuscript stored under `id`, if there is one
    fn fetch(&self, id: &str) -> Option<Manuscript>;
}

/// A manuscript store held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    manuscripts: RwLock<HashMap<String, Manuscript>>,
}

impl MemoryStore {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a manuscript, keyed by its id
    pub fn save(&self, manuscript: Manuscript) {
        self.manuscripts
            .write()
            .insert(manuscript.id.clone(), manuscript);
    }

    /// Fetch the manuscript stored under `id`, creating one with default settings
    /// if nothing is stored there yet
    pub fn get_or_create(&self, id: &str) -> Manuscript {
        if let Some(found) = self.fetch(id) {
            return found;
        }
        self.manuscripts
            .write()
            .entry(id.to_string())
            .or_insert_with(|| Manuscript::new(id))
            .clone()
    }

    /// Remove a manuscript, returning it if it was stored
    pub fn remove(&self, id: &str) -> Option<Manuscript> {
        self.manuscripts.write().remove(id)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.manuscripts.read().len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.manuscripts.read().is_empty()
    }
}

impl ManuscriptStore for MemoryStore {
    fn fetch(&self, id: &str) -> Option<Manuscript> {
        self.manuscripts.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManuscriptBody;

    #[test]
    fn get_or_create_uses_defaults_once() {
        let store = MemoryStore::new();
        assert!(store.fetch("m1").is_none());
        let created = store.get_or_create("m1");
        assert_eq!(created.title, "Untitled Manuscript");
        assert_eq!(store.len(), 1);

        let mut edited = created;
        edited.title = "Edited".into();
        store.save(edited);
        assert_eq!(store.get_or_create("m1").title, "Edited");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fetch_returns_a_snapshot() {
        let store = MemoryStore::new();
        let mut m = Manuscript::new("m1");
        m.body = ManuscriptBody::Continuous("before".into());
        store.save(m);

        let snapshot = store.fetch("m1").unwrap();
        let mut later = store.fetch("m1").unwrap();
        later.body = ManuscriptBody::Continuous("after".into());
        store.save(later);

        assert_eq!(snapshot.body_text(), "before");
        assert_eq!(store.fetch("m1").unwrap().body_text(), "after");
        assert!(store.remove("m1").is_some());
        assert!(store.is_empty());
    }
}
