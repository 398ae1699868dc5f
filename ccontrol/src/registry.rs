//! The czar process's in-memory map of in-flight [`UserQuery`] sessions,
//! keyed by `(czarId, queryId)`. Entries are weak references — a session
//! stays alive only as long as something (the dispatch task driving it,
//! or a caller mid-`join`) holds the strong [`Arc`], matching the
//! weak-referenced job maps the lifecycle manager keeps for chunk state.

use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::Mutex;
use qmeta_types::{CzarId, QueryId};

use crate::session::UserQuery;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<(CzarId, QueryId), Weak<UserQuery>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, czar_id: CzarId, query_id: QueryId, session: &Arc<UserQuery>) {
        self.sessions
            .lock()
            .insert((czar_id, query_id), Arc::downgrade(session));
    }

    /// Upgrades the entry for `(czar_id, query_id)`, if its session is
    /// still alive.
    pub fn get(&self, czar_id: CzarId, query_id: QueryId) -> Option<Arc<UserQuery>> {
        self.sessions.lock().get(&(czar_id, query_id))?.upgrade()
    }

    /// Drops every entry whose session has already been dropped. Called on
    /// every `submit`/`kill`, per the weak-map lifetime this registry
    /// implements.
    pub fn prune_expired(&self) {
        self.sessions.lock().retain(|_, weak| weak.strong_count() > 0);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::bare_session;

    #[test]
    fn upgrade_fails_once_the_strong_ref_is_dropped() {
        let registry = SessionRegistry::new();
        let czar_id = CzarId::new(1);
        let query_id = QueryId::new(1);
        {
            let session = Arc::new(bare_session(query_id));
            registry.insert(czar_id, query_id, &session);
            assert!(registry.get(czar_id, query_id).is_some());
        }
        assert!(registry.get(czar_id, query_id).is_none());
    }

    #[test]
    fn prune_expired_drops_dead_entries() {
        let registry = SessionRegistry::new();
        let czar_id = CzarId::new(1);
        let query_id = QueryId::new(7);
        {
            let session = Arc::new(bare_session(query_id));
            registry.insert(czar_id, query_id, &session);
        }
        assert_eq!(registry.len(), 1);
        registry.prune_expired();
        assert!(registry.is_empty());
    }
}
