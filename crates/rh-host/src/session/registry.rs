//! Registry of live sessions, indexed by port

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use rh_core::HostError;

use super::SessionState;

/// Tracks every session whose listener is still bound
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<u16, Arc<SessionState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly bound session. Fails if the port is already live.
    pub fn register(&self, state: Arc<SessionState>) -> Result<(), HostError> {
        match self.sessions.entry(state.port()) {
            Entry::Occupied(_) => Err(HostError::PortInUse(state.port())),
            Entry::Vacant(slot) => {
                slot.insert(state);
                Ok(())
            }
        }
    }

    /// Remove `state`, leaving any other session on the same port alone
    pub fn deregister(&self, state: &Arc<SessionState>) -> bool {
        self.sessions
            .remove_if(&state.port(), |_, live| Arc::ptr_eq(live, state))
            .is_some()
    }

    /// Look up a live session
    pub fn get(&self, port: u16) -> Option<Arc<SessionState>> {
        self.sessions.get(&port).map(|r| Arc::clone(&r))
    }

    /// Ports of all live sessions, ascending
    pub fn ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.sessions.iter().map(|r| *r.key()).collect();
        ports.sort_unstable();
        ports
    }

    /// Ask every live session to close; returns how many were asked
    pub fn close_all(&self) -> usize {
        self.sessions
            .iter()
            .filter(|r| r.value().listening().close())
            .count()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = SessionRegistry::new();
        registry.register(Arc::new(SessionState::new(3001, 0))).unwrap();
        registry.register(Arc::new(SessionState::new(3003, 4))).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ports(), vec![3001, 3003]);
        assert!(registry.get(3003).is_some());
        assert!(registry.get(3002).is_none());
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let registry = SessionRegistry::new();
        registry.register(Arc::new(SessionState::new(3001, 0))).unwrap();

        let err = registry
            .register(Arc::new(SessionState::new(3001, 0)))
            .unwrap_err();
        assert!(matches!(err, HostError::PortInUse(3001)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_only_matching_session() {
        let registry = SessionRegistry::new();
        let live = Arc::new(SessionState::new(3001, 0));
        let stale = Arc::new(SessionState::new(3001, 0));
        registry.register(Arc::clone(&live)).unwrap();

        assert!(!registry.deregister(&stale));
        assert_eq!(registry.len(), 1);

        assert!(registry.deregister(&live));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_close_all() {
        let registry = SessionRegistry::new();
        let a = Arc::new(SessionState::new(3001, 0));
        let b = Arc::new(SessionState::new(3002, 0));
        registry.register(Arc::clone(&a)).unwrap();
        registry.register(Arc::clone(&b)).unwrap();
        b.listening().close();

        assert_eq!(registry.close_all(), 1);
        assert!(a.listening().is_closed());
    }
}
