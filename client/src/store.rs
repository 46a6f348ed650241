//! Client-side token storage
//!
//! The agent is the only writer. The trait seam exists so callers in
//! other environments (a desktop shell keychain, a test double) can
//! substitute their own persistence without touching the agent.

use std::sync::RwLock;

/// The current access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Explicit get/set/clear ownership of session state.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<TokenPair>;
    fn set(&self, pair: TokenPair);
    fn clear(&self);
}

/// In-memory store, the default for a single-process client.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<TokenPair> {
        self.inner.read().expect("token store lock poisoned").clone()
    }

    fn set(&self, pair: TokenPair) {
        *self.inner.write().expect("token store lock poisoned") = Some(pair);
    }

    fn clear(&self) {
        *self.inner.write().expect("token store lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);

        let pair = TokenPair {
            access: "a".into(),
            refresh: "r".into(),
        };
        store.set(pair.clone());
        assert_eq!(store.get(), Some(pair));

        store.clear();
        assert_eq!(store.get(), None);
    }
}
