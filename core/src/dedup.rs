//! In-flight request registry.
//!
//! A request claims its `InFlightKey` before dispatch and holds an
//! `InFlightGuard` until it settles. Dropping the guard releases the key, so
//! success, failure, timeout and a dropped caller future all free it.

use std::sync::Arc;

use dashmap::DashSet;

use crate::http::HttpMethod;

/// Identity of a logical request: method, resolved url and serialized body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    pub method: HttpMethod,
    pub url: String,
    pub payload: Option<String>,
}

impl InFlightKey {
    pub fn new(method: HttpMethod, url: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            method,
            url: url.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<DashSet<InFlightKey>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns `None` if it is already outstanding.
    pub fn try_claim(&self, key: InFlightKey) -> Option<InFlightGuard> {
        if self.keys.insert(key.clone()) {
            Some(InFlightGuard {
                keys: Arc::clone(&self.keys),
                key,
            })
        } else {
            None
        }
    }

    pub fn contains(&self, key: &InFlightKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<DashSet<InFlightKey>>,
    key: InFlightKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &InFlightKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}
