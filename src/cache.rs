// src/cache.rs
//! In-process response cache keyed by the raw query string, absolute TTL.

use metrics::counter;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    inner: Mutex<HashMap<String, (Instant, Value)>>,
}

impl ResponseCache {
    /// A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Instant, Value)>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        let mut map = self.lock();
        let fresh = map.get(key).map(|(stored, _)| stored.elapsed() < self.ttl);
        let hit = match fresh {
            Some(true) => map.get(key).map(|(_, v)| v.clone()),
            Some(false) => {
                map.remove(key);
                None
            }
            None => None,
        };
        if hit.is_some() {
            counter!("response_cache_hits_total").increment(1);
        } else {
            counter!("response_cache_misses_total").increment(1);
        }
        hit
    }

    pub fn put(&self, key: impl Into<String>, value: Value) {
        if !self.is_enabled() {
            return;
        }
        let mut map = self.lock();
        map.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        map.insert(key.into(), (Instant::now(), value));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
