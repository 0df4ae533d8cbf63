use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rephrase_parser::{DecomposerConfig, Decomposition};
use rephrase_protocol::OrderMapping;
use tracing::debug;

use crate::train::{train, training_version};

#[derive(Debug, Default)]
struct CacheState {
    mappings: HashMap<(String, u64), Arc<OrderMapping>>,
    /// Version served for each group.
    current: HashMap<String, u64>,
}

/// Order mappings keyed by (group, training-set version). Read-mostly:
/// lookups take the read lock, training and invalidation the write lock.
#[derive(Debug, Default)]
pub struct OrderCache {
    state: RwLock<CacheState>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `mapping` and makes it the current one for its group.
    pub fn insert(&self, mapping: OrderMapping) -> Arc<OrderMapping> {
        let mapping = Arc::new(mapping);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.current.insert(mapping.group.clone(), mapping.version);
        state
            .mappings
            .insert((mapping.group.clone(), mapping.version), mapping.clone());
        mapping
    }

    pub fn get(&self, group: &str, version: u64) -> Option<Arc<OrderMapping>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.mappings.get(&(group.to_string(), version)).cloned()
    }

    pub fn current(&self, group: &str) -> Option<Arc<OrderMapping>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let version = *state.current.get(group)?;
        state.mappings.get(&(group.to_string(), version)).cloned()
    }

    /// Returns the mapping for this exact training set, training it on a
    /// miss. Either way it becomes the group's current mapping.
    pub fn get_or_train(&self, group: &str, config: &DecomposerConfig, examples: &[Decomposition]) -> Arc<OrderMapping> {
        let version = training_version(group, config, examples);
        if let Some(mapping) = self.get(group, version) {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.current.insert(group.to_string(), version);
            return mapping;
        }
        debug!(group, version, "training order mapping");
        self.insert(train(group, config, examples))
    }

    /// Forgets every version of `group`; returns how many were dropped.
    pub fn invalidate(&self, group: &str) -> usize {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.current.remove(group);
        let before = state.mappings.len();
        state.mappings.retain(|(g, _), _| g != group);
        before - state.mappings.len()
    }

    /// Drops the cached mapping and trains again from `examples`.
    pub fn rebuild(&self, group: &str, config: &DecomposerConfig, examples: &[Decomposition]) -> Arc<OrderMapping> {
        self.invalidate(group);
        self.insert(train(group, config, examples))
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.mappings.clear();
        state.current.clear();
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every cached mapping, sorted by group then version.
    pub fn snapshot(&self) -> Vec<OrderMapping> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<OrderMapping> = state.mappings.values().map(|m| OrderMapping::clone(m)).collect();
        all.sort_by(|a, b| a.group.cmp(&b.group).then(a.version.cmp(&b.version)));
        all
    }
}
