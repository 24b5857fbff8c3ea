//! Structural interning for shared, immutable descriptors.
//!
//! Values are deduplicated by key equality and handed out as `Arc`s, so two
//! renderings asking for the same time samples share one set. Eviction is
//! least-recently-used with a fixed capacity: identity is only preserved
//! while an entry stays resident, after eviction the next request builds a
//! fresh value (equal, but not `Arc::ptr_eq` to the old one).

use crate::core::data::domain_set::{DomainSetError, Gridded1DSet};
use crate::core::data::unit::Unit;
use crate::core::sync::lock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock};

const DEFAULT_DOMAIN_CACHE_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct InternTable<K, V> {
    capacity: usize,
    clock: u64,
    entries: HashMap<K, (Arc<V>, u64)>,
}

impl<K: Eq + Hash + Clone, V> InternTable<K, V> {
    /// A capacity of zero is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: 0,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        make: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        self.clock += 1;
        let now = self.clock;

        if let Some((value, last_used)) = self.entries.get_mut(&key) {
            *last_used = now;
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(make()?);
        if self.entries.len() >= self.capacity {
            self.evict_least_recent();
        }
        self.entries.insert(key, (Arc::clone(&value), now));

        Ok(value)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(key, _)| key.clone());

        if let Some(oldest) = oldest {
            self.entries.remove(&oldest);
        }
    }
}

/// Sample bits plus the full unit definition: floats hash by representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainKey {
    sample_bits: Vec<u64>,
    unit: Option<(String, String, u64, u64)>,
}

impl DomainKey {
    #[must_use]
    pub fn new(samples: &[f64], unit: Option<&Unit>) -> Self {
        Self {
            sample_bits: samples.iter().map(|s| s.to_bits()).collect(),
            unit: unit.map(Unit::structural_key),
        }
    }
}

/// Shared cache of gridded domain sets.
#[derive(Debug)]
pub struct DomainSetCache {
    table: Mutex<InternTable<DomainKey, Gridded1DSet>>,
}

impl DomainSetCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            table: Mutex::new(InternTable::new(capacity)),
        }
    }

    /// Process-wide instance.
    pub fn global() -> &'static DomainSetCache {
        static GLOBAL: OnceLock<DomainSetCache> = OnceLock::new();
        GLOBAL.get_or_init(|| DomainSetCache::new(DEFAULT_DOMAIN_CACHE_CAPACITY))
    }

    pub fn gridded(
        &self,
        samples: Vec<f64>,
        unit: Option<Unit>,
    ) -> Result<Arc<Gridded1DSet>, DomainSetError> {
        let key = DomainKey::new(&samples, unit.as_ref());
        lock(&self.table).get_or_try_insert_with(key, || Gridded1DSet::new(samples, unit))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.table).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.table).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::domain_set::DomainSet;
    use std::convert::Infallible;

    fn insert(table: &mut InternTable<u32, String>, key: u32) -> Arc<String> {
        table
            .get_or_try_insert_with(key, || Ok::<_, Infallible>(format!("v{key}")))
            .unwrap()
    }

    #[test]
    fn equal_keys_share_one_value() {
        let mut table = InternTable::new(4);

        let a = insert(&mut table, 1);
        let b = insert(&mut table, 1);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let mut table = InternTable::new(2);

        insert(&mut table, 1);
        insert(&mut table, 2);
        insert(&mut table, 1); // 2 is now the oldest
        insert(&mut table, 3);

        assert!(table.contains(&1));
        assert!(!table.contains(&2));
        assert!(table.contains(&3));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn evicted_keys_get_fresh_values() {
        let mut table = InternTable::new(1);

        let first = insert(&mut table, 1);
        insert(&mut table, 2);
        let again = insert(&mut table, 1);

        assert_eq!(first, again);
        assert!(!Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn failed_construction_is_not_cached() {
        let mut table: InternTable<u32, String> = InternTable::new(2);

        let result = table.get_or_try_insert_with(7, || Err("nope"));

        assert_eq!(result, Err("nope"));
        assert!(table.is_empty());
    }

    #[test]
    fn domain_cache_dedupes_structurally_equal_sets() {
        let cache = DomainSetCache::new(8);
        let seconds = Unit::base("s");

        let a = cache.gridded(vec![0.0, 60.0, 120.0], Some(seconds.clone())).unwrap();
        let b = cache.gridded(vec![0.0, 60.0, 120.0], Some(seconds)).unwrap();
        let c = cache.gridded(vec![0.0, 60.0, 120.0], None).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn units_sharing_a_symbol_do_not_share_a_set() {
        let cache = DomainSetCache::new(8);
        let seconds = Unit::base("s");
        let minutes = Unit::scaled("t", &seconds, 60.0);
        let hours = Unit::scaled("t", &seconds, 3600.0);

        let a = cache.gridded(vec![0.0, 1.0, 2.0], Some(minutes.clone())).unwrap();
        let b = cache.gridded(vec![0.0, 1.0, 2.0], Some(hours.clone())).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.unit(), Some(&minutes));
        assert_eq!(b.unit(), Some(&hours));
        let two_hours = seconds.convert(7200.0, b.unit().unwrap()).unwrap();
        assert!((two_hours - 2.0).abs() < 1e-9);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn domain_cache_propagates_validation_errors() {
        let cache = DomainSetCache::new(8);

        assert_eq!(
            cache.gridded(vec![], None).unwrap_err(),
            DomainSetError::Empty
        );
        assert!(cache.is_empty());
    }
}
