//! Process-wide read caches for thing lookups
//!
//! Each node kind has an id→entity and an id→exists cache, and all kinds
//! share one id→thing cache. Writes evict synchronously through
//! [`ThingCache::evict`]; nothing expires on its own.

use crate::graph::{Class, Literal, Predicate, Resource, Thing, ThingId, ThingKind};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache for one node kind
#[derive(Debug)]
pub struct EntityCache<T> {
    entities: DashMap<ThingId, T>,
    exists: DashMap<ThingId, bool>,
}

impl<T: Clone> EntityCache<T> {
    fn new() -> Self {
        Self {
            entities: DashMap::new(),
            exists: DashMap::new(),
        }
    }

    pub fn get(&self, id: &ThingId) -> Option<T> {
        self.entities.get(id).map(|e| e.value().clone())
    }

    pub fn put(&self, id: &ThingId, entity: &T) {
        self.entities.insert(id.clone(), entity.clone());
    }

    pub fn get_exists(&self, id: &ThingId) -> Option<bool> {
        self.exists.get(id).map(|e| *e.value())
    }

    pub fn put_exists(&self, id: &ThingId, exists: bool) {
        self.exists.insert(id.clone(), exists);
    }

    fn evict(&self, id: &ThingId) {
        self.entities.remove(id);
        self.exists.remove(id);
    }

    fn clear(&self) {
        self.entities.clear();
        self.exists.clear();
    }
}

/// Hit and miss counters
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Read caches shared by a store adapter
#[derive(Debug)]
pub struct ThingCache {
    enabled: bool,
    pub resources: EntityCache<Resource>,
    pub literals: EntityCache<Literal>,
    pub predicates: EntityCache<Predicate>,
    pub classes: EntityCache<Class>,
    things: DashMap<ThingId, Thing>,
    stats: CacheStats,
}

impl Default for ThingCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ThingCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            resources: EntityCache::new(),
            literals: EntityCache::new(),
            predicates: EntityCache::new(),
            classes: EntityCache::new(),
            things: DashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Look up through the cache, loading and remembering on a miss
    ///
    /// Only found entities are remembered.
    pub(crate) fn read_through<T, E>(
        &self,
        cache: &EntityCache<T>,
        id: &ThingId,
        load: impl FnOnce() -> Result<Option<T>, E>,
    ) -> Result<Option<T>, E>
    where
        T: Clone,
    {
        if self.enabled {
            if let Some(hit) = cache.get(id) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(hit));
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let loaded = load()?;
        if self.enabled {
            if let Some(entity) = &loaded {
                cache.put(id, entity);
            }
        }
        Ok(loaded)
    }

    pub(crate) fn exists_through<T, E>(
        &self,
        cache: &EntityCache<T>,
        id: &ThingId,
        load: impl FnOnce() -> Result<bool, E>,
    ) -> Result<bool, E>
    where
        T: Clone,
    {
        if self.enabled {
            if let Some(hit) = cache.get_exists(id) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(hit);
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let exists = load()?;
        if self.enabled {
            cache.put_exists(id, exists);
        }
        Ok(exists)
    }

    pub(crate) fn thing_through<E>(
        &self,
        id: &ThingId,
        load: impl FnOnce() -> Result<Option<Thing>, E>,
    ) -> Result<Option<Thing>, E> {
        if self.enabled {
            if let Some(hit) = self.things.get(id) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(hit.value().clone()));
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let loaded = load()?;
        if self.enabled {
            if let Some(thing) = &loaded {
                self.things.insert(id.clone(), thing.clone());
            }
        }
        Ok(loaded)
    }

    /// Evict one id from its kind cache and from the shared thing cache
    pub fn evict(&self, kind: ThingKind, id: &ThingId) {
        match kind {
            ThingKind::Resource => self.resources.evict(id),
            ThingKind::Literal => self.literals.evict(id),
            ThingKind::Predicate => self.predicates.evict(id),
            ThingKind::Class => self.classes.evict(id),
        }
        self.things.remove(id);
        tracing::trace!(%id, kind = kind.as_str(), "evicted from read cache");
    }

    pub fn clear(&self) {
        self.resources.clear();
        self.literals.clear();
        self.predicates.clear();
        self.classes.clear();
        self.things.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_through_loads_once() {
        let cache = ThingCache::default();
        let id = ThingId::new("R1");
        let mut loads = 0;
        for _ in 0..3 {
            let found: Result<_, ()> = cache.read_through(&cache.resources, &id, || {
                loads += 1;
                Ok(Some(Resource::new(id.clone(), "r")))
            });
            assert!(found.unwrap().is_some());
        }
        assert_eq!(loads, 1);
        assert_eq!(cache.stats().hits(), 2);
    }

    #[test]
    fn misses_are_not_remembered() {
        let cache = ThingCache::default();
        let id = ThingId::new("R1");
        let _: Result<_, ()> = cache.read_through(&cache.resources, &id, || Ok(None));
        assert!(cache.resources.get(&id).is_none());
    }

    #[test]
    fn evict_clears_kind_and_shared_entries() {
        let cache = ThingCache::default();
        let id = ThingId::new("R1");
        let resource = Resource::new(id.clone(), "r");
        cache.resources.put(&id, &resource);
        cache.resources.put_exists(&id, true);
        let _: Result<_, ()> = cache.thing_through(&id, || Ok(Some(Thing::from(resource.clone()))));

        cache.evict(ThingKind::Resource, &id);

        assert!(cache.resources.get(&id).is_none());
        assert!(cache.resources.get_exists(&id).is_none());
        let mut reloaded = false;
        let _: Result<_, ()> = cache.thing_through(&id, || {
            reloaded = true;
            Ok(None)
        });
        assert!(reloaded);
    }

    #[test]
    fn disabled_cache_always_loads() {
        let cache = ThingCache::disabled();
        let id = ThingId::new("L1");
        let mut loads = 0;
        for _ in 0..2 {
            let _: Result<_, ()> = cache.read_through(&cache.literals, &id, || {
                loads += 1;
                Ok(Some(Literal::new(id.clone(), "x")))
            });
        }
        assert_eq!(loads, 2);
    }
}
