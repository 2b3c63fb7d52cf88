//! Process-lifetime polygon memoization keyed by zone label

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::trace;

use crate::model::Polygon;

/// Polygons resolved so far, keyed by [`Zone::cache_label`](crate::Zone::cache_label)
///
/// No eviction and no invalidation: a session resolves a handful of zones
/// and re-resolution costs far more than the memory held.
#[derive(Debug, Default)]
pub struct PolygonCache {
    entries: RwLock<HashMap<String, Arc<Polygon>>>,
}

impl PolygonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The polygon most recently stored under `label`
    pub fn get(&self, label: &str) -> Option<Arc<Polygon>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let hit = entries.get(label).cloned();
        trace!(label, hit = hit.is_some(), "Polygon cache lookup");
        hit
    }

    /// Store `polygon` under `label`, replacing any previous entry
    pub fn put(&self, label: impl Into<String>, polygon: Arc<Polygon>) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(label.into(), polygon);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, Ring};

    fn triangle() -> Arc<Polygon> {
        Arc::new(Polygon::single(Ring::new(vec![
            Point::new(37.0, 127.0),
            Point::new(37.0, 127.1),
            Point::new(37.1, 127.1),
        ])))
    }

    #[test]
    fn test_get_returns_the_stored_object() {
        let cache = PolygonCache::new();
        let polygon = triangle();

        cache.put("서울특별시 강남구 역삼1동", polygon.clone());

        let hit = cache.get("서울특별시 강남구 역삼1동").unwrap();
        assert!(Arc::ptr_eq(&hit, &polygon));
        assert!(cache.get("서울특별시 강남구 역삼2동").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = PolygonCache::new();
        let first = triangle();
        let second = triangle();

        cache.put("label", first.clone());
        cache.put("label", second.clone());

        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("label").unwrap(), &second));
        assert!(!Arc::ptr_eq(&cache.get("label").unwrap(), &first));
    }
}
