//! The content store and the memory cache over it.
//!
//! Every live [`Content`] sits in an arena slot addressed by [`ContentId`].
//! Converted contents with cacheable URLs are also indexed by URL so later
//! fetches can reuse them. A content no caller holds stays in the index on
//! a least-recently-used list until the cache grows past its size limit.

use std::collections::{HashMap, VecDeque};

use crate::content::{Content, ContentError, ContentId};
use crate::fetch_cache::RequestId;

/// Owns every content and the URL index.
#[derive(Debug)]
pub struct MemoryCache {
    slots: Vec<Option<Content>>,
    free: Vec<usize>,
    index: HashMap<String, ContentId>,
    /// Indexed contents without users, least recently used first.
    lru: VecDeque<ContentId>,
    max_size: usize,
}

impl MemoryCache {
    /// An empty cache that keeps at most `max_size` bytes of unused
    /// contents.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            lru: VecDeque::new(),
            max_size,
        }
    }

    /// Add a content to the store (not yet to the URL index).
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NoMemory`] if the arena cannot grow.
    pub fn insert(&mut self, content: Content) -> Result<ContentId, ContentError> {
        if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(content);
            return Ok(ContentId(slot));
        }
        self.slots.try_reserve(1)?;
        self.slots.push(Some(content));
        Ok(ContentId(self.slots.len() - 1))
    }

    /// The content `id`, if it is alive.
    #[must_use]
    pub fn get(&self, id: ContentId) -> Option<&Content> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access to the content `id`.
    pub fn get_mut(&mut self, id: ContentId) -> Option<&mut Content> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Every live content.
    pub fn ids(&self) -> impl Iterator<Item = ContentId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ContentId(i))
    }

    /// Number of live contents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no content is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The indexed content for a normalised URL.
    #[must_use]
    pub fn cached(&self, url: &str) -> Option<ContentId> {
        self.index.get(url).copied()
    }

    /// Whether `id` is reachable through the URL index.
    #[must_use]
    pub fn is_cached(&self, id: ContentId) -> bool {
        self.get(id)
            .is_some_and(|c| self.index.get(c.url()) == Some(&id))
    }

    /// Enter `id` into the URL index under its URL.
    ///
    /// A content previously indexed under the same URL loses its entry and
    /// is destroyed if nobody holds it. Returns the dependency requests of
    /// anything destroyed.
    pub fn add_to_index(&mut self, id: ContentId) -> Vec<RequestId> {
        let Some(url) = self.get(id).map(|c| c.url().to_string()) else {
            return Vec::new();
        };
        match self.index.insert(url, id) {
            Some(old) if old != id => {
                self.lru.retain(|&c| c != old);
                if self.get(old).is_some_and(|c| c.users == 0) {
                    self.destroy(old)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Total size of the indexed contents.
    #[must_use]
    pub fn size(&self) -> usize {
        self.index
            .values()
            .filter_map(|&id| self.get(id))
            .map(Content::size)
            .sum()
    }

    /// Unused contents in eviction order.
    pub fn unused(&self) -> impl Iterator<Item = ContentId> + '_ {
        self.lru.iter().copied()
    }

    /// A caller takes hold of `id`.
    pub fn add_user(&mut self, id: ContentId) {
        if let Some(content) = self.get_mut(id) {
            content.users += 1;
            self.lru.retain(|&c| c != id);
        }
    }

    /// A caller lets go of `id`.
    ///
    /// An indexed content with no users left moves to the back of the LRU
    /// list; an unindexed one is destroyed at once. Returns the dependency
    /// requests of anything destroyed.
    pub fn release(&mut self, id: ContentId) -> Vec<RequestId> {
        let Some(content) = self.get_mut(id) else {
            return Vec::new();
        };
        content.users = content.users.saturating_sub(1);
        if content.users > 0 {
            return Vec::new();
        }
        if self.is_cached(id) {
            self.lru.push_back(id);
            self.evict()
        } else {
            self.destroy(id)
        }
    }

    /// Destroy least-recently-used unused contents until the indexed size
    /// is within the limit.
    pub fn evict(&mut self) -> Vec<RequestId> {
        let mut cancelled = Vec::new();
        while self.size() > self.max_size {
            let Some(victim) = self.lru.pop_front() else {
                break;
            };
            cancelled.extend(self.destroy(victim));
        }
        cancelled
    }

    /// Remove `id` from the store and the index, release its payload and
    /// the stylesheets it holds. Returns its outstanding dependency requests
    /// (and those of any stylesheet destroyed with it) for the caller to
    /// cancel.
    pub fn destroy(&mut self, id: ContentId) -> Vec<RequestId> {
        let Some(mut content) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return Vec::new();
        };
        self.free.push(id.0);
        if self.index.get(content.url()) == Some(&id) {
            let _ = self.index.remove(content.url());
        }
        self.lru.retain(|&c| c != id);
        content.destroy();

        let mut cancelled = std::mem::take(&mut content.pending);
        for dependency in std::mem::take(&mut content.dependencies) {
            cancelled.extend(self.release(dependency));
        }
        cancelled
    }

    /// Destroy every content.
    pub fn clear(&mut self) {
        let ids: Vec<ContentId> = self.ids().collect();
        for id in ids {
            let _ = self.destroy(id);
        }
        self.index.clear();
        self.lru.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentType, ConvertContext};
    use crate::handlers;

    fn done(url: &str, size: usize) -> Content {
        let mut content = Content::new(url, ContentType::Other, handlers::other::create());
        content.process_data(&vec![b'x'; size]).unwrap();
        let ctx = ConvertContext {
            url,
            width: 800,
            height: 600,
        };
        let _ = content.convert(&ctx).unwrap();
        content
    }

    fn cached(cache: &mut MemoryCache, url: &str, size: usize) -> ContentId {
        let id = cache.insert(done(url, size)).unwrap();
        assert!(cache.add_to_index(id).is_empty());
        cache.add_user(id);
        id
    }

    #[test]
    fn test_slots_are_reused() {
        let mut cache = MemoryCache::new(100);
        let a = cache.insert(done("a", 1)).unwrap();
        let _ = cache.destroy(a);
        let b = cache.insert(done("b", 1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_release_over_limit_evicts() {
        let mut cache = MemoryCache::new(10);
        let a = cached(&mut cache, "a", 6);
        let b = cached(&mut cache, "b", 6);
        assert!(cache.release(a).is_empty());
        // a is the only unused content and the cache is over its limit.
        assert!(cache.get(a).is_none());
        assert_eq!(cache.cached("a"), None);
        assert_eq!(cache.cached("b"), Some(b));
    }

    #[test]
    fn test_least_recently_released_goes_first() {
        let mut cache = MemoryCache::new(10);
        let a = cached(&mut cache, "a", 4);
        let b = cached(&mut cache, "b", 4);
        let _ = cache.release(a);
        let _ = cache.release(b);
        assert_eq!(cache.unused().collect::<Vec<_>>(), vec![a, b]);
        let c = cached(&mut cache, "c", 4);
        let _ = cache.evict();
        assert!(cache.get(a).is_none());
        assert!(cache.get(b).is_some());
        assert!(cache.get(c).is_some());
    }

    #[test]
    fn test_add_user_rescues_from_lru() {
        let mut cache = MemoryCache::new(100);
        let a = cached(&mut cache, "a", 4);
        let _ = cache.release(a);
        cache.add_user(a);
        assert_eq!(cache.unused().count(), 0);
        assert_eq!(cache.get(a).unwrap().users(), 1);
    }

    #[test]
    fn test_unindexed_content_is_destroyed_on_last_release() {
        let mut cache = MemoryCache::new(100);
        let id = cache.insert(done("q?x=1", 4)).unwrap();
        cache.add_user(id);
        cache.add_user(id);
        let _ = cache.release(id);
        assert!(cache.get(id).is_some());
        let _ = cache.release(id);
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn test_destroy_releases_dependencies() {
        let mut cache = MemoryCache::new(100);
        let sheet = cache.insert(done("s?v=2", 4)).unwrap();
        cache.add_user(sheet);
        let page = cached(&mut cache, "page", 4);
        cache.get_mut(page).unwrap().dependencies.push(sheet);
        let _ = cache.destroy(page);
        assert!(cache.get(sheet).is_none());
    }
}
