//! Thread-safe fixed-size LRU cache.
//!
//! A hash map gives O(1) key lookups; an index-linked arena stands in for a
//! doubly linked list and tracks usage order. `head` is the most recently
//! used entry, `tail` the next eviction candidate.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ukiyo_types::error::ConfigError;

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct LruInner<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

/// Fixed-capacity LRU cache, safe for concurrent use.
///
/// Mutating operations take the write lock; `peek`, `keys` and `len` take
/// the read lock. Every single operation is atomic.
pub struct LruCache<K, V> {
    inner: RwLock<LruInner<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity { value: capacity });
        }

        Ok(Self {
            inner: RwLock::new(LruInner {
                capacity,
                map: HashMap::new(),
                nodes: Vec::new(),
                free: Vec::new(),
                head: None,
                tail: None,
            }),
        })
    }

    /// Insert or update a value.
    ///
    /// An existing key has its value replaced and is promoted to most
    /// recently used; that never counts as an eviction. A new key at
    /// capacity evicts the least recently used entry first. Returns whether
    /// an eviction occurred.
    pub fn add(&self, key: K, value: V) -> bool {
        let mut guard = self.write();
        let inner = &mut *guard;

        if let Some(&idx) = inner.map.get(&key) {
            inner.nodes[idx].value = value;
            inner.move_to_front(idx);
            return false;
        }

        let evicted = inner.map.len() >= inner.capacity;
        if evicted {
            inner.remove_oldest();
        }

        let idx = inner.alloc(key.clone(), value);
        inner.map.insert(key, idx);
        inner.attach_front(idx);

        evicted
    }

    /// Retrieve a value and promote it to most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.write();
        let inner = &mut *guard;

        let idx = *inner.map.get(key)?;
        inner.move_to_front(idx);

        Some(inner.nodes[idx].value.clone())
    }

    /// Retrieve a value without touching the usage order.
    pub fn peek(&self, key: &K) -> Option<V> {
        let inner = self.read();
        let idx = *inner.map.get(key)?;

        Some(inner.nodes[idx].value.clone())
    }

    /// Remove an entry. Idempotent; returns whether anything was removed.
    pub fn remove(&self, key: &K) -> bool {
        let mut guard = self.write();
        let inner = &mut *guard;

        match inner.map.get(key) {
            Some(&idx) => {
                inner.remove_index(idx);
                true
            }
            None => false,
        }
    }

    /// All keys, ordered oldest to newest.
    pub fn keys(&self) -> Vec<K> {
        let inner = self.read();
        let mut keys = Vec::with_capacity(inner.map.len());

        // The tail is the oldest entry; prev pointers walk toward the head.
        let mut cursor = inner.tail;
        while let Some(idx) = cursor {
            keys.push(inner.nodes[idx].key.clone());
            cursor = inner.nodes[idx].prev;
        }

        keys
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, LruInner<K, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruInner<K, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Eq + Hash, V> LruInner<K, V> {
    fn alloc(&mut self, key: K, value: V) -> usize {
        let node = Node { key, value, prev: None, next: None };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn attach_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        if let Some(head) = self.head {
            self.nodes[head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn remove_oldest(&mut self) {
        if let Some(idx) = self.tail {
            self.remove_index(idx);
        }
    }

    fn remove_index(&mut self, idx: usize) {
        self.detach(idx);
        let key = &self.nodes[idx].key;
        self.map.remove(key);
        self.free.push(idx);
    }
}
