//! Embedding cache keyed by input text.
//!
//! Bounded LRU with a TTL, so repeated texts (the query set, forwarded
//! messages, "ok") are embedded once per process.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct Entry {
    embedding: Vec<f32>,
    inserted_at: Instant,
    /// Logical clock value of the last read or write; key into `recency`.
    last_used: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    /// Clock value → key, oldest first.
    recency: BTreeMap<u64, String>,
    clock: u64,
    max_size: usize,
    ttl: Duration,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recent(&mut self) -> bool {
        match self.recency.pop_first() {
            Some((_, key)) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

/// Thread-safe text → vector cache.
pub struct EmbeddingCache {
    inner: Mutex<Inner>,
}

impl EmbeddingCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(max_size.min(1024)),
                recency: BTreeMap::new(),
                clock: 0,
                max_size,
                ttl,
            }),
        }
    }

    /// 10 000 entries, 1-hour TTL.
    pub fn default_cache() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }

    /// Look up a vector. Expired entries are dropped and count as a miss.
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let mut inner = self.inner.lock();
        let ttl = inner.ttl;

        let (last_used, expired) = {
            let entry = inner.entries.get(text)?;
            (entry.last_used, entry.inserted_at.elapsed() >= ttl)
        };
        inner.recency.remove(&last_used);
        if expired {
            inner.entries.remove(text);
            return None;
        }

        let now = inner.tick();
        inner.recency.insert(now, text.to_string());
        let entry = inner.entries.get_mut(text)?;
        entry.last_used = now;
        Some(entry.embedding.clone())
    }

    pub fn put(&self, text: String, embedding: Vec<f32>) {
        let mut inner = self.inner.lock();
        if inner.max_size == 0 {
            return;
        }
        let now = inner.tick();

        match inner.entries.get(&text).map(|e| e.last_used) {
            Some(previous) => {
                inner.recency.remove(&previous);
            }
            None => {
                while inner.entries.len() >= inner.max_size {
                    if !inner.evict_least_recent() {
                        break;
                    }
                }
            }
        }
        inner.recency.insert(now, text.clone());
        inner.entries.insert(
            text,
            Entry {
                embedding,
                inserted_at: Instant::now(),
                last_used: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }
}
