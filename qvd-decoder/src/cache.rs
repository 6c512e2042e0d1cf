//! # Decode Cache
//!
//! Caller-owned cache of decoded tables keyed by a blake3 hash of the input
//! bytes. Identical inputs share one `Arc<Table>`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use qvd_core::error::Result;
use qvd_core::Table;

use crate::decoder::Decoder;

/// Content hash of one input buffer
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

pub struct DecodeCache {
    decoder: Decoder,
    tables: Arc<DashMap<ContentKey, Arc<Table>>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecodeCache {
    /// A cache holding at most `max_entries` tables. Once full, new tables
    /// are decoded but not retained.
    pub fn new(decoder: Decoder, max_entries: usize) -> Self {
        Self {
            decoder,
            tables: Arc::new(DashMap::new()),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Return the cached table for `bytes`, decoding on a miss.
    ///
    /// Failed decodes are not cached.
    pub fn get_or_decode(&self, bytes: &[u8]) -> Result<Arc<Table>> {
        let key = ContentKey::of(bytes);
        if let Some(table) = self.get(&key) {
            return Ok(table);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(self.decoder.decode(bytes)?);

        if self.tables.len() >= self.max_entries {
            debug!(key = %key.to_hex(), "Decode cache full, not retaining table");
            return Ok(table);
        }

        // Another thread may have decoded the same bytes meanwhile
        let entry = self.tables.entry(key).or_insert(table);
        Ok(Arc::clone(entry.value()))
    }

    pub fn get(&self, key: &ContentKey) -> Option<Arc<Table>> {
        let table = self.tables.get(key).map(|entry| Arc::clone(entry.value()))?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(table)
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.tables.contains_key(&ContentKey::of(bytes))
    }

    pub fn remove(&self, key: &ContentKey) -> Option<Arc<Table>> {
        self.tables.remove(key).map(|(_, table)| table)
    }

    pub fn clear(&self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            entries: self.tables.len(),
            hits,
            misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }
}
