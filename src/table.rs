//! Flow storage: a bump-allocated flow pool, a chained hash index over
//! it, and a direct-mapped fast cache of recently located records (§4.2).

use crate::flow::{FlowKey, FlowRecord};
use crate::hashing::mix;

pub const LARGE_FLOW_AREA_SIZE: usize = 50_000;
pub const BURSTY_FLOW_AREA_SIZE: usize = 500;
pub const MICRO_FLOW_AREA_SIZE: usize = 1_000;
pub const POOL_SIZE: usize = LARGE_FLOW_AREA_SIZE + BURSTY_FLOW_AREA_SIZE + MICRO_FLOW_AREA_SIZE;

pub const HASH_BUCKETS: usize = 65_536;
const HASH_MASK: u32 = (HASH_BUCKETS - 1) as u32;

pub const FAST_CACHE_SIZE: usize = 8_192;
const FAST_CACHE_MASK: u32 = (FAST_CACHE_SIZE - 1) as u32;

/// Index into the flow pool. Never decreases; the pool is a pure bump
/// allocator for the lifetime of a run (see `DESIGN.md` on the
/// free-list alternative for longer-running deployments).
pub type PoolIndex = u32;

pub struct FlowTable {
    pool: Vec<FlowRecord>,
    next_links: Vec<Option<PoolIndex>>,
    bucket_heads: Vec<Option<PoolIndex>>,
    fast_cache: Vec<Option<PoolIndex>>,
    pool_size: usize,

    fast_cache_hits: u64,
    fast_cache_attempts: u64,
    chain_collisions: u64,
    total_creates: u64,
    create_refusals: u64,
}

impl FlowTable {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool: Vec::with_capacity(pool_size),
            next_links: Vec::with_capacity(pool_size),
            bucket_heads: vec![None; HASH_BUCKETS],
            fast_cache: vec![None; FAST_CACHE_SIZE],
            pool_size,
            fast_cache_hits: 0,
            fast_cache_attempts: 0,
            chain_collisions: 0,
            total_creates: 0,
            create_refusals: 0,
        }
    }

    #[inline(always)]
    fn bucket_index(key: FlowKey) -> usize {
        (mix(key.0) & HASH_MASK) as usize
    }

    #[inline(always)]
    fn cache_slot(key: FlowKey) -> usize {
        (mix(key.0) & FAST_CACHE_MASK) as usize
    }

    pub fn pool_index(&self) -> usize {
        self.pool.len()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn is_full(&self) -> bool {
        self.pool.len() >= self.pool_size
    }

    pub fn get(&self, idx: PoolIndex) -> &FlowRecord {
        &self.pool[idx as usize]
    }

    pub fn get_mut(&mut self, idx: PoolIndex) -> &mut FlowRecord {
        &mut self.pool[idx as usize]
    }

    pub fn pool_slots(&mut self) -> &mut [FlowRecord] {
        &mut self.pool
    }

    pub fn fast_cache_hit_rate(&self) -> f64 {
        if self.fast_cache_attempts == 0 {
            0.0
        } else {
            self.fast_cache_hits as f64 / self.fast_cache_attempts as f64
        }
    }

    pub fn chain_collision_rate(&self) -> f64 {
        if self.total_creates == 0 {
            0.0
        } else {
            self.chain_collisions as f64 / self.total_creates as f64
        }
    }

    pub fn create_refusals(&self) -> u64 {
        self.create_refusals
    }

    /// Finds the pool index for `key`: fast-cache first, then the
    /// hash-bucket chain. On a chain hit, refreshes the fast-cache slot.
    /// Never mutates the record itself (counters are the pipeline's job).
    pub fn lookup(&mut self, key: FlowKey) -> Option<PoolIndex> {
        self.lookup_detailed(key).map(|(idx, _)| idx)
    }

    /// Like `lookup`, but also reports whether the hit was served directly
    /// from the fast cache (so the pipeline can maintain the per-record
    /// `cache_hits` counter from §3).
    pub fn lookup_detailed(&mut self, key: FlowKey) -> Option<(PoolIndex, bool)> {
        self.fast_cache_attempts += 1;
        let slot = Self::cache_slot(key);
        if let Some(idx) = self.fast_cache[slot] {
            if self.pool[idx as usize].key == key {
                self.fast_cache_hits += 1;
                return Some((idx, true));
            }
        }

        let bucket = Self::bucket_index(key);
        let mut cursor = self.bucket_heads[bucket];
        while let Some(idx) = cursor {
            if self.pool[idx as usize].key == key {
                self.fast_cache[slot] = Some(idx);
                return Some((idx, false));
            }
            cursor = self.next_links[idx as usize];
        }
        None
    }

    /// Iterates live records in pool order, skipping logically reclaimed
    /// `Dying` records whose confidence has decayed to zero (§4.2).
    pub fn iter_live(&self) -> impl Iterator<Item = &FlowRecord> {
        self.pool
            .iter()
            .filter(|r| !(r.flow_type == crate::flow::FlowType::Dying && r.confidence == 0))
    }

    /// Bump-allocates a slot for `record`, links it at the head of its
    /// bucket chain, and returns its pool index. Returns `None` (and
    /// records a silent admission refusal) if the pool is full.
    pub fn insert(&mut self, record: FlowRecord) -> Option<PoolIndex> {
        if self.is_full() {
            self.create_refusals += 1;
            return None;
        }
        let idx = self.pool.len() as PoolIndex;
        let bucket = Self::bucket_index(record.key);
        let prior_head = self.bucket_heads[bucket];
        if prior_head.is_some() {
            self.chain_collisions += 1;
        }

        self.pool.push(record);
        self.next_links.push(prior_head);
        self.bucket_heads[bucket] = Some(idx);
        self.fast_cache[Self::cache_slot(self.pool[idx as usize].key)] = Some(idx);
        self.total_creates += 1;
        Some(idx)
    }

    /// Asserts every live record's invariant `hash(key) & mask == bucket`
    /// it is chained under; used by tests, not the hot path.
    #[cfg(test)]
    fn bucket_invariant_holds(&self) -> bool {
        for (bucket, mut cursor) in self.bucket_heads.iter().copied().enumerate() {
            while let Some(idx) = cursor {
                if Self::bucket_index(self.pool[idx as usize].key) != bucket {
                    return false;
                }
                cursor = self.next_links[idx as usize];
            }
        }
        true
    }
}
