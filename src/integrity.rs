//! Structural self-check for [`AdaptiveHashTable`].
//!
//! Walks every chain once and cross-checks links, placement and counters.
//! Growth runs it under `debug_assertions`; tests run it after every step.

use crate::hash::bucket_index;
use crate::table::AdaptiveHashTable;
use hashbrown::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("mask {mask:#x} does not address {buckets} buckets")]
    MaskMismatch { mask: usize, buckets: usize },
    #[error("bucket {bucket} links to a node that does not exist")]
    DanglingLink { bucket: usize },
    #[error("bucket {bucket} reaches a node already seen")]
    SharedOrCyclic { bucket: usize },
    #[error("key {key} sits in bucket {bucket} but hashes to bucket {expected}")]
    Misplaced {
        key: i32,
        bucket: usize,
        expected: usize,
    },
    #[error("key {key} is live more than once")]
    DuplicateLive { key: i32 },
    #[error("{orphans} nodes are not reachable from any bucket")]
    Orphans { orphans: usize },
    #[error(
        "counters say {count} nodes / {freecount} tombstones, chains hold {nodes} / {tombstones}"
    )]
    CounterMismatch {
        count: usize,
        freecount: usize,
        nodes: usize,
        tombstones: usize,
    },
}

impl AdaptiveHashTable {
    /// Verify the chain structure and counters.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let buckets = self.buckets.len();
        if !buckets.is_power_of_two()
            || self.mask != buckets - 1
            || buckets != 1usize << self.logsize
        {
            return Err(IntegrityError::MaskMismatch {
                mask: self.mask,
                buckets,
            });
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut live_keys = HashSet::with_capacity(self.nodes.len());
        let mut tombstones = 0usize;

        for (bucket, &head) in self.buckets.iter().enumerate() {
            let mut cur = head;
            while let Some(k) = cur {
                if !seen.insert(k) {
                    return Err(IntegrityError::SharedOrCyclic { bucket });
                }
                let node = self
                    .nodes
                    .get(k)
                    .ok_or(IntegrityError::DanglingLink { bucket })?;
                let key = node.slot.key();
                let expected = bucket_index(key, self.mask);
                if expected != bucket {
                    return Err(IntegrityError::Misplaced {
                        key,
                        bucket,
                        expected,
                    });
                }
                if !node.slot.is_live() {
                    tombstones += 1;
                } else if !live_keys.insert(key) {
                    return Err(IntegrityError::DuplicateLive { key });
                }
                cur = node.next;
            }
        }

        if seen.len() < self.nodes.len() {
            return Err(IntegrityError::Orphans {
                orphans: self.nodes.len() - seen.len(),
            });
        }
        if self.count != seen.len() || self.freecount != tombstones {
            return Err(IntegrityError::CounterMismatch {
                count: self.count,
                freecount: self.freecount,
                nodes: seen.len(),
                tombstones,
            });
        }
        Ok(())
    }
}
