//! AdaptiveHashTable: chained buckets over a generational arena.

use crate::config::TableConfig;
use crate::error::{AllocError, CreateError, GrowError, InsertError, RemoveError};
use crate::hash::bucket_index;
use core::fmt;
use core::ops::ControlFlow;
use log::{debug, trace, warn};
use slotmap::{DefaultKey, SlotMap};

/// Contents of one chain node. Tombstones keep their key so the chain can
/// still be displayed and checked; their value is gone.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Slot {
    Occupied { key: i32, value: i32 },
    Tombstone { key: i32 },
}

impl Slot {
    pub(crate) fn key(&self) -> i32 {
        match *self {
            Slot::Occupied { key, .. } | Slot::Tombstone { key } => key,
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    fn holds(&self, wanted: i32) -> bool {
        matches!(*self, Slot::Occupied { key, .. } if key == wanted)
    }

    /// Turn a live slot into a tombstone, yielding what it held.
    fn bury(&mut self) -> Option<(i32, i32)> {
        match *self {
            Slot::Occupied { key, value } => {
                *self = Slot::Tombstone { key };
                Some((key, value))
            }
            Slot::Tombstone { .. } => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) slot: Slot,
    pub(crate) next: Option<DefaultKey>,
}

/// Reference to an entry returned by [`AdaptiveHashTable::find`].
///
/// Valid until the next insertion, growth or swapping lookup on the same
/// table; after that it resolves to `None` and `remove` reports it stale.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryRef {
    node: DefaultKey,
    generation: u64,
}

impl EntryRef {
    pub fn key(&self, table: &AdaptiveHashTable) -> Option<i32> {
        table.resolve(*self).map(|(key, _)| key)
    }

    pub fn value(&self, table: &AdaptiveHashTable) -> Option<i32> {
        table.resolve(*self).map(|(_, value)| value)
    }
}

pub struct AdaptiveHashTable {
    pub(crate) buckets: Vec<Option<DefaultKey>>, // chain heads
    pub(crate) nodes: SlotMap<DefaultKey, Node>,
    pub(crate) logsize: u32,
    pub(crate) mask: usize,
    growfactor: u32,
    max_logsize: u32,
    pub(crate) count: usize,     // nodes in chains, tombstones included
    pub(crate) freecount: usize, // tombstones
    generation: u64,
}

fn allocate_buckets(logsize: u32) -> Result<Vec<Option<DefaultKey>>, AllocError> {
    let realsize = 1usize << logsize;
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(realsize)
        .map_err(|source| AllocError {
            buckets: realsize,
            source,
        })?;
    buckets.resize(realsize, None);
    Ok(buckets)
}

impl AdaptiveHashTable {
    /// Create a table of `2^logsize` buckets that doubles once the average
    /// chain length exceeds `growfactor`.
    pub fn new(logsize: u32, growfactor: u32) -> Result<Self, CreateError> {
        Self::with_config(TableConfig::new(logsize, growfactor))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, CreateError> {
        config.validate()?;
        let buckets = allocate_buckets(config.logsize)?;
        trace!(
            "created table with {} buckets, growfactor {}, max logsize {}",
            buckets.len(),
            config.growfactor,
            config.max_logsize
        );
        Ok(Self {
            mask: buckets.len() - 1,
            buckets,
            nodes: SlotMap::with_key(),
            logsize: config.logsize,
            growfactor: config.growfactor,
            max_logsize: config.max_logsize,
            count: 0,
            freecount: 0,
            generation: 0,
        })
    }

    /// Current parameters; `logsize` reflects any growth so far.
    pub fn config(&self) -> TableConfig {
        TableConfig::new(self.logsize, self.growfactor).with_max_logsize(self.max_logsize)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count - self.freecount
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buckets (`2^logsize`).
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn logsize(&self) -> u32 {
        self.logsize
    }

    pub fn growfactor(&self) -> u32 {
        self.growfactor
    }

    /// Deleted entries still occupying chain nodes.
    pub fn tombstones(&self) -> usize {
        self.freecount
    }

    /// Chain nodes in use, live or tombstoned.
    pub fn allocated(&self) -> usize {
        self.count
    }

    fn threshold(&self) -> usize {
        self.capacity().saturating_mul(self.growfactor as usize)
    }

    fn invalidate_refs(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn entry_ref(&self, node: DefaultKey) -> EntryRef {
        EntryRef {
            node,
            generation: self.generation,
        }
    }

    fn resolve(&self, entry: EntryRef) -> Option<(i32, i32)> {
        if entry.generation != self.generation {
            return None;
        }
        match self.nodes.get(entry.node)?.slot {
            Slot::Occupied { key, value } => Some((key, value)),
            Slot::Tombstone { .. } => None,
        }
    }

    /// Walk a chain from `head`, yielding node keys and nodes in link order.
    pub(crate) fn chain(
        &self,
        head: Option<DefaultKey>,
    ) -> impl Iterator<Item = (DefaultKey, &Node)> + '_ {
        let mut cur = head;
        core::iter::from_fn(move || {
            let k = cur?;
            let node = self.nodes.get(k)?;
            cur = node.next;
            Some((k, node))
        })
    }

    /// Insert `key -> value` if `key` is absent.
    ///
    /// Reuses the first tombstone of the key's chain when there is one,
    /// otherwise links a new node at the chain head. Growth runs afterwards
    /// when live entries exceed `capacity() * growfactor()`; if it fails the
    /// entry is kept and `InsertError::Grow` is returned.
    pub fn add(&mut self, key: i32, value: i32) -> Result<(), InsertError> {
        let bucket = bucket_index(key, self.mask);
        let mut reusable = None;
        for (k, node) in self.chain(self.buckets[bucket]) {
            if node.slot.holds(key) {
                return Err(InsertError::DuplicateKey { key });
            }
            if reusable.is_none() && !node.slot.is_live() {
                reusable = Some(k);
            }
        }

        let slot = Slot::Occupied { key, value };
        match reusable {
            Some(k) => {
                self.nodes[k].slot = slot;
                self.freecount -= 1;
            }
            None => {
                let next = self.buckets[bucket];
                let k = self.nodes.insert(Node { slot, next });
                self.buckets[bucket] = Some(k);
                self.count += 1;
            }
        }
        self.invalidate_refs();

        if self.len() > self.threshold() {
            self.grow()?;
        }
        Ok(())
    }

    /// Look up `key`, moving its entry to the head of its chain.
    ///
    /// The move swaps slot contents with the current head rather than
    /// relinking nodes, so the returned reference always names the head.
    /// A lookup that moves an entry invalidates earlier references.
    pub fn find(&mut self, key: i32) -> Option<EntryRef> {
        let head = self.buckets[bucket_index(key, self.mask)]?;
        let (found, _) = self.chain(Some(head)).find(|(_, node)| node.slot.holds(key))?;
        if found != head {
            self.promote(head, found);
        }
        Some(self.entry_ref(head))
    }

    fn promote(&mut self, head: DefaultKey, found: DefaultKey) {
        let moved = self.nodes[found].slot;
        self.nodes[found].slot = self.nodes[head].slot;
        self.nodes[head].slot = moved;
        self.invalidate_refs();
    }

    pub fn get(&mut self, key: i32) -> Option<i32> {
        let entry = self.find(key)?;
        entry.value(self)
    }

    pub fn contains_key(&mut self, key: i32) -> bool {
        self.find(key).is_some()
    }

    /// Tombstone the entry behind `entry` and return its key and value.
    ///
    /// The node stays linked until the next growth drops it.
    pub fn remove(&mut self, entry: EntryRef) -> Result<(i32, i32), RemoveError> {
        if entry.generation != self.generation {
            return Err(RemoveError::Stale);
        }
        let node = self.nodes.get_mut(entry.node).ok_or(RemoveError::Stale)?;
        let removed = node.slot.bury().ok_or(RemoveError::AlreadyRemoved)?;
        self.freecount += 1;
        Ok(removed)
    }

    /// Remove `key` if present, returning its value.
    pub fn remove_key(&mut self, key: i32) -> Option<i32> {
        let entry = self.find(key)?;
        self.remove(entry).ok().map(|(_, value)| value)
    }

    /// Double the bucket count, re-hashing live entries and dropping
    /// tombstones.
    ///
    /// The new buckets and arena are built completely before the table is
    /// touched; on error the table is unchanged.
    pub fn grow(&mut self) -> Result<(), GrowError> {
        let logsize = self.logsize + 1;
        if logsize > self.max_logsize {
            let err = GrowError::CapacityExceeded {
                logsize: self.logsize,
                max_logsize: self.max_logsize,
            };
            warn!(
                "{err}; staying at {} buckets with {} live entries",
                self.capacity(),
                self.len()
            );
            return Err(err);
        }
        let mut buckets = allocate_buckets(logsize).map_err(|err| {
            warn!("{err}; staying at {} buckets", self.capacity());
            err
        })?;
        let mask = buckets.len() - 1;

        let mut nodes: SlotMap<DefaultKey, Node> = SlotMap::with_capacity_and_key(self.len());
        for &head in &self.buckets {
            for (_, node) in self.chain(head) {
                if let Slot::Occupied { key, .. } = node.slot {
                    let bucket = bucket_index(key, mask);
                    let k = nodes.insert(Node {
                        slot: node.slot,
                        next: buckets[bucket],
                    });
                    buckets[bucket] = Some(k);
                }
            }
        }

        debug!(
            "grew table from {} to {} buckets: moved {} entries, dropped {} tombstones",
            self.capacity(),
            buckets.len(),
            nodes.len(),
            self.freecount
        );
        self.buckets = buckets;
        self.nodes = nodes;
        self.logsize = logsize;
        self.mask = mask;
        self.count = self.nodes.len();
        self.freecount = 0;
        self.invalidate_refs();
        debug_assert_eq!(self.check_integrity(), Ok(()));
        Ok(())
    }

    /// Visit every live entry, bucket by bucket, head to tail.
    ///
    /// The visitor may tombstone the entry it is given through
    /// [`Visit::remove`]; the next link is read before the visitor runs.
    /// Returning `ControlFlow::Break(())` ends the walk.
    pub fn for_each<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Visit<'_>) -> ControlFlow<()>,
    {
        for bucket in 0..self.buckets.len() {
            let mut cur = self.buckets[bucket];
            while let Some(k) = cur {
                let node = &mut self.nodes[k];
                cur = node.next;
                let Slot::Occupied { key, value } = node.slot else {
                    continue;
                };
                let mut v = Visit {
                    key,
                    value,
                    slot: &mut node.slot,
                    tombstones: &mut self.freecount,
                };
                if visit(&mut v).is_break() {
                    return;
                }
            }
        }
    }

    /// Live entries in enumeration order, without moving anything.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            bucket: 0,
            cur: None,
        }
    }

    /// Release the table, returning how many chain nodes were freed.
    pub fn destroy(self) -> usize {
        let released = self.count;
        trace!(
            "destroying table: {} buckets, {} nodes ({} tombstones)",
            self.capacity(),
            released,
            self.freecount
        );
        released
    }
}

/// The entry currently offered to a [`AdaptiveHashTable::for_each`] visitor.
pub struct Visit<'a> {
    key: i32,
    value: i32,
    slot: &'a mut Slot,
    tombstones: &'a mut usize,
}

impl Visit<'_> {
    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Tombstone this entry. Returns false if it was already removed
    /// during this visit.
    pub fn remove(&mut self) -> bool {
        if self.slot.bury().is_none() {
            return false;
        }
        *self.tombstones += 1;
        true
    }

    pub fn is_removed(&self) -> bool {
        !self.slot.is_live()
    }
}

/// Iterator over live `(key, value)` pairs of an [`AdaptiveHashTable`].
pub struct Iter<'a> {
    table: &'a AdaptiveHashTable,
    bucket: usize,
    cur: Option<DefaultKey>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let node = self.table.nodes.get(k)?;
                self.cur = node.next;
                if let Slot::Occupied { key, value } = node.slot {
                    return Some((key, value));
                }
                continue;
            }
            self.cur = *self.table.buckets.get(self.bucket)?;
            self.bucket += 1;
        }
    }
}

impl<'a> IntoIterator for &'a AdaptiveHashTable {
    type Item = (i32, i32);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct ChainDebug<'a>(&'a AdaptiveHashTable, Option<DefaultKey>);

impl fmt::Debug for ChainDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.chain(self.1).map(|(_, node)| node.slot))
            .finish()
    }
}

struct BucketsDebug<'a>(&'a AdaptiveHashTable);

impl fmt::Debug for BucketsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.0;
        f.debug_map()
            .entries(
                table
                    .buckets
                    .iter()
                    .enumerate()
                    .filter(|(_, head)| head.is_some())
                    .map(|(i, &head)| (i, ChainDebug(table, head))),
            )
            .finish()
    }
}

/// Shows counters and every non-empty chain, tombstones included.
impl fmt::Debug for AdaptiveHashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveHashTable")
            .field("logsize", &self.logsize)
            .field("capacity", &self.capacity())
            .field("growfactor", &self.growfactor)
            .field("len", &self.len())
            .field("tombstones", &self.freecount)
            .field("buckets", &BucketsDebug(self))
            .finish()
    }
}
