//! adaptive-hashtab: a chained hash table from `i32` keys to `i32` values
//! that grows on demand, deletes lazily and reorders chains on lookup.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small leaf table for interpreters and runtimes that need an
//!   integer map with predictable, allocation-light behaviour.
//! - Pieces:
//!   - `hash`: Thomas Wang's 32-bit mix; `index = mix(key) & mask`.
//!   - `table`: `AdaptiveHashTable`, `2^logsize` bucket heads, each the
//!     start of a singly linked chain of nodes stored in a generational
//!     arena (`slotmap`). Chains link by arena key, never by pointer.
//!   - `integrity`: a full structural walk used by tests and, in debug
//!     builds, after every growth.
//!
//! Operations
//! - `add` is insert-if-absent: a live entry with the same key makes it
//!   fail with `InsertError::DuplicateKey` and nothing changes. Callers
//!   wanting an upsert remove first.
//! - `find` moves a hit to the head of its chain by swapping slot contents
//!   with the head node, so the logical mapping is unchanged but the chain
//!   is. Lookups therefore take `&mut self`.
//! - `remove` turns the entry into a tombstone. The node stays linked and
//!   counted until growth; a later `add` landing in the same chain reuses
//!   the first tombstone it meets instead of allocating.
//! - Growth doubles the bucket count once live entries exceed
//!   `capacity * growfactor`. It rebuilds buckets and arena from live
//!   entries only, which is the one place tombstones are reclaimed.
//!   Deletion-heavy workloads that never grow keep their tombstones.
//!
//! Entry references
//! - `EntryRef` is an arena key plus the table generation it was minted
//!   under. Insertions, growth and lookups that swap contents bump the
//!   generation; a reference from an older generation resolves to `None`
//!   and `remove` reports `RemoveError::Stale`. Removing twice reports
//!   `RemoveError::AlreadyRemoved`.
//!
//! Failure semantics
//! - Bucket arrays are reserved fallibly; failure surfaces as
//!   `AllocError` from creation or growth. Arena nodes use the global
//!   allocator like any `Vec` and abort on exhaustion.
//! - Growth is transactional: the new table is built completely before
//!   the old one is replaced. When growth fails inside `add` the entry is
//!   already stored, the table keeps its old capacity, and `add` returns
//!   `InsertError::Grow`. The next `add` tries again.
//! - A configurable `max_logsize` caps growth.
//!
//! Notes and non-goals
//! - Single-threaded; mutation goes through `&mut self`, no locking.
//! - No shrinking, no persistence, no non-integer keys.
//! - Enumeration order is bucket-major, head to tail, and changes as
//!   lookups reorder chains.

mod config;
mod error;
mod hash;
mod integrity;
mod table;
mod table_proptest;

// Public surface
pub use config::{TableConfig, MAX_LOGSIZE};
pub use error::{AllocError, ConfigError, CreateError, GrowError, InsertError, RemoveError};
pub use hash::mix;
pub use integrity::IntegrityError;
pub use table::{AdaptiveHashTable, EntryRef, Iter, Visit};
