#![cfg(test)]

// Property tests for AdaptiveHashTable kept inside the crate so they can
// inspect chain layout and counters directly.

use crate::error::{InsertError, RemoveError};
use crate::hash::bucket_index;
use crate::table::AdaptiveHashTable;
use crate::TableConfig;
use core::ops::ControlFlow;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations: indices shrink toward earlier keys and the pool
// itself shrinks, which keeps counterexamples small.
#[derive(Clone, Debug)]
enum Op {
    Add(usize, i32),
    Find(usize),
    Remove(usize),
    RemoveStale(usize, usize),
    Sweep(usize),
    Grow,
    Iterate,
}

fn arb_scenario(max_keys: usize) -> impl Strategy<Value = (Vec<i32>, Vec<Op>)> {
    proptest::collection::btree_set(any::<i32>(), 1..=max_keys).prop_flat_map(|pool| {
        let pool: Vec<i32> = pool.into_iter().collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Add(i, v)),
            3 => idx.clone().prop_map(Op::Find),
            2 => idx.clone().prop_map(Op::Remove),
            1 => (idx.clone(), idx.clone()).prop_map(|(a, b)| Op::RemoveStale(a, b)),
            1 => (2usize..5).prop_map(Op::Sweep),
            1 => Just(Op::Grow),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run(
    mut sut: AdaptiveHashTable,
    pool: Vec<i32>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<i32, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Add(i, v) => {
                let k = pool[i];
                let already = model.contains_key(&k);
                match sut.add(k, v) {
                    Ok(()) => {
                        prop_assert!(!already, "add must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey { key }) => {
                        prop_assert!(already, "duplicate error only when key is live");
                        prop_assert_eq!(key, k);
                    }
                    Err(InsertError::Grow(e)) => {
                        prop_assert!(false, "unbounded table failed to grow: {}", e);
                    }
                }
                prop_assert!(sut.len() <= sut.capacity() * sut.growfactor() as usize);
            }
            Op::Find(i) => {
                let k = pool[i];
                let found = sut.find(k);
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(r) = found {
                    prop_assert_eq!(r.key(&sut), Some(k));
                    prop_assert_eq!(r.value(&sut), model.get(&k).copied());
                    // Hits end up at the head of their chain.
                    let head = sut.buckets[bucket_index(k, sut.mask)];
                    let first = sut.chain(head).next().map(|(_, n)| n.slot.key());
                    prop_assert_eq!(first, Some(k));
                }
            }
            Op::Remove(i) => {
                let k = pool[i];
                match sut.find(k) {
                    Some(r) => {
                        let (kk, vv) = sut.remove(r).expect("fresh reference");
                        prop_assert_eq!(kk, k);
                        prop_assert_eq!(Some(vv), model.remove(&k));
                        prop_assert_eq!(sut.remove(r), Err(RemoveError::AlreadyRemoved));
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            Op::RemoveStale(a, b) => {
                // A reference taken before another add must be rejected.
                let (ka, kb) = (pool[a], pool[b]);
                if let Some(r) = sut.find(ka) {
                    let before = sut.len();
                    if sut.add(kb, 0).is_ok() {
                        model.insert(kb, 0);
                        prop_assert_eq!(sut.remove(r), Err(RemoveError::Stale));
                        prop_assert_eq!(sut.len(), before + 1);
                    }
                }
            }
            Op::Sweep(modulus) => {
                let mut removed = Vec::new();
                sut.for_each(|v| {
                    if v.key().rem_euclid(modulus as i32) == 0 {
                        v.remove();
                        removed.push(v.key());
                    }
                    ControlFlow::Continue(())
                });
                for k in &removed {
                    prop_assert!(model.remove(k).is_some());
                }
                prop_assert!(model.keys().all(|k| k.rem_euclid(modulus as i32) != 0));
            }
            Op::Grow => {
                let cap = sut.capacity();
                let live = sut.len();
                sut.grow().expect("unbounded growth");
                prop_assert_eq!(sut.capacity(), cap * 2);
                prop_assert_eq!(sut.len(), live);
                prop_assert_eq!(sut.tombstones(), 0);
                prop_assert_eq!(sut.allocated(), live);
            }
            Op::Iterate => {
                let got: BTreeMap<i32, i32> = sut.iter().collect();
                let want: BTreeMap<i32, i32> = model.iter().map(|(&k, &v)| (k, v)).collect();
                prop_assert_eq!(sut.iter().count(), got.len());
                prop_assert_eq!(got, want);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.tombstones() <= sut.allocated());
        prop_assert_eq!(sut.check_integrity(), Ok(()));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `add` is insert-if-absent and keeps the load under the threshold.
// - `find` agrees with the model and leaves the hit at its chain head.
// - `remove` returns the model's pair; a second remove and a stale
//   reference are both rejected.
// - Enumeration-time removal, explicit growth and iteration keep the key
//   set equal to the model's; the structure passes `check_integrity`
//   after every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(24)) {
        let sut = AdaptiveHashTable::new(1, 1).unwrap();
        run(sut, pool, ops)?;
    }
}

// Same invariants in a single bucket with a high growfactor, where every
// key collides and tombstone reuse and move-to-front dominate.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_single_chain((pool, ops) in arb_scenario(12)) {
        let sut = AdaptiveHashTable::with_config(TableConfig::new(0, 64)).unwrap();
        run(sut, pool, ops)?;
    }
}

// Property: growth never loses or duplicates a live key, however many
// tombstones precede it.
proptest! {
    #[test]
    fn prop_growth_preserves_live_entries(
        keys in proptest::collection::btree_set(any::<i32>(), 1..200),
        removed_every in 2usize..6,
    ) {
        let mut t = AdaptiveHashTable::new(0, 2).unwrap();
        let keys: Vec<i32> = keys.into_iter().collect();
        for (i, &k) in keys.iter().enumerate() {
            t.add(k, i as i32).unwrap();
            if i % removed_every == 0 {
                prop_assert_eq!(t.remove_key(k), Some(i as i32));
            }
        }
        let live_before = t.len();
        t.grow().unwrap();
        prop_assert_eq!(t.len(), live_before);
        prop_assert_eq!(t.tombstones(), 0);
        for (i, &k) in keys.iter().enumerate() {
            let expected = if i % removed_every == 0 { None } else { Some(i as i32) };
            prop_assert_eq!(t.get(k), expected);
        }
        prop_assert_eq!(t.check_integrity(), Ok(()));
    }
}
