use adaptive_hashtab::{
    AdaptiveHashTable, ConfigError, CreateError, GrowError, InsertError, RemoveError,
    TableConfig,
};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use test_log::test;

fn keys(t: &AdaptiveHashTable) -> BTreeSet<i32> {
    t.iter().map(|(k, _)| k).collect()
}

// Scenario: create(1, 1), add 1, 2, 4 (crossing the two-bucket threshold),
// look up and remove 1 and 2, then count what is left.
#[test]
fn basic_scenario() {
    let mut t = AdaptiveHashTable::new(1, 1).unwrap();
    t.add(1, 1).unwrap();
    t.add(2, 2).unwrap();
    t.add(4, 4).unwrap();
    assert!(t.capacity() >= 4, "third add must grow a two-bucket table");

    let r1 = t.find(1).expect("1 present");
    assert_eq!(r1.value(&t), Some(1));
    assert_eq!(t.remove(r1), Ok((1, 1)));

    let r2 = t.find(2).expect("2 present");
    assert_eq!(r2.value(&t), Some(2));
    assert_eq!(t.remove(r2), Ok((2, 2)));

    assert_eq!(t.len(), 1);
    assert_eq!(keys(&t), BTreeSet::from([4]));
    assert_eq!(t.check_integrity(), Ok(()));
    t.destroy();
}

#[test]
fn duplicate_add_leaves_mapping_unchanged() {
    let mut t = AdaptiveHashTable::new(2, 1).unwrap();
    t.add(10, 1).unwrap();
    match t.add(10, 2) {
        Err(InsertError::DuplicateKey { key: 10 }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(t.get(10), Some(1));
    assert_eq!(t.len(), 1);
}

// Upsert is remove followed by add.
#[test]
fn remove_then_add_replaces_value() {
    let mut t = AdaptiveHashTable::new(2, 1).unwrap();
    t.add(3, 30).unwrap();
    assert_eq!(t.remove_key(3), Some(30));
    assert_eq!(t.get(3), None);
    t.add(3, 31).unwrap();
    assert_eq!(t.get(3), Some(31));
    assert_eq!(t.tombstones(), 0);
}

#[test]
fn growth_preserves_every_live_key() {
    let mut t = AdaptiveHashTable::new(0, 1).unwrap();
    for k in 0..1000 {
        let before = t.len();
        t.add(k * 7 - 3500, k).unwrap();
        assert_eq!(t.len(), before + 1);
    }
    assert!(t.capacity() >= 1000);
    for k in 0..1000 {
        assert_eq!(t.get(k * 7 - 3500), Some(k));
    }
    assert_eq!(t.iter().count(), 1000);
    assert_eq!(t.check_integrity(), Ok(()));
}

#[test]
fn growth_purges_tombstones() {
    let mut t = AdaptiveHashTable::new(3, 4).unwrap();
    for k in 0..32 {
        t.add(k, k).unwrap();
    }
    for k in (0..32).step_by(2) {
        assert_eq!(t.remove_key(k), Some(k));
    }
    assert_eq!(t.tombstones(), 16);
    assert_eq!(t.capacity(), 8);

    // Fresh keys until the threshold is crossed.
    let mut next = 100;
    while t.capacity() == 8 {
        t.add(next, next).unwrap();
        next += 1;
    }
    assert_eq!(t.tombstones(), 0);
    assert_eq!(t.allocated(), t.len());
    for k in (0..32).step_by(2) {
        assert!(t.find(k).is_none());
    }
    for k in (1..32).step_by(2) {
        assert_eq!(t.get(k), Some(k));
    }
}

#[test]
fn move_to_front_shows_in_enumeration() {
    // One bucket: every key shares a chain.
    let mut t = AdaptiveHashTable::new(0, 16).unwrap();
    for k in 1..=5 {
        t.add(k, k * 100).unwrap();
    }
    for _ in 0..3 {
        assert_eq!(t.get(2), Some(200));
        assert_eq!(t.iter().next(), Some((2, 200)));
    }
    let mut order = Vec::new();
    t.for_each(|v| {
        order.push((v.key(), v.value()));
        ControlFlow::Continue(())
    });
    assert_eq!(order[0], (2, 200));
    for (k, v) in order {
        assert_eq!(v, k * 100);
    }
}

#[test]
fn stale_references_are_rejected() {
    let mut t = AdaptiveHashTable::new(0, 16).unwrap();
    t.add(1, 1).unwrap();
    t.add(2, 2).unwrap();
    let r1 = t.find(1).unwrap();
    let r2 = t.find(2).unwrap();
    // Finding 2 moved it over 1's slot.
    assert_eq!(r1.key(&t), None);
    assert_eq!(t.remove(r1), Err(RemoveError::Stale));
    assert_eq!(t.remove(r2), Ok((2, 2)));
    assert_eq!(t.remove(r2), Err(RemoveError::AlreadyRemoved));
    assert_eq!(keys(&t), BTreeSet::from([1]));
}

#[test]
fn growth_ceiling_is_reported() {
    let cfg = TableConfig::new(2, 1).with_max_logsize(3);
    let mut t = AdaptiveHashTable::with_config(cfg).unwrap();
    let mut failed = None;
    for k in 0..20 {
        if let Err(e) = t.add(k, k) {
            failed = Some((k, e));
            break;
        }
    }
    let (k, e) = failed.expect("ceiling must be hit");
    assert_eq!(
        e,
        InsertError::Grow(GrowError::CapacityExceeded {
            logsize: 3,
            max_logsize: 3,
        })
    );
    assert_eq!(t.capacity(), 8);
    assert_eq!(t.get(k), Some(k), "entry stays after failed growth");
    assert_eq!(t.len(), k as usize + 1);
    assert_eq!(t.grow(), Err(GrowError::CapacityExceeded { logsize: 3, max_logsize: 3 }));
    assert_eq!(t.check_integrity(), Ok(()));
}

#[test]
fn invalid_configs_are_rejected() {
    assert!(matches!(
        AdaptiveHashTable::new(0, 0),
        Err(CreateError::Config(ConfigError::ZeroGrowFactor))
    ));
    assert!(matches!(
        AdaptiveHashTable::with_config(TableConfig::new(6, 1).with_max_logsize(5)),
        Err(CreateError::Config(ConfigError::LogSizeTooLarge { logsize: 6, max: 5 }))
    ));
}

#[test]
fn enumeration_can_drain_table() {
    let mut t = AdaptiveHashTable::new(2, 2).unwrap();
    for k in -10..10 {
        t.add(k, k).unwrap();
    }
    let mut drained = BTreeSet::new();
    t.for_each(|v| {
        drained.insert(v.key());
        v.remove();
        ControlFlow::Continue(())
    });
    assert_eq!(drained, (-10..10).collect::<BTreeSet<_>>());
    assert!(t.is_empty());
    assert_eq!(t.tombstones(), 20);
    assert_eq!(t.iter().next(), None);
    t.add(0, 1).unwrap();
    assert_eq!(t.get(0), Some(1));
}

#[test]
fn into_iterator_for_reference() {
    let mut t = AdaptiveHashTable::new(1, 1).unwrap();
    for k in [5, 6, 7] {
        t.add(k, -k).unwrap();
    }
    let mut sum = 0;
    for (k, v) in &t {
        assert_eq!(v, -k);
        sum += k;
    }
    assert_eq!(sum, 18);
}

#[test]
fn extreme_keys() {
    let mut t = AdaptiveHashTable::new(1, 1).unwrap();
    for k in [i32::MIN, -1, 0, 1, i32::MAX] {
        t.add(k, k).unwrap();
    }
    for k in [i32::MIN, -1, 0, 1, i32::MAX] {
        assert_eq!(t.get(k), Some(k));
    }
}
