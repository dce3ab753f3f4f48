// Property tests for EntryTable, kept inside the crate because the table
// is not part of the public surface.

use crate::entry_table::tests::ConstBuildHasher;
use crate::entry_table::{EntryId, EntryTable, InsertError, Occupied};
use core::hash::BuildHasher;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    InsertWith(usize, i32),
    Replace(usize, i32),
    Remove(usize),
    RemoveKey(usize),
    Find(usize),
    Contains(String),
    RetainEven,
    Iterate,
}

// Keys come from a small pool so operations keep hitting the same keys;
// indices shrink toward earlier pool entries.
fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=6).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertWith(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.clone().prop_map(Op::RemoveKey),
            idx.clone().prop_map(Op::Find),
            "[a-z]{0,4}".prop_map(Op::Contains),
            Just(Op::RetainEven),
            Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std HashMap:
// - duplicate inserts are rejected and leave the stored value alone;
// - replace evicts the stored value and issues a fresh id;
// - ids of removed or replaced entries never resolve again;
// - iteration yields each live key exactly once;
// - len/is_empty match the model after every step.
fn run<S: BuildHasher>(
    mut sut: EntryTable<String, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut live: HashMap<String, EntryId> = HashMap::new();
    let mut stale: Vec<EntryId> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                match sut.insert(k.clone(), v) {
                    Ok(id) => {
                        prop_assert!(!model.contains_key(&k));
                        model.insert(k.clone(), v);
                        live.insert(k, id);
                    }
                    Err(Occupied { existing, value }) => {
                        prop_assert_eq!(Some(&existing), live.get(&k));
                        prop_assert_eq!(value, v);
                    }
                }
            }
            Op::InsertWith(i, v) => {
                let k = pool[i].clone();
                let mut ran = false;
                match sut.insert_with(k.clone(), || {
                    ran = true;
                    v
                }) {
                    Ok(id) => {
                        prop_assert!(ran);
                        prop_assert!(!model.contains_key(&k));
                        model.insert(k.clone(), v);
                        live.insert(k, id);
                    }
                    Err(InsertError::DuplicateKey { existing }) => {
                        prop_assert!(!ran, "constructor ran for an occupied key");
                        prop_assert_eq!(Some(&existing), live.get(&k));
                    }
                }
            }
            Op::Replace(i, v) => {
                let k = pool[i].clone();
                let (id, evicted) = sut.replace(k.clone(), v);
                prop_assert_eq!(evicted, model.insert(k.clone(), v));
                if let Some(old) = live.insert(k, id) {
                    prop_assert_ne!(old, id);
                    stale.push(old);
                }
            }
            Op::Remove(i) => {
                let k = &pool[i];
                match live.remove(k) {
                    Some(id) => {
                        let (kk, vv) = sut.remove(id).expect("live id removes");
                        prop_assert_eq!(&kk, k);
                        prop_assert_eq!(Some(vv), model.remove(k));
                        stale.push(id);
                    }
                    None => prop_assert!(sut.find(k.as_str()).is_none()),
                }
            }
            Op::RemoveKey(i) => {
                let k = &pool[i];
                let got = sut.remove_key(k.as_str());
                match (got, model.remove(k)) {
                    (Some((id, kk, vv)), Some(mv)) => {
                        prop_assert_eq!(&kk, k);
                        prop_assert_eq!(vv, mv);
                        prop_assert_eq!(live.remove(k), Some(id));
                        stale.push(id);
                    }
                    (None, None) => {}
                    (got, want) => prop_assert!(false, "remove_key {:?} vs model {:?}", got, want),
                }
            }
            Op::Find(i) => {
                let k = &pool[i];
                let found = sut.find(k.as_str());
                prop_assert_eq!(found.as_ref(), live.get(k));
                if let Some(id) = found {
                    prop_assert_eq!(sut.get(id), model.get(k));
                    prop_assert_eq!(sut.key(id), Some(k));
                }
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            Op::RetainEven => {
                sut.retain(|_, v| v % 2 == 0);
                let dropped: Vec<String> = model
                    .iter()
                    .filter(|(_, v)| *v % 2 != 0)
                    .map(|(k, _)| k.clone())
                    .collect();
                for k in dropped {
                    model.remove(&k);
                    if let Some(id) = live.remove(&k) {
                        stale.push(id);
                    }
                }
            }
            Op::Iterate => {
                let seen: Vec<&String> = sut.iter().map(|(_, k, _)| k).collect();
                let unique: BTreeSet<&String> = seen.iter().copied().collect();
                prop_assert_eq!(seen.len(), unique.len(), "iteration repeated a key");
                let expected: BTreeSet<&String> = model.keys().collect();
                prop_assert_eq!(unique, expected);
            }
        }

        for &id in &stale {
            prop_assert!(sut.get(id).is_none(), "stale id resolved");
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(EntryTable::with_capacity_and_hasher(0, RandomState::new()), pool, ops)?;
    }

    // Worst-case collisions: every key shares hash 0, so only `Eq`
    // separates entries.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(EntryTable::with_capacity_and_hasher(0, ConstBuildHasher), pool, ops)?;
    }
}
