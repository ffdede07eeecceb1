//! Lifecycle tests: transactions, clearing, recovery, overflow payloads,
//! and the consistency sweep.

use std::sync::Arc;

use rdf_value_store::index::{self, VALUES_TABLE};
use rdf_value_store::{Error, ValueId, ValueStore};
use tempfile::{tempdir, TempDir};

fn open_store() -> (TempDir, ValueStore) {
    let dir = tempdir().unwrap();
    let store = ValueStore::open(dir.path()).unwrap();
    (dir, store)
}

fn hash_bucket_key(hash: u32, bucket: u64) -> Vec<u8> {
    let mut key = vec![0x01];
    key.extend_from_slice(&u64::from(hash).to_be_bytes());
    key.extend_from_slice(&bucket.to_be_bytes());
    key
}

// ---------------------------------------------------------------------------
// clear / revision
// ---------------------------------------------------------------------------

#[test]
fn clear_invalidates_all_ids_and_resets_counter() {
    let (_dir, store) = open_store();

    let values: Vec<_> = (0..10).map(|i| store.create_bnode(format!("b{i}"))).collect();
    for value in &values {
        store.store_value(value).unwrap();
    }
    assert!(store.max_id().unwrap().as_u64() >= 10);

    store.clear().unwrap();

    assert_eq!(store.max_id().unwrap(), ValueId(0));
    for value in &values {
        // the stamp is stale and the index is empty
        assert_eq!(store.get_id(value).unwrap(), ValueId::UNKNOWN);
    }

    // the store keeps working after a clear
    let id = store.store_value(&store.create_bnode("fresh")).unwrap();
    assert_eq!(id, ValueId(1));
}

// ---------------------------------------------------------------------------
// reopen / recovery
// ---------------------------------------------------------------------------

#[test]
fn reopen_recovers_next_id() {
    let dir = tempdir().unwrap();
    let max_id = {
        let store = ValueStore::open(dir.path()).unwrap();
        for i in 0..5 {
            store.store_value(&store.create_bnode(format!("b{i}"))).unwrap();
        }
        let max_id = store.max_id().unwrap();
        store.close().unwrap();
        max_id
    };

    let store = ValueStore::open(dir.path()).unwrap();
    assert_eq!(store.max_id().unwrap(), max_id);

    // new allocations continue after the recovered maximum
    let next = store.store_value(&store.create_bnode("later")).unwrap();
    assert_eq!(next, ValueId(max_id.as_u64() + 1));

    // previously stored values are still resolvable
    assert!(!store.get_id(&store.create_bnode("b0")).unwrap().is_unknown());
}

#[test]
fn rolled_back_ids_do_not_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = ValueStore::open(dir.path()).unwrap();
        store.store_value(&store.create_bnode("kept")).unwrap();
        store.start_transaction().unwrap();
        store.store_value(&store.create_bnode("discarded")).unwrap();
        store.rollback().unwrap();
        store.close().unwrap();
    }

    let store = ValueStore::open(dir.path()).unwrap();
    assert_eq!(store.max_id().unwrap(), ValueId(1));
    assert_eq!(store.get_id(&store.create_bnode("discarded")).unwrap(), ValueId::UNKNOWN);
}

// ---------------------------------------------------------------------------
// transactions
// ---------------------------------------------------------------------------

#[test]
fn uncommitted_values_are_invisible_until_commit() {
    let (_dir, store) = open_store();
    store.start_transaction().unwrap();
    let staged = store.create_bnode("staged");
    let id = store.store_value(&staged).unwrap();

    // lookups against committed state miss
    assert_eq!(store.get_id(&store.create_bnode("staged")).unwrap(), ValueId::UNKNOWN);
    assert!(store.get_value(id).unwrap().is_none());

    store.commit().unwrap();
    assert_eq!(store.get_id(&store.create_bnode("staged")).unwrap(), id);
    assert_eq!(store.get_value(id).unwrap().unwrap(), staged);
}

#[test]
fn rollback_discards_writes_stamps_and_ids() {
    let (_dir, store) = open_store();
    store.store_value(&store.create_bnode("base")).unwrap();
    let base_max = store.max_id().unwrap();

    store.start_transaction().unwrap();
    let staged = store.create_bnode("staged");
    let staged_id = store.store_value(&staged).unwrap();
    store.rollback().unwrap();

    assert_eq!(store.max_id().unwrap(), base_max);
    // no stamp, no cache entry, no index entry
    assert_eq!(store.get_id(&staged).unwrap(), ValueId::UNKNOWN);

    // the freed ID is handed out again
    let reused = store.store_value(&store.create_bnode("other")).unwrap();
    assert_eq!(reused, staged_id);
}

#[test]
fn storing_same_value_twice_in_one_transaction_is_idempotent() {
    let (_dir, store) = open_store();
    store.start_transaction().unwrap();
    let a = store.store_value(&store.create_literal("dup")).unwrap();
    let b = store.store_value(&store.create_literal("dup")).unwrap();
    assert_eq!(a, b);
    store.commit().unwrap();
    assert_eq!(store.get_id(&store.create_literal("dup")).unwrap(), a);
    store.check_consistency().unwrap();
}

#[test]
fn nested_start_transaction_is_rejected() {
    let (_dir, store) = open_store();
    store.start_transaction().unwrap();
    assert!(matches!(store.start_transaction(), Err(Error::InvalidArgument(_))));
    store.rollback().unwrap();
}

#[test]
fn commit_and_rollback_without_transaction_are_noops() {
    let (_dir, store) = open_store();
    store.commit().unwrap();
    store.rollback().unwrap();
}

// ---------------------------------------------------------------------------
// oversized payloads
// ---------------------------------------------------------------------------

#[test]
fn oversized_literal_roundtrips_through_overflow_bucket() {
    let (_dir, store) = open_store();
    let big_label = "x".repeat(2048);
    let lit = store.create_literal(&big_label);
    let id = store.store_value(&lit).unwrap();

    assert_eq!(store.store_value(&store.create_literal(&big_label)).unwrap(), id);
    assert_eq!(store.get_value(id).unwrap().unwrap(), lit);

    // an equally oversized payload that was never stored misses
    let other = store.create_literal("y".repeat(2048));
    assert_eq!(store.get_id(&other).unwrap(), ValueId::UNKNOWN);

    store.check_consistency().unwrap();
}

#[test]
fn colliding_oversized_literals_chain_into_buckets() {
    let dir = tempdir().unwrap();
    let store = ValueStore::open(dir.path()).unwrap();

    // "plumless" and "buckeroo" share a CRC32; with identical encoding
    // prefixes and an identical suffix the full payloads collide too.
    let suffix = "x".repeat(600);
    let first = store.store_value(&store.create_literal(format!("plumless{suffix}"))).unwrap();
    let second = store.store_value(&store.create_literal(format!("buckeroo{suffix}"))).unwrap();
    assert_ne!(first, second);

    assert_eq!(
        store.get_id(&store.create_literal(format!("plumless{suffix}"))).unwrap(),
        first
    );
    assert_eq!(
        store.get_id(&store.create_literal(format!("buckeroo{suffix}"))).unwrap(),
        second
    );
    store.close().unwrap();
    drop(store);

    let db = redb::Database::open(dir.path().join("values/values.redb")).unwrap();
    let rtx = db.begin_read().unwrap();
    let table = rtx.open_table(VALUES_TABLE).unwrap();

    let payload_a = table
        .get(index::id_key(first.as_u64()).as_slice())
        .unwrap()
        .unwrap()
        .value()
        .to_vec();
    let payload_b = table
        .get(index::id_key(second.as_u64()).as_slice())
        .unwrap()
        .unwrap()
        .value()
        .to_vec();
    let hash = crc32fast::hash(&payload_a);
    assert_eq!(hash, crc32fast::hash(&payload_b));

    // insertion order put the first literal in bucket 0, the second in 1
    let b0 = table.get(hash_bucket_key(hash, 0).as_slice()).unwrap().unwrap();
    let b1 = table.get(hash_bucket_key(hash, 1).as_slice()).unwrap().unwrap();
    assert_eq!(b0.value(), index::id_key(first.as_u64()).as_slice());
    assert_eq!(b1.value(), index::id_key(second.as_u64()).as_slice());
}

// ---------------------------------------------------------------------------
// consistency
// ---------------------------------------------------------------------------

#[test]
fn consistency_check_passes_on_healthy_store() {
    let (_dir, store) = open_store();
    store.store_value(&store.create_iri("http://example.org/a").unwrap()).unwrap();
    store.store_value(&store.create_lang_literal("hi", "en")).unwrap();
    store.store_value(&store.create_bnode("b")).unwrap();
    store.store_value(&store.create_literal("x".repeat(1024))).unwrap();
    store.check_consistency().unwrap();
}

#[test]
fn consistency_check_reports_missing_forward_entry() {
    let dir = tempdir().unwrap();
    {
        let store = ValueStore::open(dir.path()).unwrap();
        for i in 0..3 {
            store.store_value(&store.create_bnode(format!("b{i}"))).unwrap();
        }
        store.close().unwrap();
    }

    // break a reverse entry by deleting the forward entry it points to
    {
        let db = redb::Database::open(dir.path().join("values/values.redb")).unwrap();
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(VALUES_TABLE).unwrap();
            table.remove(index::id_key(2).as_slice()).unwrap();
        }
        txn.commit().unwrap();
    }

    let store = ValueStore::open(dir.path()).unwrap();
    assert!(matches!(store.check_consistency(), Err(Error::Corrupt(_))));
}

// ---------------------------------------------------------------------------
// close
// ---------------------------------------------------------------------------

#[test]
fn close_is_idempotent_and_blocks_further_use() {
    let (_dir, store) = open_store();
    store.store_value(&store.create_bnode("b")).unwrap();
    store.close().unwrap();
    store.close().unwrap();
    assert!(matches!(store.get_id(&store.create_bnode("b")), Err(Error::Closed)));
    assert!(matches!(store.store_value(&store.create_bnode("b")), Err(Error::Closed)));
    assert!(matches!(store.clear(), Err(Error::Closed)));
}

#[test]
fn close_aborts_open_transaction() {
    let dir = tempdir().unwrap();
    {
        let store = ValueStore::open(dir.path()).unwrap();
        store.start_transaction().unwrap();
        store.store_value(&store.create_bnode("staged")).unwrap();
        store.close().unwrap();
    }
    let store = ValueStore::open(dir.path()).unwrap();
    assert_eq!(store.get_id(&store.create_bnode("staged")).unwrap(), ValueId::UNKNOWN);
    assert_eq!(store.max_id().unwrap(), ValueId(0));
}

// ---------------------------------------------------------------------------
// concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_readers_resolve_stored_values() {
    let (_dir, store) = open_store();
    let store = Arc::new(store);

    let mut expected = Vec::new();
    for i in 0..16 {
        let value = store.create_bnode(format!("node-{i}"));
        let id = store.store_value(&value).unwrap();
        expected.push((value, id));
    }
    let expected = Arc::new(expected);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let expected = Arc::clone(&expected);
        handles.push(std::thread::spawn(move || {
            for _ in 0..50 {
                for (value, id) in expected.iter() {
                    assert_eq!(store.get_id(value).unwrap(), *id);
                    assert_eq!(&store.get_value(*id).unwrap().unwrap(), value);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    store.sync().unwrap();
}
