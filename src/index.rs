//! Dual-direction value index over a single ordered redb table.
//!
//! One byte-key table hosts three entry kinds, discriminated by the first
//! key byte:
//!
//! - `0x00` (ID key): `0x00 ‖ u64 ID` → encoded payload (forward entry).
//! - `0x01` (hash key): `0x01 ‖ u64 CRC32 ‖ u64 bucket` → ID key bytes.
//!   Overflow buckets for payloads too large to be reverse keys.
//! - everything else: the payload bytes themselves → ID key bytes
//!   (direct reverse entry).
//!
//! Big-endian keys make the kinds sort as ID keys, then hash keys, then
//! reverse entries, so the ID keyspace and each hash-bucket chain are
//! contiguous ranges. Hash keys cannot collide with IRI reverse keys
//! (both start with 0x01): the u64 slot of a CRC32 always has four zero
//! high bytes, while an IRI reverse key carries a non-zero u32 namespace
//! ID there.
//!
//! Bucket indices are assigned in insertion order by counting the existing
//! chain before appending, and are never reused.

use std::path::Path;

use redb::{Database, ReadableTable, Table, TableDefinition};

use crate::error::{Error, Result};
use crate::value::ValueId;

/// The single table hosting forward, reverse, and overflow entries.
pub const VALUES_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("values");

/// Largest payload stored directly as a reverse key. Payloads at or above
/// this size go through the overflow-bucket scheme. Fixed format constant
/// (the maximum key size reported by the original storage engine).
pub const MAX_KEY_SIZE: usize = 511;

/// First key byte of forward (ID → payload) entries.
pub const ID_KEY: u8 = 0x00;
/// First key byte of overflow bucket entries.
pub const HASH_KEY: u8 = 0x01;

/// Length of the `0x01 ‖ u64 hash` prefix shared by one bucket chain.
const HASH_PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

/// Encode an ID as a forward key: `0x00 ‖ u64 BE`.
pub fn id_key(id: u64) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = ID_KEY;
    key[1..].copy_from_slice(&id.to_be_bytes());
    key
}

/// Decode a forward key back to its ID.
pub fn decode_id_key(data: &[u8]) -> Result<u64> {
    if data.len() != 9 || data[0] != ID_KEY {
        return Err(Error::corrupt(format!(
            "malformed ID key ({} bytes)",
            data.len()
        )));
    }
    Ok(u64::from_be_bytes(data[1..].try_into().expect("8-byte slice")))
}

fn hash_key(hash: u64, bucket: u64) -> [u8; 17] {
    let mut key = [0u8; 17];
    key[0] = HASH_KEY;
    key[1..9].copy_from_slice(&hash.to_be_bytes());
    key[9..].copy_from_slice(&bucket.to_be_bytes());
    key
}

fn payload_hash(payload: &[u8]) -> u64 {
    u64::from(crc32fast::hash(payload))
}

// ---------------------------------------------------------------------------
// Database lifecycle
// ---------------------------------------------------------------------------

/// Open (or create) the backing database and make sure the table exists,
/// so that later read transactions never race table creation.
pub fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::create(path)?;
    let txn = db.begin_write()?;
    {
        let _ = txn.open_table(VALUES_TABLE)?;
    }
    txn.commit()?;
    Ok(db)
}

/// Recover the next ID to allocate: one past the highest forward entry.
///
/// The ID keyspace is the contiguous range below the first hash key, so
/// the last entry of that range holds the maximum assigned ID.
pub fn recover_next_id<T>(table: &T) -> Result<u64>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let lo = [ID_KEY];
    let hi = [HASH_KEY];
    let mut range = table.range::<&[u8]>(lo.as_slice()..hi.as_slice())?;
    match range.next_back() {
        Some(entry) => {
            let (key, _) = entry?;
            Ok(decode_id_key(key.value())? + 1)
        }
        None => Ok(1),
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Forward lookup: raw payload bytes for an ID, if present.
pub fn get_payload<T>(table: &T, id: ValueId) -> Result<Option<Vec<u8>>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let key = id_key(id.as_u64());
    match table.get(key.as_slice())? {
        Some(guard) => Ok(Some(guard.value().to_vec())),
        None => Ok(None),
    }
}

/// Reverse lookup: the ID stored for `payload`, or [`ValueId::UNKNOWN`].
///
/// Small payloads resolve with a single point lookup. Oversized payloads
/// walk their CRC32 bucket chain, dereferencing each candidate ID and
/// comparing the stored payload byte-for-byte; the walk stops at the
/// first key that leaves the chain's 9-byte prefix.
pub fn find_id<T>(table: &T, payload: &[u8]) -> Result<ValueId>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    if payload.len() < MAX_KEY_SIZE {
        return match table.get(payload)? {
            Some(guard) => Ok(ValueId(decode_id_key(guard.value())?)),
            None => Ok(ValueId::UNKNOWN),
        };
    }

    let first = hash_key(payload_hash(payload), 0);
    for entry in table.range::<&[u8]>(first.as_slice()..)? {
        let (key, candidate) = entry?;
        let key_bytes = key.value();
        if key_bytes.len() < HASH_PREFIX_LEN
            || key_bytes[..HASH_PREFIX_LEN] != first[..HASH_PREFIX_LEN]
        {
            break;
        }
        let id_bytes = candidate.value();
        if let Some(stored) = table.get(id_bytes)? {
            if stored.value() == payload {
                return Ok(ValueId(decode_id_key(id_bytes)?));
            }
        }
    }
    Ok(ValueId::UNKNOWN)
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Insert both directions for a freshly allocated ID in one transaction.
///
/// Oversized payloads get a hash-bucket entry instead of a direct reverse
/// key; the bucket index is the current length of the chain.
pub fn store_bidirectional(
    table: &mut Table<'_, &'static [u8], &'static [u8]>,
    id: ValueId,
    payload: &[u8],
) -> Result<()> {
    let idk = id_key(id.as_u64());
    if payload.len() < MAX_KEY_SIZE {
        table.insert(payload, idk.as_slice())?;
        table.insert(idk.as_slice(), payload)?;
        return Ok(());
    }

    let hash = payload_hash(payload);
    let first = hash_key(hash, 0);
    let bucket = {
        let mut count = 0u64;
        for entry in table.range::<&[u8]>(first.as_slice()..)? {
            let (key, _) = entry?;
            let key_bytes = key.value();
            if key_bytes.len() < HASH_PREFIX_LEN
                || key_bytes[..HASH_PREFIX_LEN] != first[..HASH_PREFIX_LEN]
            {
                break;
            }
            count += 1;
        }
        count
    };
    table.insert(hash_key(hash, bucket).as_slice(), idk.as_slice())?;
    table.insert(idk.as_slice(), payload)?;
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn with_store<R>(f: impl FnOnce(&Database) -> R) -> R {
        let dir = tempdir().unwrap();
        let db = open_database(&dir.path().join("values.redb")).unwrap();
        f(&db)
    }

    fn put(db: &Database, id: u64, payload: &[u8]) {
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(VALUES_TABLE).unwrap();
            store_bidirectional(&mut table, ValueId(id), payload).unwrap();
        }
        txn.commit().unwrap();
    }

    #[test]
    fn test_id_key_roundtrip() {
        let key = id_key(0x0102030405060708);
        assert_eq!(key[0], ID_KEY);
        assert_eq!(decode_id_key(&key).unwrap(), 0x0102030405060708);
        assert!(decode_id_key(&key[..8]).is_err());
    }

    #[test]
    fn test_inline_store_and_find() {
        with_store(|db| {
            put(db, 1, b"\x02node");
            let rtx = db.begin_read().unwrap();
            let table = rtx.open_table(VALUES_TABLE).unwrap();

            assert_eq!(find_id(&table, b"\x02node").unwrap(), ValueId(1));
            assert_eq!(find_id(&table, b"\x02other").unwrap(), ValueId::UNKNOWN);
            assert_eq!(get_payload(&table, ValueId(1)).unwrap().unwrap(), b"\x02node");
            assert_eq!(get_payload(&table, ValueId(9)).unwrap(), None);
        });
    }

    #[test]
    fn test_overflow_store_and_find() {
        with_store(|db| {
            let big: Vec<u8> = {
                let mut v = vec![0x02];
                v.extend(std::iter::repeat(b'a').take(2048));
                v
            };
            put(db, 1, &big);

            let rtx = db.begin_read().unwrap();
            let table = rtx.open_table(VALUES_TABLE).unwrap();
            assert_eq!(find_id(&table, &big).unwrap(), ValueId(1));

            // never-stored payload of the same size misses
            let mut other = big.clone();
            *other.last_mut().unwrap() = b'b';
            assert_eq!(find_id(&table, &other).unwrap(), ValueId::UNKNOWN);

            // reverse side is a hash bucket, not a direct key
            assert!(table.get(big.as_slice()).unwrap().is_none());
            let bucket0 = hash_key(payload_hash(&big), 0);
            let target = table.get(bucket0.as_slice()).unwrap().unwrap();
            assert_eq!(decode_id_key(target.value()).unwrap(), 1);
        });
    }

    #[test]
    fn test_crc_collision_lands_in_next_bucket() {
        // "plumless" and "buckeroo" share a CRC32; appending the same
        // suffix to both preserves the collision and pushes the payloads
        // over the inline key limit.
        let suffix = vec![b'x'; 600];
        let mut a = b"plumless".to_vec();
        a.extend_from_slice(&suffix);
        let mut b = b"buckeroo".to_vec();
        b.extend_from_slice(&suffix);
        assert_eq!(crc32fast::hash(&a), crc32fast::hash(&b));

        with_store(|db| {
            put(db, 1, &a);
            put(db, 2, &b);

            let rtx = db.begin_read().unwrap();
            let table = rtx.open_table(VALUES_TABLE).unwrap();

            let hash = payload_hash(&a);
            let b0 = table.get(hash_key(hash, 0).as_slice()).unwrap().unwrap();
            let b1 = table.get(hash_key(hash, 1).as_slice()).unwrap().unwrap();
            assert_eq!(decode_id_key(b0.value()).unwrap(), 1);
            assert_eq!(decode_id_key(b1.value()).unwrap(), 2);

            // the chain walk resolves each payload to its own ID
            assert_eq!(find_id(&table, &a).unwrap(), ValueId(1));
            assert_eq!(find_id(&table, &b).unwrap(), ValueId(2));
        });
    }

    #[test]
    fn test_recover_next_id() {
        with_store(|db| {
            {
                let rtx = db.begin_read().unwrap();
                let table = rtx.open_table(VALUES_TABLE).unwrap();
                assert_eq!(recover_next_id(&table).unwrap(), 1);
            }

            put(db, 1, b"\x02a");
            put(db, 2, b"\x02b");
            put(db, 7, b"\x02c");

            let rtx = db.begin_read().unwrap();
            let table = rtx.open_table(VALUES_TABLE).unwrap();
            assert_eq!(recover_next_id(&table).unwrap(), 8);
        });
    }

    #[test]
    fn test_recovery_ignores_hash_and_reverse_keys() {
        with_store(|db| {
            // an oversized payload adds a hash key that must not be read
            // back as an ID during recovery
            let mut big = vec![0x02];
            big.extend(std::iter::repeat(b'z').take(1024));
            put(db, 3, &big);
            put(db, 4, b"\x02small");

            let rtx = db.begin_read().unwrap();
            let table = rtx.open_table(VALUES_TABLE).unwrap();
            assert_eq!(recover_next_id(&table).unwrap(), 5);
        });
    }

    #[test]
    fn test_write_txn_sees_own_inserts() {
        with_store(|db| {
            let txn = db.begin_write().unwrap();
            {
                let mut table = txn.open_table(VALUES_TABLE).unwrap();
                store_bidirectional(&mut table, ValueId(1), b"\x02fresh").unwrap();
                assert_eq!(find_id(&table, b"\x02fresh").unwrap(), ValueId(1));
            }
            // never committed: invisible to snapshots
            drop(txn);
            let rtx = db.begin_read().unwrap();
            let table = rtx.open_table(VALUES_TABLE).unwrap();
            assert_eq!(find_id(&table, b"\x02fresh").unwrap(), ValueId::UNKNOWN);
        });
    }
}
