//! Persistent, content-addressed dictionary of RDF values and namespaces.
//!
//! [`ValueStore`] maps values to integer IDs and back over a single ordered
//! table (see [`crate::index`]). IRIs are compressed by storing their
//! namespace once and embedding its ID; literals embed their datatype's ID
//! the same way, so storing a value may recursively store the values it
//! references.
//!
//! # Concurrency contract
//!
//! Readers run concurrently with each other and with ID creation; the only
//! operation that excludes everything else is [`ValueStore::clear`], which
//! takes the catalog write lock. Writers are expected to be serialized by
//! the caller (a triple store holds a single write context): two threads
//! concurrently storing the same novel value may allocate two IDs for it.
//! Write transactions themselves are serialized internally.
//!
//! Cache entries and value stamps are only produced from committed state:
//! work done inside an explicit transaction is staged and applied at
//! `commit`, discarded at `rollback`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use redb::{Database, Durability, ReadableTable, Table, WriteTransaction};
use tracing::{debug, warn};

use crate::cache::ValueCaches;
use crate::config::ValueStoreConfig;
use crate::encoding::{self, DecodedValue};
use crate::error::{Error, Result};
use crate::index::{self, VALUES_TABLE};
use crate::revision::{Revision, StoredValue};
use crate::value::{Iri, Literal, Value, ValueId};

/// Subdirectory of the store root owned by the value dictionary.
const VALUES_DIR: &str = "values";
/// The engine's data file inside [`VALUES_DIR`].
const DATA_FILE: &str = "values.redb";

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Everything that is replaced wholesale by `clear()`.
struct StoreInner {
    db: Database,
    revision: Arc<Revision>,
    writer: Mutex<WriterState>,
}

struct WriterState {
    /// Next ID to allocate. Mutated only inside a write transaction and
    /// only advanced once the transaction's work succeeded.
    next_id: u64,
    active: Option<ActiveTxn>,
}

struct ActiveTxn {
    txn: WriteTransaction,
    /// Counter value at `start_transaction`, restored on rollback.
    next_id_snapshot: u64,
    stage: Stage,
}

/// Cache entries and stamps produced inside a transaction, applied only
/// once that transaction commits.
#[derive(Default)]
struct Stage {
    value_ids: Vec<(Value, ValueId)>,
    namespace_ids: Vec<(Arc<str>, ValueId)>,
    stamps: Vec<(Arc<StoredValue>, ValueId)>,
}

impl Stage {
    fn merge(&mut self, other: Stage) {
        self.value_ids.extend(other.value_ids);
        self.namespace_ids.extend(other.namespace_ids);
        self.stamps.extend(other.stamps);
    }
}

/// Write context handed to operations running inside a transaction.
///
/// The table view includes the transaction's own uncommitted inserts, so
/// re-storing a value within one transaction finds the earlier entry
/// instead of allocating a duplicate ID.
struct TxnCtx<'txn> {
    table: Table<'txn, &'static [u8], &'static [u8]>,
    next_id: u64,
    stage: Stage,
}

impl TxnCtx<'_> {
    fn allocate(&mut self) -> ValueId {
        let id = self.next_id;
        self.next_id += 1;
        ValueId(id)
    }
}

// ---------------------------------------------------------------------------
// ValueStore
// ---------------------------------------------------------------------------

/// Indexed storage and retrieval of RDF values by integer ID.
pub struct ValueStore {
    db_dir: PathBuf,
    force_sync: bool,
    caches: ValueCaches,
    /// Catalog lock: every operation holds it for reading; `clear()` and
    /// `close()` hold it for writing. `None` once closed.
    inner: RwLock<Option<StoreInner>>,
}

impl ValueStore {
    /// Open (or create) the value store under `data_dir` with defaults.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(data_dir, ValueStoreConfig::default())
    }

    /// Open (or create) the value store under `data_dir`.
    pub fn open_with_config(data_dir: impl AsRef<Path>, config: ValueStoreConfig) -> Result<Self> {
        let db_dir = data_dir.as_ref().join(VALUES_DIR);
        let inner = Self::open_inner(&db_dir)?;
        let caches = ValueCaches::with_capacities(
            config.value_cache_size,
            config.value_id_cache_size,
            config.namespace_cache_size,
            config.namespace_id_cache_size,
        );
        Ok(Self {
            db_dir,
            force_sync: config.force_sync,
            caches,
            inner: RwLock::new(Some(inner)),
        })
    }

    fn open_inner(db_dir: &Path) -> Result<StoreInner> {
        let db = index::open_database(&db_dir.join(DATA_FILE))?;
        let next_id = {
            let rtx = db.begin_read()?;
            let table = rtx.open_table(VALUES_TABLE)?;
            index::recover_next_id(&table)?
        };
        debug!(next_id, path = %db_dir.display(), "opened value store");
        Ok(StoreInner {
            db,
            revision: Revision::new(),
            writer: Mutex::new(WriterState {
                next_id,
                active: None,
            }),
        })
    }

    fn durability(&self) -> Durability {
        if self.force_sync {
            Durability::Immediate
        } else {
            Durability::Eventual
        }
    }

    // -- value construction -------------------------------------------------

    /// Create an IRI value from a full IRI string.
    pub fn create_iri(&self, iri: &str) -> Result<Arc<StoredValue>> {
        Ok(Arc::new(StoredValue::new(Value::iri(iri)?)))
    }

    /// Create an IRI value from pre-split namespace and local name.
    pub fn create_iri_parts(
        &self,
        namespace: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Arc<StoredValue> {
        Arc::new(StoredValue::new(Value::iri_parts(namespace, local_name)))
    }

    /// Create a blank node value.
    pub fn create_bnode(&self, node_id: impl Into<String>) -> Arc<StoredValue> {
        Arc::new(StoredValue::new(Value::bnode(node_id)))
    }

    /// Create a plain string literal (`xsd:string`).
    pub fn create_literal(&self, label: impl Into<String>) -> Arc<StoredValue> {
        Arc::new(StoredValue::new(Value::literal(label)))
    }

    /// Create a language-tagged literal.
    pub fn create_lang_literal(
        &self,
        label: impl Into<String>,
        lang: impl Into<String>,
    ) -> Arc<StoredValue> {
        Arc::new(StoredValue::new(Value::lang_literal(label, lang)))
    }

    /// Create a literal with an explicit datatype.
    pub fn create_typed_literal(&self, label: impl Into<String>, datatype: Iri) -> Arc<StoredValue> {
        Arc::new(StoredValue::new(Value::typed_literal(label, datatype)))
    }

    /// Wrap an externally constructed value in this store's own stampable
    /// value object.
    pub fn stored(&self, value: &Value) -> Arc<StoredValue> {
        Arc::new(StoredValue::new(value.clone()))
    }

    // -- lookups ------------------------------------------------------------

    /// The ID for `value`, or [`ValueId::UNKNOWN`] if it is not stored.
    ///
    /// Consults the value's own stamp, then the value → ID cache, then the
    /// index under the canonical encoding and finally under the legacy
    /// literal encoding. A successful index lookup stamps the value.
    pub fn get_id(&self, value: &StoredValue) -> Result<ValueId> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        self.get_id_inner(inner, value)
    }

    fn get_id_inner(&self, inner: &StoreInner, value: &StoredValue) -> Result<ValueId> {
        if let Some(id) = value.stamped_id(&inner.revision) {
            return Ok(id);
        }
        if let Some(id) = self.caches.id_by_value(value.value()) {
            value.set_stamp(id, &inner.revision);
            return Ok(id);
        }

        let rtx = inner.db.begin_read()?;
        let table = rtx.open_table(VALUES_TABLE)?;
        let id = self.lookup_value_id_in(&table, value.value())?;
        if !id.is_unknown() {
            value.set_stamp(id, &inner.revision);
            self.caches.put_value_id(value.value().clone(), id);
        }
        Ok(id)
    }

    /// The value stored under `id`, or `None`.
    pub fn get_value(&self, id: ValueId) -> Result<Option<Arc<StoredValue>>> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        if id.is_unknown() {
            return Ok(None);
        }
        if let Some(value) = self.caches.value_by_id(id) {
            return Ok(Some(value));
        }
        let rtx = inner.db.begin_read()?;
        let table = rtx.open_table(VALUES_TABLE)?;
        self.read_value(inner, &table, id)
    }

    /// The namespace string stored under `id`, or `None`.
    pub fn get_namespace(&self, id: ValueId) -> Result<Option<Arc<str>>> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        if id.is_unknown() {
            return Ok(None);
        }
        let rtx = inner.db.begin_read()?;
        let table = rtx.open_table(VALUES_TABLE)?;
        self.read_namespace(&table, id)
    }

    /// The ID for a namespace string, creating it when `create` is set.
    pub fn get_namespace_id(&self, namespace: &str, create: bool) -> Result<ValueId> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;

        if let Some(id) = self.caches.id_by_namespace(namespace) {
            return Ok(id);
        }
        if !create {
            let rtx = inner.db.begin_read()?;
            let table = rtx.open_table(VALUES_TABLE)?;
            let id = index::find_id(&table, encoding::encode_namespace(namespace))?;
            if !id.is_unknown() {
                self.caches.put_namespace_id(Arc::from(namespace), id);
            }
            return Ok(id);
        }
        self.with_write(inner, |store, ctx| store.namespace_id_create(ctx, namespace))
    }

    /// Highest ID assigned so far (0 when the store is empty).
    pub fn max_id(&self) -> Result<ValueId> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        let next_id = inner.writer.lock().next_id;
        Ok(ValueId(next_id - 1))
    }

    // -- storing ------------------------------------------------------------

    /// Store `value` and return its ID; if it is already present the
    /// existing ID is returned and nothing is written.
    ///
    /// Runs inside the active transaction if one was started, otherwise in
    /// a short auto-committed one. Callers must serialize write operations
    /// (see the module docs): this method does not guard against another
    /// thread storing the same novel value concurrently.
    pub fn store_value(&self, value: &Arc<StoredValue>) -> Result<ValueId> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;

        let id = self.get_id_inner(inner, value)?;
        if !id.is_unknown() {
            return Ok(id);
        }

        self.with_write(inner, |store, ctx| {
            let id = store.store_value_in(ctx, value.value())?;
            ctx.stage.stamps.push((Arc::clone(value), id));
            Ok(id)
        })
    }

    // -- transactions -------------------------------------------------------

    /// Begin an explicit write transaction bracketing subsequent mutations.
    pub fn start_transaction(&self) -> Result<()> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        let mut ws = inner.writer.lock();
        if ws.active.is_some() {
            return Err(Error::invalid_argument(
                "a write transaction is already active",
            ));
        }
        let mut txn = inner.db.begin_write()?;
        txn.set_durability(self.durability());
        ws.active = Some(ActiveTxn {
            txn,
            next_id_snapshot: ws.next_id,
            stage: Stage::default(),
        });
        Ok(())
    }

    /// Commit the active transaction, publishing its IDs, cache entries,
    /// and value stamps. A no-op without an active transaction.
    pub fn commit(&self) -> Result<()> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        let mut ws = inner.writer.lock();
        let Some(active) = ws.active.take() else {
            return Ok(());
        };
        let ActiveTxn {
            txn,
            next_id_snapshot,
            stage,
        } = active;
        match txn.commit() {
            Ok(()) => {
                self.apply_stage(&inner.revision, stage);
                Ok(())
            }
            Err(e) => {
                ws.next_id = next_id_snapshot;
                Err(e.into())
            }
        }
    }

    /// Abort the active transaction, discarding its writes and restoring
    /// the ID counter. A no-op without an active transaction.
    pub fn rollback(&self) -> Result<()> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        let mut ws = inner.writer.lock();
        let Some(active) = ws.active.take() else {
            return Ok(());
        };
        ws.next_id = active.next_id_snapshot;
        active.txn.abort()?;
        Ok(())
    }

    // -- maintenance --------------------------------------------------------

    /// Remove every value from the store.
    ///
    /// Takes the catalog write lock, deletes the backing file, reopens the
    /// engine, and issues a new revision — invalidating every previously
    /// stamped ID.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.inner.write();
        let inner = guard.take().ok_or(Error::Closed)?;
        drop(inner);

        match fs::remove_file(self.db_dir.join(DATA_FILE)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.caches.clear();
        *guard = Some(Self::open_inner(&self.db_dir)?);
        debug!(path = %self.db_dir.display(), "cleared value store");
        Ok(())
    }

    /// Make previously committed writes durable on disk.
    ///
    /// Under `force_sync` every commit is already synced and this is a
    /// no-op; it is also a no-op while a transaction is open (its own
    /// commit decides durability).
    pub fn sync(&self) -> Result<()> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        if self.force_sync {
            return Ok(());
        }
        let ws = inner.writer.lock();
        if ws.active.is_some() {
            return Ok(());
        }
        let mut txn = inner.db.begin_write()?;
        txn.set_durability(Durability::Immediate);
        txn.commit()?;
        Ok(())
    }

    /// Close the store, aborting any open transaction. Idempotent; every
    /// later operation fails with [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        let mut guard = self.inner.write();
        if let Some(inner) = guard.take() {
            {
                let mut ws = inner.writer.lock();
                if let Some(active) = ws.active.take() {
                    let _ = active.txn.abort();
                }
            }
            drop(inner);
            debug!("closed value store");
        }
        Ok(())
    }

    /// Verify that every assigned ID round-trips through the reverse
    /// index.
    ///
    /// Namespace entries must resolve back to their own ID and form the
    /// prefix of a syntactically absolute URI; value entries must decode
    /// and look up to their own ID. The first failure is reported as
    /// corruption; such a store must be exported and re-imported.
    pub fn check_consistency(&self) -> Result<()> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(Error::Closed)?;
        let next_id = inner.writer.lock().next_id;
        let rtx = inner.db.begin_read()?;
        let table = rtx.open_table(VALUES_TABLE)?;

        for raw in 1..next_id {
            let id = ValueId(raw);
            let Some(data) = index::get_payload(&table, id)? else {
                warn!(id = raw, "consistency check failed: missing forward entry");
                return Err(Error::corrupt(format!(
                    "missing forward entry for ID {raw}; export and re-import the store"
                )));
            };
            if encoding::is_namespace_data(&data) {
                let namespace = encoding::decode_namespace(&data)?;
                let found = index::find_id(&table, &data)?;
                if found != id || !is_absolute_uri(&format!("{namespace}part")) {
                    warn!(id = raw, namespace, "consistency check failed");
                    return Err(Error::corrupt(format!(
                        "export and re-import the store to fix namespace {namespace:?}"
                    )));
                }
            } else {
                let value = self.decode_stored(inner, &table, &data)?;
                let found = self.lookup_value_id_in(&table, &value)?;
                if found != id {
                    warn!(id = raw, %value, "consistency check failed");
                    return Err(Error::corrupt(format!(
                        "export and re-import the store to merge values like {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    // -- write plumbing -----------------------------------------------------

    /// Run `f` inside the active transaction, or inside a fresh
    /// auto-committed one. The ID counter only advances when `f` (and the
    /// auto-commit) succeed; staged cache entries and stamps are applied
    /// once the work is committed.
    ///
    /// Inside an explicit transaction a failed `f` leaves the transaction
    /// with whatever it already wrote; the caller is expected to
    /// `rollback()`.
    fn with_write<R>(
        &self,
        inner: &StoreInner,
        f: impl FnOnce(&Self, &mut TxnCtx<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut ws = inner.writer.lock();
        let state = &mut *ws;

        if let Some(active) = state.active.as_mut() {
            let mut ctx = TxnCtx {
                table: active.txn.open_table(VALUES_TABLE)?,
                next_id: state.next_id,
                stage: Stage::default(),
            };
            let result = f(self, &mut ctx);
            let TxnCtx {
                table,
                next_id,
                stage,
            } = ctx;
            drop(table);
            let r = result?;
            state.next_id = next_id;
            active.stage.merge(stage);
            Ok(r)
        } else {
            let mut txn = inner.db.begin_write()?;
            txn.set_durability(self.durability());
            let (result, next_id, stage) = {
                let mut ctx = TxnCtx {
                    table: txn.open_table(VALUES_TABLE)?,
                    next_id: state.next_id,
                    stage: Stage::default(),
                };
                let result = f(self, &mut ctx);
                let TxnCtx {
                    table,
                    next_id,
                    stage,
                } = ctx;
                drop(table);
                (result, next_id, stage)
            };
            let r = result?;
            txn.commit()?;
            state.next_id = next_id;
            self.apply_stage(&inner.revision, stage);
            Ok(r)
        }
    }

    fn apply_stage(&self, revision: &Arc<Revision>, stage: Stage) {
        for (value, id) in stage.value_ids {
            self.caches.put_value_id(value, id);
        }
        for (namespace, id) in stage.namespace_ids {
            self.caches.put_namespace_id(namespace, id);
        }
        for (value, id) in stage.stamps {
            value.set_stamp(id, revision);
        }
    }

    /// Store a plain value inside a write context, returning its (possibly
    /// pre-existing) ID. Recursively stores the namespace of an IRI and
    /// the datatype of a literal.
    fn store_value_in(&self, ctx: &mut TxnCtx<'_>, value: &Value) -> Result<ValueId> {
        let id = self.lookup_value_id_in(&ctx.table, value)?;
        if !id.is_unknown() {
            ctx.stage.value_ids.push((value.clone(), id));
            return Ok(id);
        }

        let data = self.encode_value_create(ctx, value)?;
        let id = ctx.allocate();
        index::store_bidirectional(&mut ctx.table, id, &data)?;
        ctx.stage.value_ids.push((value.clone(), id));
        Ok(id)
    }

    fn namespace_id_create(&self, ctx: &mut TxnCtx<'_>, namespace: &str) -> Result<ValueId> {
        if let Some(id) = self.caches.id_by_namespace(namespace) {
            return Ok(id);
        }
        let data = encoding::encode_namespace(namespace);
        let id = index::find_id(&ctx.table, data)?;
        if !id.is_unknown() {
            return Ok(id);
        }
        validate_namespace(namespace)?;
        let id = ctx.allocate();
        index::store_bidirectional(&mut ctx.table, id, data)?;
        ctx.stage.namespace_ids.push((Arc::from(namespace), id));
        Ok(id)
    }

    // -- lookup plumbing ----------------------------------------------------

    /// Resolve a value to its ID against a table view: cache, canonical
    /// encoding, then the legacy literal encoding.
    fn lookup_value_id_in<T>(&self, table: &T, value: &Value) -> Result<ValueId>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        if let Some(id) = self.caches.id_by_value(value) {
            return Ok(id);
        }
        if let Some(data) = self.encode_value_lookup(table, value)? {
            let id = index::find_id(table, &data)?;
            if !id.is_unknown() {
                return Ok(id);
            }
        }
        if let Value::Literal(lit) = value {
            if lit.has_legacy_datatype() {
                let data = encoding::encode_literal(0, lit.lang(), lit.label())?;
                return index::find_id(table, &data);
            }
        }
        Ok(ValueId::UNKNOWN)
    }

    /// Encode a value without creating anything. `None` means a referenced
    /// namespace or datatype is absent, so the value cannot be stored.
    fn encode_value_lookup<T>(&self, table: &T, value: &Value) -> Result<Option<Vec<u8>>>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        match value {
            Value::Iri(iri) => {
                let ns_id = match self.caches.id_by_namespace(iri.namespace()) {
                    Some(id) => id,
                    None => index::find_id(table, encoding::encode_namespace(iri.namespace()))?,
                };
                if ns_id.is_unknown() {
                    return Ok(None);
                }
                Ok(Some(encoding::encode_iri(
                    ns_id.as_embedded_u32()?,
                    iri.local_name(),
                )))
            }
            Value::BNode { id } => Ok(Some(encoding::encode_bnode(id))),
            Value::Literal(lit) => {
                let datatype_id = match lit.datatype() {
                    Some(dt) => {
                        let id = self.lookup_value_id_in(table, &Value::Iri(dt.clone()))?;
                        if id.is_unknown() {
                            return Ok(None);
                        }
                        id.as_embedded_u32()?
                    }
                    None => 0,
                };
                Ok(Some(encoding::encode_literal(
                    datatype_id,
                    lit.lang(),
                    lit.label(),
                )?))
            }
        }
    }

    /// Encode a value in create mode, storing any referenced namespace or
    /// datatype that is not yet present.
    fn encode_value_create(&self, ctx: &mut TxnCtx<'_>, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::Iri(iri) => {
                let ns_id = self.namespace_id_create(ctx, iri.namespace())?;
                Ok(encoding::encode_iri(
                    ns_id.as_embedded_u32()?,
                    iri.local_name(),
                ))
            }
            Value::BNode { id } => Ok(encoding::encode_bnode(id)),
            Value::Literal(lit) => {
                let datatype_id = match lit.datatype() {
                    Some(dt) => self
                        .store_value_in(ctx, &Value::Iri(dt.clone()))?
                        .as_embedded_u32()?,
                    None => 0,
                };
                Ok(encoding::encode_literal(datatype_id, lit.lang(), lit.label())?)
            }
        }
    }

    // -- read plumbing ------------------------------------------------------

    /// Read and decode the value under `id`, stamping and caching it.
    fn read_value<T>(
        &self,
        inner: &StoreInner,
        table: &T,
        id: ValueId,
    ) -> Result<Option<Arc<StoredValue>>>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        let Some(data) = index::get_payload(table, id)? else {
            return Ok(None);
        };
        let value = self.decode_stored(inner, table, &data)?;
        let stored = Arc::new(StoredValue::new(value));
        stored.set_stamp(id, &inner.revision);
        self.caches.put_value(id, Arc::clone(&stored));
        Ok(Some(stored))
    }

    /// Decode a forward payload into a plain value, resolving namespace
    /// and datatype references through the same table view.
    fn decode_stored<T>(&self, inner: &StoreInner, table: &T, data: &[u8]) -> Result<Value>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        match encoding::decode_value(data)? {
            DecodedValue::Iri {
                namespace_id,
                local_name,
            } => {
                let ns_id = ValueId(u64::from(namespace_id));
                let namespace = self.read_namespace(table, ns_id)?.ok_or_else(|| {
                    Error::corrupt(format!("IRI references missing namespace ID {namespace_id}"))
                })?;
                Ok(Value::iri_parts(&*namespace, local_name))
            }
            DecodedValue::BNode { node_id } => Ok(Value::bnode(node_id)),
            DecodedValue::Literal {
                datatype_id,
                lang,
                label,
            } => {
                if let Some(lang) = lang {
                    Ok(Value::lang_literal(label, lang))
                } else if datatype_id != 0 {
                    let dt_id = ValueId(u64::from(datatype_id));
                    let datatype = self.read_value(inner, table, dt_id)?.ok_or_else(|| {
                        Error::corrupt(format!("literal references missing datatype ID {datatype_id}"))
                    })?;
                    match datatype.value() {
                        Value::Iri(iri) => Ok(Value::typed_literal(label, iri.clone())),
                        other => Err(Error::corrupt(format!(
                            "literal datatype ID {datatype_id} resolves to non-IRI {other}"
                        ))),
                    }
                } else {
                    Ok(Value::Literal(Literal::untyped(label)))
                }
            }
        }
    }

    /// Read a namespace string by ID, caching on hit.
    fn read_namespace<T>(&self, table: &T, id: ValueId) -> Result<Option<Arc<str>>>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        if let Some(namespace) = self.caches.namespace_by_id(id) {
            return Ok(Some(namespace));
        }
        let Some(data) = index::get_payload(table, id)? else {
            return Ok(None);
        };
        if !encoding::is_namespace_data(&data) {
            return Err(Error::invalid_argument(format!(
                "ID {} does not reference a namespace",
                id.as_u64()
            )));
        }
        let namespace: Arc<str> = Arc::from(encoding::decode_namespace(&data)?);
        self.caches.put_namespace(id, Arc::clone(&namespace));
        Ok(Some(namespace))
    }
}

impl Drop for ValueStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_namespace(namespace: &str) -> Result<()> {
    match namespace.as_bytes().first() {
        None => Err(Error::invalid_argument("namespace must not be empty")),
        Some(&b) if b <= 0x03 => Err(Error::invalid_argument(format!(
            "namespace must not begin with reserved byte 0x{b:02x}"
        ))),
        Some(_) => Ok(()),
    }
}

/// Syntactic absolute-URI probe: a non-empty scheme followed by a colon.
fn is_absolute_uri(uri: &str) -> bool {
    let Some(colon) = uri.find(':') else {
        return false;
    };
    if colon == 0 {
        return false;
    }
    let mut chars = uri[..colon].chars();
    let first = chars.next().expect("non-empty scheme");
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// ===========================================================================
// Tests
// ===========================================================================
