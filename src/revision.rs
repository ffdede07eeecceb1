//! Revision tokens and ID-stamped value objects.
//!
//! Every value handed out by the store carries a cached `(id, revision)`
//! stamp. The ID is trusted only while the stamp's revision is the store's
//! current revision; `clear()` replaces the revision token, which
//! invalidates every stamp issued before it without touching the value
//! objects themselves.
//!
//! Values hold the revision through a [`Weak`] handle so they never keep a
//! dropped store generation alive; the store owns the only strong
//! reference.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::value::{Value, ValueId};

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// Opaque identity token for one generation of the store.
///
/// Compared by pointer identity only. A new token is issued at open and
/// after every destructive catalog operation.
#[derive(Debug)]
pub struct Revision {
    _anchor: (),
}

impl Revision {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { _anchor: () })
    }
}

// ---------------------------------------------------------------------------
// StoredValue
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Stamp {
    id: ValueId,
    revision: Weak<Revision>,
}

/// A [`Value`] together with its cached ID stamp.
///
/// Stamps are written through interior mutability so that lookup methods
/// can record a resolved ID on a shared value as a side effect. Equality
/// and hashing ignore the stamp.
#[derive(Debug)]
pub struct StoredValue {
    value: Value,
    stamp: Mutex<Stamp>,
}

impl StoredValue {
    /// Wrap a plain value. The result is unstamped until a store operation
    /// resolves or assigns its ID.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            stamp: Mutex::new(Stamp::default()),
        }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The stamped ID, if the stamp was issued under `revision`.
    pub(crate) fn stamped_id(&self, revision: &Arc<Revision>) -> Option<ValueId> {
        let stamp = self.stamp.lock();
        if stamp.id.is_unknown() {
            return None;
        }
        let stamped_under = stamp.revision.upgrade()?;
        if Arc::ptr_eq(&stamped_under, revision) {
            Some(stamp.id)
        } else {
            None
        }
    }

    /// Record the ID this value resolves to under `revision`.
    pub(crate) fn set_stamp(&self, id: ValueId, revision: &Arc<Revision>) {
        *self.stamp.lock() = Stamp {
            id,
            revision: Arc::downgrade(revision),
        };
    }
}

impl PartialEq for StoredValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for StoredValue {}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
