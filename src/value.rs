//! RDF value model: IRIs, blank nodes, literals, and value IDs.
//!
//! Values are plain immutable data (`Clone + Eq + Hash`) and carry no store
//! state; the ID/revision stamp lives in [`crate::revision::StoredValue`].
//! IRIs are split into a namespace and a local name so that the namespace
//! can be dictionary-compressed: many IRIs share one stored namespace entry
//! and reference it by ID.

use std::fmt;

use crate::error::{Error, Result};
use crate::vocab;

// ---------------------------------------------------------------------------
// ValueId
// ---------------------------------------------------------------------------

/// Dictionary ID of a stored value or namespace (u64).
///
/// `0` is reserved and means "unknown" — the value is not in the store.
/// IDs are assigned monotonically from 1 and never change or get reused.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(transparent)]
pub struct ValueId(pub u64);

impl ValueId {
    /// The reserved "not present" sentinel.
    pub const UNKNOWN: ValueId = ValueId(0);

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_u64(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self.0 == 0
    }

    /// The u32 form embedded in IRI and literal payloads.
    ///
    /// The on-disk format reserves four bytes for namespace and datatype
    /// IDs; an ID that no longer fits is a hard error, never a truncation.
    #[inline]
    pub(crate) fn as_embedded_u32(self) -> Result<u32> {
        u32::try_from(self.0).map_err(|_| Error::IdOverflow(self.0))
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Iri
// ---------------------------------------------------------------------------

/// An IRI split into namespace and local name.
///
/// The namespace keeps its trailing delimiter, so the full IRI is always
/// `namespace + local_name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Iri {
    namespace: String,
    local_name: String,
}

impl Iri {
    /// Build an IRI from pre-split parts. No validation beyond emptiness of
    /// the namespace happens here; the namespace byte rules are enforced
    /// when the IRI is stored.
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Split a full IRI string into namespace and local name.
    ///
    /// The split point is after the last `#`, else the last `/`, else the
    /// last `:`. An IRI containing none of these cannot be absolute and is
    /// rejected.
    pub fn parse(iri: &str) -> Result<Self> {
        let idx = iri
            .rfind('#')
            .or_else(|| iri.rfind('/'))
            .or_else(|| iri.rfind(':'))
            .ok_or_else(|| {
                Error::invalid_argument(format!("not an absolute IRI: {iri:?}"))
            })?;
        let (ns, local) = iri.split_at(idx + 1);
        Ok(Self::new(ns, local))
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Compare against a full IRI string without allocating.
    pub fn is(&self, full: &str) -> bool {
        full.len() == self.namespace.len() + self.local_name.len()
            && full.starts_with(&self.namespace)
            && full.ends_with(&self.local_name)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.namespace, self.local_name)
    }
}

// ---------------------------------------------------------------------------
// Literal
// ---------------------------------------------------------------------------

/// An RDF literal: lexical label, optional language tag, optional datatype.
///
/// Invariant: a language-tagged literal carries no explicit datatype (its
/// type is implied and its encoding stores a zero datatype ID). The
/// constructors enforce this.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    label: String,
    lang: Option<String>,
    datatype: Option<Iri>,
}

impl Literal {
    /// A plain string literal, typed `xsd:string`.
    pub fn string(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lang: None,
            datatype: Some(Iri::parse(vocab::xsd::STRING).expect("xsd:string is absolute")),
        }
    }

    /// A language-tagged literal. No explicit datatype is kept.
    pub fn lang_tagged(label: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    /// A literal with an explicit datatype IRI.
    pub fn typed(label: impl Into<String>, datatype: Iri) -> Self {
        Self {
            label: label.into(),
            lang: None,
            datatype: Some(datatype),
        }
    }

    /// A literal with neither language nor datatype, as decoded from the
    /// legacy zero-datatype form.
    pub(crate) fn untyped(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lang: None,
            datatype: None,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    #[inline]
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    /// True if the datatype is `xsd:string` or `rdf:langString`, the two
    /// types that were historically stored with a zero datatype ID.
    pub(crate) fn has_legacy_datatype(&self) -> bool {
        match &self.datatype {
            Some(dt) => dt.is(vocab::xsd::STRING) || dt.is(vocab::rdf::LANG_STRING),
            None => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.label)?;
        if let Some(lang) = &self.lang {
            write!(f, "@{lang}")?;
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{dt}>")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// An RDF term: IRI, blank node, or literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Iri(Iri),
    BNode { id: String },
    Literal(Literal),
}

impl Value {
    /// An IRI value parsed from a full IRI string.
    pub fn iri(iri: &str) -> Result<Self> {
        Ok(Value::Iri(Iri::parse(iri)?))
    }

    /// An IRI value from pre-split namespace and local name.
    pub fn iri_parts(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Value::Iri(Iri::new(namespace, local_name))
    }

    /// A blank node with the given node identifier.
    pub fn bnode(id: impl Into<String>) -> Self {
        Value::BNode { id: id.into() }
    }

    /// A plain string literal (`xsd:string`).
    pub fn literal(label: impl Into<String>) -> Self {
        Value::Literal(Literal::string(label))
    }

    /// A language-tagged literal.
    pub fn lang_literal(label: impl Into<String>, lang: impl Into<String>) -> Self {
        Value::Literal(Literal::lang_tagged(label, lang))
    }

    /// A literal with an explicit datatype.
    pub fn typed_literal(label: impl Into<String>, datatype: Iri) -> Self {
        Value::Literal(Literal::typed(label, datatype))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Iri(iri) => write!(f, "<{iri}>"),
            Value::BNode { id } => write!(f, "_:{id}"),
            Value::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
