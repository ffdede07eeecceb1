//! Deterministic byte encodings for values and namespaces.
//!
//! These layouts are the durability contract of the store; any change is a
//! format break. All multi-byte integers are big-endian.
//!
//! - IRI:     `0x01 ‖ u32 namespace-ID ‖ UTF-8 local name`
//! - BNode:   `0x02 ‖ UTF-8 node ID`
//! - Literal: `0x03 ‖ u32 datatype-ID ‖ u8 lang length ‖ lang ‖ label`
//! - Namespace: raw UTF-8; recognized by a first byte outside the three
//!   value markers.
//!
//! A zero namespace/datatype ID slot means "none". Resolution of the IDs
//! (and the legacy zero-datatype literal lookup) happens in the store;
//! this module only deals in resolved u32 IDs and raw bytes.

use crate::error::{Error, Result};

/// First payload byte of an encoded IRI.
pub const URI_VALUE: u8 = 0x01;
/// First payload byte of an encoded blank node.
pub const BNODE_VALUE: u8 = 0x02;
/// First payload byte of an encoded literal.
pub const LITERAL_VALUE: u8 = 0x03;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode an IRI with a resolved namespace ID.
pub fn encode_iri(namespace_id: u32, local_name: &str) -> Vec<u8> {
    let local = local_name.as_bytes();
    let mut data = Vec::with_capacity(5 + local.len());
    data.push(URI_VALUE);
    data.extend_from_slice(&namespace_id.to_be_bytes());
    data.extend_from_slice(local);
    data
}

/// Encode a blank node.
pub fn encode_bnode(node_id: &str) -> Vec<u8> {
    let id = node_id.as_bytes();
    let mut data = Vec::with_capacity(1 + id.len());
    data.push(BNODE_VALUE);
    data.extend_from_slice(id);
    data
}

/// Encode a literal with a resolved datatype ID (0 = no datatype).
///
/// The language tag occupies a single length byte; tags longer than 255
/// bytes are not representable.
pub fn encode_literal(datatype_id: u32, lang: Option<&str>, label: &str) -> Result<Vec<u8>> {
    let lang_bytes = lang.map(str::as_bytes).unwrap_or_default();
    if lang_bytes.len() > u8::MAX as usize {
        return Err(Error::invalid_argument(format!(
            "language tag exceeds 255 bytes: {:?}",
            lang.unwrap_or_default()
        )));
    }
    let label_bytes = label.as_bytes();

    let mut data = Vec::with_capacity(6 + lang_bytes.len() + label_bytes.len());
    data.push(LITERAL_VALUE);
    data.extend_from_slice(&datatype_id.to_be_bytes());
    data.push(lang_bytes.len() as u8);
    data.extend_from_slice(lang_bytes);
    data.extend_from_slice(label_bytes);
    Ok(data)
}

/// Namespace payloads are the raw UTF-8 bytes of the namespace string.
#[inline]
pub fn encode_namespace(namespace: &str) -> &[u8] {
    namespace.as_bytes()
}

/// True if a forward payload holds a namespace rather than a value.
#[inline]
pub fn is_namespace_data(data: &[u8]) -> bool {
    !matches!(data.first(), Some(&URI_VALUE) | Some(&BNODE_VALUE) | Some(&LITERAL_VALUE))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded value payload, borrowing from the raw bytes. Namespace and
/// datatype IDs are unresolved.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodedValue<'a> {
    Iri {
        namespace_id: u32,
        local_name: &'a str,
    },
    BNode {
        node_id: &'a str,
    },
    Literal {
        datatype_id: u32,
        lang: Option<&'a str>,
        label: &'a str,
    },
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::corrupt(format!("invalid UTF-8 in {what}: {e}")))
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(bytes.try_into().expect("4-byte slice"))
}

/// Decode a value payload, dispatching on the first byte.
///
/// Namespace payloads are not values; passing one here (or any other
/// unrecognized discriminant) is an invalid-argument error per the public
/// decode contract.
pub fn decode_value(data: &[u8]) -> Result<DecodedValue<'_>> {
    match data.first() {
        Some(&URI_VALUE) => {
            if data.len() < 5 {
                return Err(Error::corrupt("IRI payload shorter than 5 bytes"));
            }
            Ok(DecodedValue::Iri {
                namespace_id: be_u32(&data[1..5]),
                local_name: utf8(&data[5..], "IRI local name")?,
            })
        }
        Some(&BNODE_VALUE) => Ok(DecodedValue::BNode {
            node_id: utf8(&data[1..], "blank node ID")?,
        }),
        Some(&LITERAL_VALUE) => {
            if data.len() < 6 {
                return Err(Error::corrupt("literal payload shorter than 6 bytes"));
            }
            let datatype_id = be_u32(&data[1..5]);
            let lang_len = data[5] as usize;
            if data.len() < 6 + lang_len {
                return Err(Error::corrupt("literal payload truncated in language tag"));
            }
            let lang = if lang_len > 0 {
                Some(utf8(&data[6..6 + lang_len], "language tag")?)
            } else {
                None
            };
            Ok(DecodedValue::Literal {
                datatype_id,
                lang,
                label: utf8(&data[6 + lang_len..], "literal label")?,
            })
        }
        Some(_) => Err(Error::invalid_argument(
            "namespace payload cannot be decoded as a value",
        )),
        None => Err(Error::corrupt("empty value payload")),
    }
}

/// Decode a namespace payload.
pub fn decode_namespace(data: &[u8]) -> Result<&str> {
    utf8(data, "namespace")
}

// ===========================================================================
// Tests
// ===========================================================================
