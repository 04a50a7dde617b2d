//! Deterministic text encoding of object dictionaries.
//!
//! Dedup correctness depends on equal logical values producing byte-equal
//! output on every platform, so this is the one place allowed to touch
//! `serde_json` formatting knobs; everything else just calls [`to_canonical_json`].

use serde::Serialize;

use crate::error::Result;
use crate::hash::{hash_bytes, HashId};

/// Encode `value` as canonical JSON: UTF-8 text, object keys sorted at every
/// depth, two-space indentation, no trailing newline beyond what the encoder
/// itself emits.
///
/// Values are first converted to a generic [`serde_json::Value`] tree so that
/// map-valued fields (Tree's `directories`/`files`) sort by key regardless of
/// their original in-memory order — `serde_json::Map` is `BTreeMap`-backed
/// whenever the crate's `preserve_order` feature is off, which it is here.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

/// Encode and hash in one step: the digest objects are addressed by.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<HashId> {
    let encoded = to_canonical_json(value)?;
    Ok(hash_bytes(encoded.as_bytes()))
}
