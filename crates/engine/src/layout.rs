//! Serde model of the compiler-emitted storage layout.
//!
//! This mirrors the `storageLayout` object emitted by solc (and surfaced in
//! forge artifacts): a flat list of declared storage variables plus a type
//! dictionary describing their encodings. The layout is trusted input; the
//! engine does not validate it beyond pattern-matching on type identifiers.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// A contract's full storage layout: declared variables in declaration order
/// plus the type dictionary they reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageLayout {
    pub storage: Vec<StorageEntry>,
    pub types: BTreeMap<String, TypeDescriptor>,
}

impl StorageLayout {
    /// Looks up the descriptor for a type identifier.
    pub fn descriptor(&self, type_id: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_id.trim())
    }
}

/// One top-level storage variable declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub label: String,
    /// Declared slot number, as a decimal string (solc convention).
    pub slot: String,
    #[serde(rename = "type")]
    pub storage_type: String,
}

impl StorageEntry {
    /// The declared slot as an arbitrary-precision integer.
    pub fn declared_slot(&self) -> Result<U256> {
        parse_slot(&self.slot)
    }
}

/// How a type's values are laid out in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Packed into the declaring slot.
    Inplace,
    /// String/bytes short-or-long form.
    Bytes,
    Mapping,
    DynamicArray,
}

/// One entry of the type dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub encoding: Encoding,
    /// Display label, e.g. `uint256` or `uint8[5]`. Fixed-size array lengths
    /// are only recoverable from the trailing `[N]` here.
    pub label: String,
    /// Size in bytes when statically known, as a decimal string.
    pub number_of_bytes: String,
    /// Element type for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Members for struct types, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<StructMember>>,
}

impl TypeDescriptor {
    /// Statically known size in bytes.
    pub fn byte_width(&self) -> Result<u64> {
        self.number_of_bytes
            .parse()
            .wrap_err_with(|| format!("invalid numberOfBytes for type `{}`", self.label))
    }
}

/// One member of a struct type. `slot` is the offset relative to the struct's
/// base slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructMember {
    pub label: String,
    pub slot: String,
    #[serde(rename = "type")]
    pub member_type: String,
}

impl StructMember {
    /// The member's slot offset within the declaring struct.
    pub fn slot_offset(&self) -> Result<U256> {
        parse_slot(&self.slot)
    }
}

/// Parses a slot number from its decimal (or 0x-prefixed hex) string form.
pub fn parse_slot(raw: &str) -> Result<U256> {
    raw.trim().parse().wrap_err_with(|| format!("invalid slot number `{raw}`"))
}
