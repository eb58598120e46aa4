//! Classification of solc type identifiers.
//!
//! Type identifiers are classified once, up front, into a closed set of
//! variants; the walker dispatches over the variant instead of re-testing
//! string prefixes at every recursion level.

/// The storage-relevant shape of a type, derived purely from its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// bool/uint/int/address/enum: may share a slot with siblings.
    PackedScalar,
    /// `t_bytes32`: a full slot of its own, never packed.
    FixedBytes,
    /// `t_array(..)dyn_storage`.
    DynamicArray,
    /// `t_array(..)N_storage`: element count lives in the display label.
    FixedArray,
    /// Opaque without key knowledge; only the base slot is reported.
    Mapping,
    /// string/bytes with the short-string optimization.
    BytesLike,
    Struct,
    /// Not one of ours; the declaring entry is skipped.
    Unknown,
}

const PACKED_PREFIXES: &[&str] = &["t_bool", "t_uint", "t_int", "t_address", "t_enum"];

/// Classifies a type identifier such as `t_uint256` or
/// `t_array(t_struct(Pair)storage)dyn_storage`.
pub fn classify(type_id: &str) -> TypeClass {
    let type_id = type_id.trim();
    if PACKED_PREFIXES.iter().any(|prefix| type_id.starts_with(prefix)) {
        TypeClass::PackedScalar
    } else if type_id.starts_with("t_bytes32") {
        TypeClass::FixedBytes
    } else if type_id.starts_with("t_array") {
        if type_id.ends_with("dyn_storage") {
            TypeClass::DynamicArray
        } else if type_id.ends_with("_storage") {
            TypeClass::FixedArray
        } else {
            TypeClass::Unknown
        }
    } else if type_id.starts_with("t_mapping") {
        TypeClass::Mapping
    } else if type_id.starts_with("t_string_storage") || type_id.starts_with("t_bytes_storage") {
        TypeClass::BytesLike
    } else if type_id.starts_with("t_struct") {
        TypeClass::Struct
    } else {
        TypeClass::Unknown
    }
}

/// Parses the element count from the trailing `[N]` of a fixed-size array's
/// display label (e.g. `uint8[5]` -> 5).
pub fn fixed_array_len(display_label: &str) -> Option<u64> {
    let rest = display_label.trim_end().strip_suffix(']')?;
    let open = rest.rfind('[')?;
    rest[open + 1..].parse().ok()
}
