//! Loading storage layout metadata from build output on disk.

use std::{fs, path::Path};

use eyre::{Result, WrapErr};
use serde_json::Value;
use slotscope_engine::StorageLayout;

/// Loads a storage layout from `path`.
///
/// Accepts either a bare solc `storageLayout` object or a full forge/solc
/// contract artifact carrying one under its `storageLayout` key. The layout
/// is trusted build output; anything malformed surfaces as an error with the
/// file's path for context.
pub fn load_storage_layout(path: impl AsRef<Path>) -> Result<StorageLayout> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read storage layout from {}", path.display()))?;
    let layout = parse_storage_layout(&raw)
        .wrap_err_with(|| format!("malformed storage layout in {}", path.display()))?;

    debug!(path = %path.display(), entries = layout.storage.len(), "loaded storage layout");
    Ok(layout)
}

/// Parses a storage layout from raw JSON, unwrapping a surrounding artifact
/// if present.
pub fn parse_storage_layout(raw: &str) -> Result<StorageLayout> {
    let value: Value = serde_json::from_str(raw)?;
    let layout = match value.get("storageLayout") {
        Some(inner) => inner.clone(),
        None => value,
    };
    Ok(serde_json::from_value(layout)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const BARE_LAYOUT: &str = r#"{
        "storage": [
            { "astId": 3, "contract": "src/C.sol:C", "label": "owner",
              "offset": 0, "slot": "0", "type": "t_address" }
        ],
        "types": {
            "t_address": { "encoding": "inplace", "label": "address", "numberOfBytes": "20" }
        }
    }"#;

    #[test]
    fn parses_a_bare_layout() {
        let layout = parse_storage_layout(BARE_LAYOUT).unwrap();
        assert_eq!(layout.storage.len(), 1);
        assert_eq!(layout.storage[0].label, "owner");
    }

    #[test]
    fn unwraps_a_forge_artifact() {
        let artifact = format!(r#"{{ "abi": [], "storageLayout": {BARE_LAYOUT} }}"#);
        let layout = parse_storage_layout(&artifact).unwrap();
        assert_eq!(layout.storage.len(), 1);
    }

    #[test]
    fn loads_from_disk_with_path_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BARE_LAYOUT.as_bytes()).unwrap();
        let layout = load_storage_layout(file.path()).unwrap();
        assert_eq!(layout.storage[0].storage_type, "t_address");

        let err = load_storage_layout("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("not/here.json"));
    }
}
