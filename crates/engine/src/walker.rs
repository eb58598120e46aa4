//! The recursive slot walker.
//!
//! Given the storage layout metadata and a [`SlotReader`], produces the flat,
//! depth-annotated record list that the tree builder consumes. All slot
//! arithmetic is done in `U256`; keccak-derived addressing for dynamic data
//! lives in [`crate::reader`].
//!
//! Reads are strictly sequential in visitation order, so two walks over the
//! same word store produce identical output.

use std::{future::Future, pin::Pin};

use alloy_primitives::{B256, U256};
use eyre::{OptionExt, Result, WrapErr};

use crate::{
    coalesce::SlotMap,
    layout::{Encoding, StorageEntry, StorageLayout, TypeDescriptor},
    reader::{data_slot, SlotReader},
    resolver::{classify, fixed_array_len, TypeClass},
};

/// One decoded storage word, tagged with the nesting depth used to rebuild
/// the tree from the flat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: U256,
    pub label: String,
    /// The raw 32-byte word; bit-level decoding within a packed slot is the
    /// consumer's concern.
    pub value: B256,
    pub depth: usize,
}

/// The result of one full walk over a contract's declared storage.
#[derive(Debug, Default)]
pub struct Traversal {
    /// Depth-annotated records in visitation order; no two share a slot.
    pub records: Vec<SlotRecord>,
    /// Entries referencing unrecognized types, plus struct elements of
    /// fixed-size arrays, which are skipped rather than decoded.
    pub skipped: usize,
}

/// Walks a contract's storage layout, reading raw words through `R`.
///
/// Each walk is self-contained: the slot map lives for one traversal and the
/// walker is consumed by [`Self::walk_storage`].
pub struct StorageWalker<'a, R> {
    layout: &'a StorageLayout,
    reader: &'a R,
    skipped: usize,
}

type RecordsFut<'s> = Pin<Box<dyn Future<Output = Result<Vec<SlotRecord>>> + Send + 's>>;

impl<'a, R: SlotReader> StorageWalker<'a, R> {
    pub fn new(layout: &'a StorageLayout, reader: &'a R) -> Self {
        Self { layout, reader, skipped: 0 }
    }

    /// Walks every declared storage entry in declaration order.
    ///
    /// Best-effort: a failed read or a malformed type aborts only the entry
    /// being traversed; records accumulated up to that point are kept.
    pub async fn walk_storage(mut self) -> Traversal {
        let layout = self.layout;
        let mut map = SlotMap::new();
        for entry in &layout.storage {
            if let Err(err) = self.walk_entry(entry, &mut map).await {
                warn!(label = %entry.label, %err, "aborted traversal of storage entry");
            }
        }
        Traversal { records: map.into_records(), skipped: self.skipped }
    }

    async fn walk_entry(&mut self, entry: &StorageEntry, map: &mut SlotMap) -> Result<()> {
        let slot = entry.declared_slot()?;
        let type_id = entry.storage_type.trim();
        match classify(type_id) {
            TypeClass::PackedScalar => {
                if !map.coalesce_packed(slot, &entry.label) {
                    let value = self.reader.read_slot(slot).await?;
                    map.insert(SlotRecord { slot, label: entry.label.clone(), value, depth: 0 });
                }
            }
            // Mappings cannot be enumerated without key knowledge; only the
            // base slot word is reported.
            TypeClass::FixedBytes | TypeClass::Mapping => {
                let value = self.reader.read_slot(slot).await?;
                map.insert(SlotRecord { slot, label: entry.label.clone(), value, depth: 0 });
            }
            TypeClass::DynamicArray => {
                let desc = self.descriptor(type_id)?;
                let records = self.walk_dynamic_array(desc, slot, entry.label.clone(), 0).await?;
                map.merge(records);
            }
            TypeClass::FixedArray => {
                let records = self.walk_fixed_array(type_id, slot, &entry.label, 0).await?;
                map.merge(records);
            }
            TypeClass::BytesLike => {
                let records = self.walk_bytes(slot, &entry.label, 0).await?;
                map.merge(records);
            }
            TypeClass::Struct => {
                let desc = self.descriptor(type_id)?;
                let records = self.walk_struct(desc, slot, entry.label.clone(), 0).await?;
                map.merge(records);
            }
            TypeClass::Unknown => self.skip(type_id, &entry.label),
        }
        Ok(())
    }

    /// String/bytes rule. The declaring slot either holds a short value
    /// in-place (low bit clear) or, for long values, `2 * byteLength + 1`,
    /// with the data spilling into `keccak256(leftPad32(slot)) + i`.
    async fn walk_bytes(&mut self, slot: U256, label: &str, depth: usize) -> Result<Vec<SlotRecord>> {
        let word = self.reader.read_slot(slot).await?;
        let mut records = vec![SlotRecord { slot, label: label.to_string(), value: word, depth }];

        let raw = U256::from_be_bytes(word.0);
        if !raw.bit(0) {
            // Short form: self-contained, no continuation slots.
            return Ok(records);
        }

        let length = u64::try_from((raw - U256::from(1)) / U256::from(2))
            .wrap_err_with(|| format!("unreasonable byte length for `{label}`"))?;
        let base = data_slot(slot);
        for i in 0..length.div_ceil(32) {
            let slot = base + U256::from(i);
            let value = self.reader.read_slot(slot).await?;
            records.push(SlotRecord { slot, label: format!("{label}[{i}]"), value, depth: depth + 1 });
        }
        Ok(records)
    }

    /// Fixed-size array rule: `ceil(N / elementsPerSlot)` consecutive slots
    /// starting at the declaring slot. Struct elements are not decoded.
    async fn walk_fixed_array(
        &mut self,
        type_id: &str,
        slot: U256,
        label: &str,
        depth: usize,
    ) -> Result<Vec<SlotRecord>> {
        let desc = self.descriptor(type_id)?;
        let base_id = desc
            .base
            .as_deref()
            .ok_or_eyre(format!("array type `{}` has no base type", desc.label))?
            .trim();
        if classify(base_id) == TypeClass::Struct {
            self.skip(base_id, label);
            return Ok(Vec::new());
        }
        let base_desc = self.descriptor(base_id)?;

        let length = fixed_array_len(&desc.label).unwrap_or_default();
        let elements_per_slot = (32 / base_desc.byte_width()?.max(1)).max(1);

        let mut records = Vec::new();
        for i in 0..length.div_ceil(elements_per_slot) {
            let element_slot = slot + U256::from(i);
            if base_desc.encoding == Encoding::Bytes {
                records.extend(self.walk_bytes(element_slot, &format!("{label}[{i}]"), depth).await?);
            } else {
                let value = self.reader.read_slot(element_slot).await?;
                records.push(SlotRecord {
                    slot: element_slot,
                    label: format!("{label}[{i}]"),
                    value,
                    depth,
                });
            }
        }
        Ok(records)
    }

    /// Dynamic array rule: the declaring slot holds the element count; data
    /// starts at `keccak256(leftPad32(slot))`. Struct elements occupy
    /// `ceil(structBytes / 32)` consecutive slots each.
    fn walk_dynamic_array<'s>(
        &'s mut self,
        desc: &'a TypeDescriptor,
        base_slot: U256,
        label: String,
        depth: usize,
    ) -> RecordsFut<'s> {
        Box::pin(async move {
            let base_id = desc
                .base
                .as_deref()
                .ok_or_eyre(format!("array type `{}` has no base type", desc.label))?
                .trim();

            let raw_length = self.reader.read_slot(base_slot).await?;
            let mut records =
                vec![SlotRecord { slot: base_slot, label: label.clone(), value: raw_length, depth }];

            let length = u64::try_from(U256::from_be_bytes(raw_length.0))
                .wrap_err_with(|| format!("unreasonable length for dynamic array `{label}`"))?;
            let data_base = data_slot(base_slot);

            for i in 0..length {
                let element_slot = data_base + U256::from(i);
                let element_label = format!("{label}[{i}]");
                match classify(base_id) {
                    TypeClass::DynamicArray => {
                        let nested = self.descriptor(base_id)?;
                        let child =
                            self.walk_dynamic_array(nested, element_slot, element_label, depth + 1);
                        records.extend(child.await?);
                    }
                    TypeClass::BytesLike => {
                        records.extend(self.walk_bytes(element_slot, &element_label, depth + 1).await?);
                    }
                    TypeClass::Struct => {
                        let nested = self.descriptor(base_id)?;
                        let stride = nested.byte_width()?.div_ceil(32);
                        let struct_slot = data_base + U256::from(i) * U256::from(stride);
                        let child = self.walk_struct(nested, struct_slot, element_label, depth + 1);
                        records.extend(child.await?);
                    }
                    _ => {
                        let value = self.reader.read_slot(element_slot).await?;
                        records.push(SlotRecord {
                            slot: element_slot,
                            label: element_label,
                            value,
                            depth: depth + 1,
                        });
                    }
                }
            }
            Ok(records)
        })
    }

    /// Struct rule: each member lives at `base + member.slot`, labeled
    /// `<parent> -> <member>`; packed members coalesce within the struct's
    /// own slot map before the result is merged into the caller's.
    fn walk_struct<'s>(
        &'s mut self,
        desc: &'a TypeDescriptor,
        base_slot: U256,
        base_label: String,
        depth: usize,
    ) -> RecordsFut<'s> {
        Box::pin(async move {
            let members = desc
                .members
                .as_ref()
                .ok_or_eyre(format!("struct type `{}` has no members", desc.label))?;

            let mut map = SlotMap::new();
            for member in members {
                let label = format!("{base_label} -> {}", member.label);
                let slot = base_slot + member.slot_offset()?;
                let type_id = member.member_type.trim();
                match classify(type_id) {
                    TypeClass::PackedScalar => {
                        if !map.coalesce_packed(slot, &label) {
                            let value = self.reader.read_slot(slot).await?;
                            map.insert(SlotRecord { slot, label, value, depth });
                        }
                    }
                    TypeClass::FixedBytes | TypeClass::Mapping => {
                        let value = self.reader.read_slot(slot).await?;
                        map.insert(SlotRecord { slot, label, value, depth });
                    }
                    TypeClass::DynamicArray => {
                        let nested = self.descriptor(type_id)?;
                        let child = self.walk_dynamic_array(nested, slot, label, depth + 1);
                        map.merge(child.await?);
                    }
                    TypeClass::FixedArray => {
                        map.merge(self.walk_fixed_array(type_id, slot, &label, depth).await?);
                    }
                    TypeClass::BytesLike => {
                        map.merge(self.walk_bytes(slot, &label, depth).await?);
                    }
                    TypeClass::Struct => {
                        let nested = self.descriptor(type_id)?;
                        let child = self.walk_struct(nested, slot, label, depth);
                        map.merge(child.await?);
                    }
                    TypeClass::Unknown => self.skip(type_id, &label),
                }
            }
            Ok(map.into_records())
        })
    }

    fn descriptor(&self, type_id: &str) -> Result<&'a TypeDescriptor> {
        self.layout
            .descriptor(type_id)
            .ok_or_eyre(format!("type `{type_id}` is missing from the type dictionary"))
    }

    fn skip(&mut self, type_id: &str, label: &str) {
        self.skipped += 1;
        debug!(type_id, label, "skipping entry with unsupported storage type");
    }
}
