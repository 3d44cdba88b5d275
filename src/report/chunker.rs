//! Byte-bounded chunk planning for evidence delivery.
//!
//! The transport imposes a hard ceiling on a single payload. A bundle
//! that fits goes out as one chunk. One that does not is split
//! field-by-field: each large top-level array is cut into fixed-size
//! slices (halved further while a slice still overflows), then the
//! remaining keys are partitioned into small groups. Chunks of one
//! kind, concatenated in index order, reconstruct the original
//! collections losslessly.

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The evidence kinds delivered independently. A failed send aborts
/// the remaining chunks of its own kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Detection,
    Security,
    SuspiciousFiles,
    RecycleBin,
    RegistryActivity,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Detection => "detection",
            ChunkKind::Security => "security",
            ChunkKind::SuspiciousFiles => "suspicious_files",
            ChunkKind::RecycleBin => "recycle_bin",
            ChunkKind::RegistryActivity => "registry_activity",
        }
    }

    /// Initial slice length when this kind's arrays get cut.
    fn slice_size(&self) -> usize {
        match self {
            ChunkKind::Detection => 10,
            ChunkKind::Security => 5,
            ChunkKind::SuspiciousFiles => 20,
            ChunkKind::RecycleBin => 3,
            ChunkKind::RegistryActivity => 5,
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys per chunk when the non-array remainder still overflows.
const REST_KEY_GROUP: usize = 2;

/// One self-describing delivery unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryChunk {
    pub kind: ChunkKind,
    /// 1-based position within the kind
    pub index: usize,
    /// Total chunks of this kind
    pub total: usize,
    pub payload: Value,
}

impl DeliveryChunk {
    /// Serialized wire size of this chunk.
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(serde_json::to_vec(self)?.len())
    }
}

/// Plans chunks under a byte ceiling.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    ceiling: usize,
}

impl Chunker {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Whether a payload fits the ceiling inside its envelope. Index
    /// and total are measured at a conservative width so the final
    /// numbering can only shrink the chunk.
    fn fits(&self, kind: ChunkKind, payload: &Value) -> Result<bool> {
        let probe = DeliveryChunk {
            kind,
            index: 9999,
            total: 9999,
            payload: payload.clone(),
        };
        Ok(probe.serialized_size()? <= self.ceiling)
    }

    /// Plan the chunk sequence for one evidence kind.
    pub fn plan(&self, kind: ChunkKind, payload: Value) -> Result<Vec<DeliveryChunk>> {
        let mut payloads: Vec<Value> = Vec::new();

        if self.fits(kind, &payload)? {
            payloads.push(payload);
        } else {
            let object = match payload {
                Value::Object(map) => map,
                other => {
                    // Non-object payloads cannot be split field-by-field.
                    log::warn!(
                        "{} payload exceeds ceiling and is not splittable",
                        kind
                    );
                    return Ok(vec![DeliveryChunk {
                        kind,
                        index: 1,
                        total: 1,
                        payload: other,
                    }]);
                }
            };

            let mut rest = serde_json::Map::new();
            for (key, value) in object {
                match value {
                    Value::Array(items) if !items.is_empty() => {
                        self.emit_array_slices(kind, &key, items, kind.slice_size(), &mut payloads)?;
                    }
                    other => {
                        rest.insert(key, other);
                    }
                }
            }

            self.emit_rest(kind, rest, &mut payloads)?;
        }

        let total = payloads.len();
        Ok(payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| DeliveryChunk {
                kind,
                index: i + 1,
                total,
                payload,
            })
            .collect())
    }

    /// Cut one array field into fitting slices, halving any slice that
    /// still overflows. A single item over the ceiling is emitted as-is
    /// with a warning; it cannot be split further.
    fn emit_array_slices(
        &self,
        kind: ChunkKind,
        key: &str,
        items: Vec<Value>,
        slice_len: usize,
        payloads: &mut Vec<Value>,
    ) -> Result<()> {
        let slice_len = slice_len.max(1);
        let slices: Vec<Vec<Value>> = items
            .chunks(slice_len)
            .map(|slice| slice.to_vec())
            .collect();

        for slice in slices {
            let mut map = serde_json::Map::new();
            map.insert(key.to_string(), Value::Array(slice.clone()));
            let candidate = Value::Object(map);
            if self.fits(kind, &candidate)? {
                payloads.push(candidate);
            } else if slice.len() > 1 {
                let half = slice.len().div_ceil(2);
                self.emit_array_slices(kind, key, slice, half, payloads)?;
            } else {
                log::warn!(
                    "{} item in field '{}' exceeds the {} byte ceiling on its own",
                    kind,
                    key,
                    self.ceiling
                );
                payloads.push(candidate);
            }
        }
        Ok(())
    }

    /// Emit the non-array remainder: one chunk when it fits, else
    /// groups of two keys.
    fn emit_rest(
        &self,
        kind: ChunkKind,
        rest: serde_json::Map<String, Value>,
        payloads: &mut Vec<Value>,
    ) -> Result<()> {
        if rest.is_empty() {
            return Ok(());
        }

        let whole = Value::Object(rest.clone());
        if self.fits(kind, &whole)? {
            payloads.push(whole);
            return Ok(());
        }

        let entries: Vec<(String, Value)> = rest.into_iter().collect();
        for group in entries.chunks(REST_KEY_GROUP) {
            let mut map = serde_json::Map::new();
            for (key, value) in group {
                map.insert(key.clone(), value.clone());
            }
            let candidate = Value::Object(map);
            if !self.fits(kind, &candidate)? {
                log::warn!("{} key group exceeds the ceiling on its own", kind);
            }
            payloads.push(candidate);
        }
        Ok(())
    }
}

/// Rebuild one kind's original payload from its chunks: arrays are
/// concatenated in index order, scalar keys taken from their first
/// appearance. The inverse of `Chunker::plan` for object payloads.
pub fn reassemble(chunks: &[DeliveryChunk]) -> Value {
    let mut ordered: Vec<&DeliveryChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);

    let mut merged = serde_json::Map::new();
    for chunk in ordered {
        if let Value::Object(obj) = &chunk.payload {
            for (key, value) in obj {
                match value {
                    Value::Array(items) => {
                        let slot = merged
                            .entry(key.clone())
                            .or_insert_with(|| Value::Array(Vec::new()));
                        if let Value::Array(acc) = slot {
                            acc.extend(items.iter().cloned());
                        }
                    }
                    other => {
                        merged.entry(key.clone()).or_insert_with(|| other.clone());
                    }
                }
            }
        }
    }
    Value::Object(merged)
}
