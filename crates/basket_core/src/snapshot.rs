//! Versioned model snapshots
//!
//! A snapshot is canonical JSON with a format tag, a format version, a
//! creation timestamp and a BLAKE3 checksum over the payload (parameters,
//! catalog and rules). The timestamp is metadata and is not covered by the
//! checksum, so retraining the same corpus yields the same model hash.

use crate::errors::{BasketError, CorruptModelError};
use crate::rules::Rule;
use crate::serde_canon::{blake3_hex, hash_canonical_hex, to_canonical_json};
use crate::store::Catalog;
use crate::types::TrainingParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Format tag written into every snapshot
pub const SNAPSHOT_FORMAT: &str = "basket-model";

/// Current (and only accepted) snapshot version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Decoded contents of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub params: TrainingParams,
    pub catalog: Catalog,
    pub rules: Vec<Rule>,
    /// Unix seconds at save time
    pub created_at: i64,
    /// Checksum of the payload, doubles as the model hash
    pub checksum: String,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    params: &'a TrainingParams,
    catalog: &'a Catalog,
    rules: &'a [Rule],
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    created_at: i64,
    checksum: &'a str,
    #[serde(flatten)]
    payload: PayloadRef<'a>,
}

// `format` and `version` are checked on the raw value before decoding
#[derive(Deserialize)]
struct Envelope {
    created_at: i64,
    checksum: String,
    params: TrainingParams,
    catalog: Catalog,
    rules: Vec<Rule>,
}

/// Checksum of (params, catalog, rules) as stored in a snapshot
pub fn payload_checksum(
    rules: &[Rule],
    catalog: &Catalog,
    params: &TrainingParams,
) -> Result<String, CorruptModelError> {
    hash_canonical_hex(&PayloadRef {
        params,
        catalog,
        rules,
    })
    .map_err(|e| CorruptModelError::Encode(e.to_string()))
}

/// Encode a trained model into a snapshot blob.
pub fn save(
    rules: &[Rule],
    catalog: &Catalog,
    params: &TrainingParams,
) -> Result<Vec<u8>, CorruptModelError> {
    validate_content(rules, catalog, params)?;

    let checksum = payload_checksum(rules, catalog, params)?;
    let envelope = EnvelopeRef {
        format: SNAPSHOT_FORMAT,
        version: SNAPSHOT_VERSION,
        created_at: chrono::Utc::now().timestamp(),
        checksum: &checksum,
        payload: PayloadRef {
            params,
            catalog,
            rules,
        },
    };

    to_canonical_json(&envelope)
        .map(String::into_bytes)
        .map_err(|e| CorruptModelError::Encode(e.to_string()))
}

/// Decode a snapshot blob, rejecting anything that is not exactly a valid
/// version-1 snapshot.
pub fn load(blob: &[u8]) -> Result<ModelSnapshot, CorruptModelError> {
    let value: Value =
        serde_json::from_slice(blob).map_err(|e| CorruptModelError::Malformed(e.to_string()))?;

    let format = value
        .get("format")
        .and_then(Value::as_str)
        .ok_or_else(|| CorruptModelError::Malformed("missing `format` tag".to_string()))?;
    if format != SNAPSHOT_FORMAT {
        return Err(CorruptModelError::UnknownFormat(format.to_string()));
    }

    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| CorruptModelError::Malformed("missing `version`".to_string()))?;
    if version != u64::from(SNAPSHOT_VERSION) {
        return Err(CorruptModelError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }

    let envelope: Envelope =
        serde_json::from_value(value).map_err(|e| CorruptModelError::Malformed(e.to_string()))?;

    let actual = payload_checksum(&envelope.rules, &envelope.catalog, &envelope.params)?;
    if actual != envelope.checksum {
        return Err(CorruptModelError::ChecksumMismatch {
            expected: envelope.checksum,
            actual,
        });
    }

    validate_content(&envelope.rules, &envelope.catalog, &envelope.params)?;

    Ok(ModelSnapshot {
        params: envelope.params,
        catalog: envelope.catalog,
        rules: envelope.rules,
        created_at: envelope.created_at,
        checksum: envelope.checksum,
    })
}

fn validate_content(
    rules: &[Rule],
    catalog: &Catalog,
    params: &TrainingParams,
) -> Result<(), CorruptModelError> {
    params
        .validate()
        .map_err(|e| CorruptModelError::Invalid(e.to_string()))?;

    for (i, rule) in rules.iter().enumerate() {
        let invalid = |reason: &str| CorruptModelError::Invalid(format!("rule {}: {}", i, reason));

        if rule.antecedent.is_empty() || rule.consequent.is_empty() {
            return Err(invalid("empty antecedent or consequent"));
        }
        if !is_strictly_sorted(&rule.antecedent) || !is_strictly_sorted(&rule.consequent) {
            return Err(invalid("item ids must be sorted and distinct"));
        }
        if rule.antecedent.iter().any(|id| rule.consequent.contains(id)) {
            return Err(invalid("antecedent and consequent overlap"));
        }
        let scores = [rule.support, rule.confidence, rule.lift];
        if scores.iter().any(|s| !s.is_finite() || *s <= 0.0) || rule.support > 1.0 {
            return Err(invalid("scores out of range"));
        }
    }

    debug!(
        "snapshot content valid: {} rules, {} catalog items",
        rules.len(),
        catalog.len()
    );
    Ok(())
}

fn is_strictly_sorted<T: Ord>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0] < pair[1])
}

/// Sibling file holding the hex BLAKE3 of the blob
pub fn hash_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("hash")
}

/// Write the blob and its `.hash` sibling; returns the blob hash.
///
/// Each file is staged in the target directory and renamed into place. If
/// the sibling cannot be written the previous blob is put back.
pub fn write_file(path: &Path, blob: &[u8]) -> Result<String, BasketError> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let hash_hex = blake3_hex(blob);
    let staged_blob = stage(&parent, blob)?;
    let staged_hash = stage(&parent, hash_hex.as_bytes())?;

    let previous = match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    staged_blob.persist(path).map_err(|e| e.error)?;
    if let Err(e) = staged_hash.persist(hash_path(path)) {
        warn!(
            "Failed to write {}, restoring previous model file: {}",
            hash_path(path).display(),
            e.error
        );
        restore(&parent, path, previous.as_deref())?;
        return Err(e.error.into());
    }

    info!("Model saved to {} ({} bytes)", path.display(), blob.len());
    Ok(hash_hex)
}

/// Synced temp file in `dir`, ready to be renamed into place.
fn stage(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

fn restore(dir: &Path, path: &Path, previous: Option<&[u8]>) -> io::Result<()> {
    match previous {
        Some(bytes) => stage(dir, bytes)?.persist(path).map(|_| ()).map_err(|e| e.error),
        None => fs::remove_file(path),
    }
}

/// Read and decode a snapshot file, checking the `.hash` sibling when present.
pub fn read_file(path: &Path) -> Result<ModelSnapshot, BasketError> {
    let blob = fs::read(path)?;

    let sidecar = hash_path(path);
    if sidecar.exists() {
        let expected = fs::read_to_string(&sidecar)?.trim().to_string();
        let actual = blake3_hex(&blob);
        if expected != actual {
            return Err(CorruptModelError::ChecksumMismatch { expected, actual }.into());
        }
    }

    let snapshot = load(&blob)?;
    info!(
        "Model loaded from {} ({} rules, {} products)",
        path.display(),
        snapshot.rules.len(),
        snapshot.catalog.len()
    );
    Ok(snapshot)
}
