//! Order mappings on disk: JSON for editing, validated rkyv for loading.

use std::fs;
use std::path::Path;

use rephrase_protocol::OrderMapping;
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use rkyv::{check_archived_root, AlignedVec, Deserialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("order JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("order archive: {0}")]
    Archive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Binary,
}

impl Format {
    /// `.json` files are JSON, anything else is the binary archive.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Binary,
        }
    }
}

pub fn to_json(mappings: &[OrderMapping]) -> Result<String, OrderError> {
    Ok(serde_json::to_string_pretty(mappings)?)
}

pub fn from_json(json: &str) -> Result<Vec<OrderMapping>, OrderError> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_bytes(mappings: &Vec<OrderMapping>) -> Result<AlignedVec, OrderError> {
    let mut serializer = AllocSerializer::<1024>::default();
    serializer
        .serialize_value(mappings)
        .map_err(|e| OrderError::Archive(format!("{:?}", e)))?;
    Ok(serializer.into_serializer().into_inner())
}

/// Validates the archive before touching it.
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<OrderMapping>, OrderError> {
    let mut aligned = AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);

    let archived =
        check_archived_root::<Vec<OrderMapping>>(&aligned).map_err(|e| OrderError::Archive(format!("{:?}", e)))?;
    archived
        .deserialize(&mut rkyv::Infallible)
        .map_err(|e| OrderError::Archive(format!("{:?}", e)))
}

pub fn save(path: &Path, mappings: &Vec<OrderMapping>) -> Result<(), OrderError> {
    match Format::from_path(path) {
        Format::Json => fs::write(path, to_json(mappings)?)?,
        Format::Binary => fs::write(path, to_bytes(mappings)?)?,
    }
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<OrderMapping>, OrderError> {
    match Format::from_path(path) {
        Format::Json => from_json(&fs::read_to_string(path)?),
        Format::Binary => from_bytes(&fs::read(path)?),
    }
}
