//! Packaging of a finished (or interrupted) run for handoff.
//!
//! The wire form is zlib-compressed JSON `{"data": [...], "stats": {...}}`.
//! The text form wraps those bytes in standard base64.

use crate::error::{Result, ScanError};
use crate::result::CollectedRecord;
use crate::stats::CrawlStats;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    #[serde(default)]
    pub data: Vec<CollectedRecord>,
    #[serde(default)]
    pub stats: CrawlStats,
}

impl ResultBundle {
    pub fn pages(&self) -> impl Iterator<Item = &crate::result::PageRecord> {
        self.data.iter().filter_map(CollectedRecord::as_page)
    }

    pub fn images(&self) -> impl Iterator<Item = &crate::result::ImageRecord> {
        self.data.iter().filter_map(CollectedRecord::as_image)
    }
}

pub fn pack(data: Vec<CollectedRecord>, stats: CrawlStats) -> ResultBundle {
    ResultBundle { data, stats }
}

pub fn serialize(bundle: &ResultBundle) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(bundle).map_err(|e| ScanError::BundleEncode(e.to_string()))?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| ScanError::BundleEncode(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ScanError::BundleEncode(e.to_string()))
}

pub fn deserialize(bytes: &[u8]) -> Result<ResultBundle> {
    let json = inflate(bytes)?;
    serde_json::from_slice(&json).map_err(|e| ScanError::BundleDecode(e.to_string()))
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut json = Vec::new();
    ZlibDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| ScanError::BundleDecode(format!("not a compressed bundle: {}", e)))?;
    Ok(json)
}

/// Copy/paste-safe form of [`serialize`].
pub fn to_text(bundle: &ResultBundle) -> Result<String> {
    Ok(STANDARD.encode(serialize(bundle)?))
}

/// Inverse of [`to_text`]. Also accepts an older export that is a bare
/// (compressed) JSON array of records with no statistics.
pub fn from_text(text: &str) -> Result<ResultBundle> {
    let compact: String = text.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ScanError::BundleDecode(format!("invalid base64: {}", e)))?;
    let json = inflate(&bytes)?;

    let value: serde_json::Value =
        serde_json::from_slice(&json).map_err(|e| ScanError::BundleDecode(e.to_string()))?;

    if value.is_array() {
        let data: Vec<CollectedRecord> =
            serde_json::from_value(value).map_err(|e| ScanError::BundleDecode(e.to_string()))?;
        return Ok(pack(data, CrawlStats::default()));
    }

    serde_json::from_value(value).map_err(|e| ScanError::BundleDecode(e.to_string()))
}
