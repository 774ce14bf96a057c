// Exports of collected data and the text bundle form

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use silky_scanner::bundle::{self, ResultBundle};
use silky_scanner::{CollectedRecord, ImageKind};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub url: String,
    pub source_page: String,
    pub alt_text: Option<String>,
    pub dimensions: Option<(u32, u32)>,
    pub image_type: ImageKind,
    pub depth: usize,
}

pub fn url_list(records: &[CollectedRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.url().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

pub fn image_urls(records: &[CollectedRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(CollectedRecord::as_image)
        .map(|image| image.url.clone())
        .collect()
}

pub fn image_metadata(records: &[CollectedRecord]) -> Vec<ImageMetadata> {
    records
        .iter()
        .filter_map(CollectedRecord::as_image)
        .map(|image| ImageMetadata {
            url: image.url.clone(),
            source_page: image.source_page.clone(),
            alt_text: image.alt_text.clone(),
            dimensions: image.dimensions,
            image_type: image.image_type,
            depth: image.depth,
        })
        .collect()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Writes one URL per line. Returns the number written.
pub fn export_urls(records: &[CollectedRecord], path: &Path) -> Result<usize> {
    let urls = url_list(records);
    if urls.is_empty() {
        return Err(CoreError::NothingToExport("no URLs in collected data".to_string()));
    }
    write_file(path, &urls.join("\n"))?;
    info!("Wrote {} URLs to {}", urls.len(), path.display());
    Ok(urls.len())
}

pub fn export_images(records: &[CollectedRecord], path: &Path) -> Result<usize> {
    let images = image_urls(records);
    if images.is_empty() {
        return Err(CoreError::NothingToExport("no images in collected data".to_string()));
    }
    write_file(path, &images.join("\n"))?;
    info!("Wrote {} image URLs to {}", images.len(), path.display());
    Ok(images.len())
}

pub fn export_image_metadata(records: &[CollectedRecord], path: &Path) -> Result<usize> {
    let images = image_metadata(records);
    if images.is_empty() {
        return Err(CoreError::NothingToExport("no images in collected data".to_string()));
    }
    let json = serde_json::to_string_pretty(&images)
        .map_err(|e| silky_scanner::ScanError::BundleEncode(e.to_string()))?;
    write_file(path, &json)?;
    info!("Wrote {} images with metadata to {}", images.len(), path.display());
    Ok(images.len())
}

/// Saves the copy/paste (base64) form of `bundle`.
pub fn export_bundle(bundle: &ResultBundle, path: &Path) -> Result<()> {
    write_file(path, &bundle::to_text(bundle)?)
}

pub fn import_bundle_file(path: &Path) -> Result<ResultBundle> {
    let text = std::fs::read_to_string(path)?;
    Ok(bundle::from_text(text.trim())?)
}
