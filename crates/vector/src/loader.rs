use locscout_common::{AppConfig, LocScoutError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::geo::extract_coordinates;
use crate::npy::read_matrix;
use crate::store::{EmbeddingMatrix, RecordMetadata, VectorStore};

const IMAGE_URL_COLUMN: &str = "image_url";
const LATITUDE_COLUMN: &str = "latitude";
const LONGITUDE_COLUMN: &str = "longitude";

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            LocScoutError::corpus(format!("Metadata file missing required column '{}'", name))
        })
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<&str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

/// Read the metadata CSV
///
/// Rows whose latitude or longitude cell is empty fall back to coordinates
/// embedded in the image URL (`location=` or `@` forms).
pub fn load_metadata(path: &Path) -> Result<Vec<RecordMetadata>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            LocScoutError::corpus(format!("Cannot read metadata {}: {}", path.display(), e))
        })?;

    let headers = reader
        .headers()
        .map_err(|e| LocScoutError::corpus(format!("Bad metadata header: {}", e)))?
        .clone();
    let url_col = column_index(&headers, IMAGE_URL_COLUMN)?;
    let lat_col = column_index(&headers, LATITUDE_COLUMN)?;
    let lng_col = column_index(&headers, LONGITUDE_COLUMN)?;

    let mut rows = Vec::new();
    let mut hinted = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            LocScoutError::corpus(format!("Bad metadata row {}: {}", line + 1, e))
        })?;

        let image_url = record.get(url_col).unwrap_or_default().to_string();
        let mut latitude = cell(&record, lat_col).map(str::to_string);
        let mut longitude = cell(&record, lng_col).map(str::to_string);

        if latitude.is_none() || longitude.is_none() {
            if let Some((lat, lng)) = extract_coordinates(&image_url) {
                latitude = Some(lat.to_string());
                longitude = Some(lng.to_string());
                hinted += 1;
            }
        }

        rows.push(RecordMetadata {
            image_url,
            latitude,
            longitude,
        });
    }

    info!(
        "Loaded metadata from {} - {} rows ({} with coordinates from URL hints)",
        path.display(),
        rows.len(),
        hinted
    );
    Ok(rows)
}

/// Load metadata and every configured category that has a vector file
///
/// Missing vector files are skipped with a warning; malformed ones and any row
/// misalignment are fatal.
pub fn load_corpus(config: &AppConfig) -> Result<VectorStore> {
    let metadata_path = config.metadata_path();
    if !metadata_path.exists() {
        return Err(LocScoutError::corpus(format!(
            "Metadata file not found at {}",
            metadata_path.display()
        )));
    }
    let metadata = load_metadata(&metadata_path)?;

    let mut matrices: Vec<(String, EmbeddingMatrix)> = Vec::new();
    for category in &config.categories {
        let path = config.vectors_path(category);
        if !path.exists() {
            warn!("Could not find vectors for {} at {}", category, path.display());
            continue;
        }
        let matrix = read_matrix(&path)?;
        debug!(
            "Loaded vectors for {}: ({}, {})",
            category,
            matrix.rows(),
            matrix.dim()
        );
        matrices.push((category.clone(), matrix));
    }

    VectorStore::new(metadata, matrices)
}
