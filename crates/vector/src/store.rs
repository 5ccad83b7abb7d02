use locscout_common::{LocScoutError, Result};
use ndarray::{Array2, ArrayView1};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Row vectors of one category, `rows × dim`
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    data: Array2<f32>,
}

impl EmbeddingMatrix {
    /// Build from row-major values
    pub fn from_rows(rows: usize, dim: usize, values: Vec<f32>) -> Result<Self> {
        let data = Array2::from_shape_vec((rows, dim), values).map_err(|e| {
            LocScoutError::corpus(format!("Cannot shape {}x{} matrix: {}", rows, dim, e))
        })?;
        Ok(Self { data })
    }

    /// Build from a slice of equally sized rows
    pub fn from_vecs(rows: &[Vec<f32>]) -> Result<Self> {
        let dim = rows.first().map_or(0, |r| r.len());
        if let Some(bad) = rows.iter().position(|r| r.len() != dim) {
            return Err(LocScoutError::corpus(format!(
                "Row {} has dimension {}, expected {}",
                bad,
                rows[bad].len(),
                dim
            )));
        }
        let values = rows.iter().flatten().copied().collect();
        Self::from_rows(rows.len(), dim, values)
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.row(index)
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }
}

/// One indexed image, positionally aligned with every matrix row
///
/// Coordinates stay as raw text; validation happens when results are assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMetadata {
    pub image_url: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl RecordMetadata {
    pub fn new(
        image_url: impl Into<String>,
        latitude: Option<&str>,
        longitude: Option<&str>,
    ) -> Self {
        Self {
            image_url: image_url.into(),
            latitude: latitude.map(str::to_string),
            longitude: longitude.map(str::to_string),
        }
    }
}

/// Shape summary reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub records: usize,
    pub categories: BTreeMap<String, usize>,
}

/// Immutable corpus: named embedding matrices plus the shared metadata table
#[derive(Debug)]
pub struct VectorStore {
    metadata: Vec<RecordMetadata>,
    matrices: BTreeMap<String, EmbeddingMatrix>,
}

impl VectorStore {
    /// Build a store, rejecting any matrix that is not row-aligned with `metadata`
    pub fn new(
        metadata: Vec<RecordMetadata>,
        matrices: impl IntoIterator<Item = (String, EmbeddingMatrix)>,
    ) -> Result<Self> {
        let mut by_name = BTreeMap::new();

        for (name, matrix) in matrices {
            if matrix.rows() != metadata.len() {
                return Err(LocScoutError::corpus(format!(
                    "Category '{}' has {} rows but metadata has {}",
                    name,
                    matrix.rows(),
                    metadata.len()
                )));
            }
            if matrix.dim() == 0 {
                return Err(LocScoutError::corpus(format!(
                    "Category '{}' has zero-dimensional vectors",
                    name
                )));
            }
            if by_name.insert(name.clone(), matrix).is_some() {
                return Err(LocScoutError::corpus(format!(
                    "Category '{}' supplied more than once",
                    name
                )));
            }
        }

        info!(
            "Vector store ready - {} records, {} categories",
            metadata.len(),
            by_name.len()
        );

        Ok(Self {
            metadata,
            matrices: by_name,
        })
    }

    pub fn matrix(&self, category: &str) -> Option<&EmbeddingMatrix> {
        self.matrices.get(category)
    }

    pub fn metadata(&self) -> &[RecordMetadata] {
        &self.metadata
    }

    /// Category names in sorted order
    pub fn categories(&self) -> Vec<String> {
        self.matrices.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            records: self.metadata.len(),
            categories: self
                .matrices
                .iter()
                .map(|(name, m)| (name.clone(), m.dim()))
                .collect(),
        }
    }
}
