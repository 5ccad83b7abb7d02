use locscout_common::{LocScoutError, Result};
use locscout_embed::EmbeddingProvider;
use std::sync::Arc;
use tracing::{debug, info};

use crate::assemble::{assemble_report, LocationResult};
use crate::similarity::{check_limits, rank, rank_weighted};
use crate::store::{EmbeddingMatrix, VectorStore};

pub use locscout_common::config::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};

/// Category searched when a request names none
pub const DEFAULT_CATEGORY: &str = "full";

/// Reserved category that blends [`COMBINED_WEIGHTS`]
pub const COMBINED_CATEGORY: &str = "combined";

/// Category weights of the blended ranking; they sum to 1
pub const COMBINED_WEIGHTS: &[(&str, f32)] = &[
    ("aesthetics", 0.3),
    ("architecture", 0.3),
    ("colors", 0.2),
    ("mood_vibes", 0.2),
];

/// Parameters of one search
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub category: Option<String>,
    pub top_k: usize,
    pub threshold: f32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Requested category, or [`DEFAULT_CATEGORY`]
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Text search over a shared, read-only [`VectorStore`]
pub struct SearchService {
    store: Arc<VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl SearchService {
    pub fn new(store: Arc<VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, provider }
    }

    /// Embed the query, rank the category's matrix and assemble located results
    ///
    /// An unknown category yields no results rather than an error. So does
    /// [`COMBINED_CATEGORY`] when any of its weighted categories is missing.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<LocationResult>> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(LocScoutError::invalid_query("Query cannot be empty"));
        }
        check_limits(request.top_k, request.threshold)?;

        let category = request.category();
        let Some(matrices) = self.matrices_for(category) else {
            debug!("Unknown category '{}', returning no results", category);
            return Ok(Vec::new());
        };

        debug!(
            "Searching for: {} (category={}, top_k={}, threshold={})",
            query, category, request.top_k, request.threshold
        );

        let embedding = self.provider.encode(query).await.map_err(|e| match e {
            LocScoutError::ProviderUnavailable(_) => e,
            other => LocScoutError::provider_unavailable(other.to_string()),
        })?;
        if embedding.is_empty() {
            return Err(LocScoutError::provider_unavailable(
                "Provider returned an empty embedding",
            ));
        }

        let candidates = match matrices.as_slice() {
            [(matrix, _)] => rank(matrix, &embedding, request.top_k, request.threshold)?,
            weighted => rank_weighted(weighted, &embedding, request.top_k, request.threshold)?,
        };
        let report = assemble_report(&candidates, self.store.metadata());

        info!(
            "Search completed - {} results ({} candidates, {} skipped)",
            report.results.len(),
            candidates.len(),
            report.skipped.len()
        );
        Ok(report.results)
    }

    /// Matrices and weights behind a category name
    ///
    /// A loaded matrix of the same name shadows the blend.
    fn matrices_for(&self, category: &str) -> Option<Vec<(&EmbeddingMatrix, f32)>> {
        if let Some(matrix) = self.store.matrix(category) {
            return Some(vec![(matrix, 1.0)]);
        }
        if category != COMBINED_CATEGORY {
            return None;
        }
        COMBINED_WEIGHTS
            .iter()
            .map(|(name, weight)| self.store.matrix(name).map(|m| (m, *weight)))
            .collect()
    }

    /// Categories that can be searched, including the blend when it is complete
    pub fn list_categories(&self) -> Vec<String> {
        let mut categories = self.store.categories();
        let blended = COMBINED_WEIGHTS
            .iter()
            .all(|(name, _)| self.store.matrix(name).is_some());
        if blended && self.store.matrix(COMBINED_CATEGORY).is_none() {
            categories.push(COMBINED_CATEGORY.to_string());
            categories.sort();
        }
        categories
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EmbeddingMatrix, RecordMetadata};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Looks queries up in a fixed table; unknown text is an outage
    struct FixedProvider {
        vectors: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn encode(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.vectors.get(text) {
                Some(v) => Ok(v.clone()),
                None => Err(LocScoutError::internal(format!("no vector for '{}'", text))),
            }
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn store() -> Arc<VectorStore> {
        let metadata = vec![
            RecordMetadata::new("https://x/a?heading=10", Some("40.0"), Some("-74.0")),
            RecordMetadata::new("https://x/b", Some("41.0"), Some("-73.0")),
            RecordMetadata::new("https://x/c", Some("not_a_number"), Some("-72.0")),
        ];
        let full = EmbeddingMatrix::from_vecs(&[
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.7, 0.7],
        ])
        .unwrap();
        let colors = EmbeddingMatrix::from_vecs(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        Arc::new(
            VectorStore::new(
                metadata,
                [("full".to_string(), full), ("colors".to_string(), colors)],
            )
            .unwrap(),
        )
    }

    fn service(provider: FixedProvider) -> (SearchService, Arc<FixedProvider>) {
        let provider = Arc::new(provider);
        (SearchService::new(store(), provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_search_default_category() {
        let (service, _) = service(FixedProvider::new(&[("east", vec![1.0, 0.0])]));
        let results = service
            .search(&SearchRequest::new("east").with_top_k(3).with_threshold(0.5))
            .await
            .unwrap();

        // Row 2 ranks second but has an invalid latitude
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].image_url, "https://x/a?heading=10");
        assert_eq!(results[0].heading, "10");
    }

    #[tokio::test]
    async fn test_search_named_category() {
        let (service, _) = service(FixedProvider::new(&[("green", vec![0.0, 1.0, 0.0])]));
        let results = service
            .search(&SearchRequest::new("green").with_category("colors"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].coordinates.latitude, 41.0);
    }

    #[tokio::test]
    async fn test_unknown_category_is_empty() {
        let (service, provider) = service(FixedProvider::new(&[("east", vec![1.0, 0.0])]));
        let results = service
            .search(&SearchRequest::new("east").with_category("materials"))
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported() {
        let (service, _) = service(FixedProvider::new(&[]));
        let err = service.search(&SearchRequest::new("east")).await.unwrap_err();
        assert!(matches!(err, LocScoutError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_invalid_query() {
        let (service, _) = service(FixedProvider::new(&[("east", vec![1.0, 0.0, 0.0])]));
        let err = service.search(&SearchRequest::new("east")).await.unwrap_err();
        assert!(matches!(err, LocScoutError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let (service, provider) = service(FixedProvider::new(&[]));
        let err = service.search(&SearchRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, LocScoutError::InvalidQuery(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_vector_query() {
        let (service, _) = service(FixedProvider::new(&[("nothing", vec![0.0, 0.0])]));
        let results = service
            .search(&SearchRequest::new("nothing").with_threshold(0.0))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.similarity_score == 0.0));
    }

    #[tokio::test]
    async fn test_invalid_limits_rejected_before_provider() {
        let (service, provider) = service(FixedProvider::new(&[]));

        let requests = [
            SearchRequest::new("east").with_top_k(0),
            SearchRequest::new("east").with_threshold(1.5),
            SearchRequest::new("east").with_threshold(f32::NAN),
            SearchRequest::new("east").with_category("materials").with_top_k(0),
        ];
        for request in &requests {
            let err = service.search(request).await.unwrap_err();
            assert!(matches!(err, LocScoutError::InvalidQuery(_)), "{:?}", request);
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    fn blended_store() -> Arc<VectorStore> {
        let metadata = vec![
            RecordMetadata::new("https://x/a", Some("40.0"), Some("-74.0")),
            RecordMetadata::new("https://x/b", Some("41.0"), Some("-73.0")),
            RecordMetadata::new("https://x/c", Some("42.0"), Some("-72.0")),
        ];
        // Row 0 matches on aesthetics and architecture (0.6 in total),
        // row 1 on colors and mood (0.4), row 2 on nothing
        let strong = EmbeddingMatrix::from_vecs(&[
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ])
        .unwrap();
        let weak = EmbeddingMatrix::from_vecs(&[
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ])
        .unwrap();
        Arc::new(
            VectorStore::new(
                metadata,
                [
                    ("aesthetics".to_string(), strong.clone()),
                    ("architecture".to_string(), strong),
                    ("colors".to_string(), weak.clone()),
                    ("mood_vibes".to_string(), weak),
                ],
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_combined_category_blends_weights() {
        let provider = Arc::new(FixedProvider::new(&[("east", vec![1.0, 0.0])]));
        let service = SearchService::new(blended_store(), provider);

        let results = service
            .search(
                &SearchRequest::new("east")
                    .with_category(COMBINED_CATEGORY)
                    .with_threshold(0.0),
            )
            .await
            .unwrap();
        let urls: Vec<&str> = results.iter().map(|r| r.image_url.as_str()).collect();
        assert_eq!(urls, vec!["https://x/a", "https://x/b", "https://x/c"]);
        assert!((results[0].similarity_score - 0.6).abs() < 1e-6);
        assert!((results[1].similarity_score - 0.4).abs() < 1e-6);

        assert!(service.list_categories().contains(&COMBINED_CATEGORY.to_string()));
    }

    #[tokio::test]
    async fn test_combined_needs_every_weighted_category() {
        let (service, provider) = service(FixedProvider::new(&[("east", vec![1.0, 0.0])]));
        let results = service
            .search(&SearchRequest::new("east").with_category(COMBINED_CATEGORY))
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(!service.list_categories().contains(&COMBINED_CATEGORY.to_string()));
    }

    #[test]
    fn test_request_defaults_follow_config() {
        let request = SearchRequest::new("east");
        let config = locscout_common::AppConfig::default();
        assert_eq!(request.top_k, config.default_top_k);
        assert_eq!(request.threshold, config.default_threshold);
        assert_eq!(request.category(), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_list_categories() {
        let (service, _) = service(FixedProvider::new(&[]));
        assert_eq!(service.list_categories(), vec!["colors", "full"]);
        assert_eq!(service.model(), "fixed");
    }
}
