use actix_web::{post, web, HttpResponse};
use locscout_vector::SearchRequest;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{SearchBody, SearchResponse};

#[post("/search")]
pub async fn search(
    body: web::Json<SearchBody>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let mut request = SearchRequest::new(body.query.trim())
        .with_top_k(body.top_k.unwrap_or(state.config.default_top_k))
        .with_threshold(body.threshold.unwrap_or(state.config.default_threshold));
    if let Some(category) = body.category {
        request = request.with_category(category);
    }

    let results = state.search.search(&request).await?;
    let count = results.len();

    Ok(HttpResponse::Ok().json(SearchResponse {
        results,
        query: request.query,
        count,
    }))
}
