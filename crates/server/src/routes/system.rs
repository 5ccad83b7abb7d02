use actix_web::{get, web, HttpResponse};
use std::sync::Arc;

use crate::state::AppState;
use crate::types::HealthResponse;

/// Corpus shape and embedding model in use
#[get("/health")]
pub async fn health(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let stats = state.search.store().stats();

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        records: stats.records,
        categories: stats.categories,
        embedding_model: state.search.model().to_string(),
        loaded_at: state.loaded_at,
    })
}
