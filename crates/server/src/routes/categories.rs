use actix_web::{get, web, HttpResponse};
use std::sync::Arc;

use crate::state::AppState;
use crate::types::CategoriesResponse;

/// Get available search categories
#[get("/categories")]
pub async fn categories(state: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(CategoriesResponse {
        categories: state.search.list_categories(),
    })
}
