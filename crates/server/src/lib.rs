//! LocScout HTTP server
//!
//! actix-web REST API over [`SearchService`]

mod error;
mod routes;
mod state;
mod types;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use locscout_common::{AppConfig, LocScoutError, Result};
use locscout_vector::SearchService;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use error::ApiError;
pub use routes::configure;
pub use state::AppState;
pub use types::{CategoriesResponse, ErrorResponse, HealthResponse, SearchBody, SearchResponse};

/// CORS policy for the configured origins (`*` allows any)
fn build_cors(origins: &[String]) -> Cors {
    let cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_header(header::CONTENT_TYPE)
        .max_age(3600)
}

/// Malformed JSON bodies become a 400 with the usual error body
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::from(LocScoutError::invalid_query(format!("Invalid request body: {}", err)))
            .into()
    })
}

/// Serve the API until shutdown
pub async fn start_server(config: AppConfig, search: Arc<SearchService>) -> Result<()> {
    let bind_addr = config.server_bind_address();
    let origins = config.allowed_origins.clone();
    let state = Arc::new(AppState::new(config, search));

    info!(
        "Starting server on http://{} ({} categories, origins: {:?})",
        bind_addr,
        state.search.list_categories().len(),
        origins
    );

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&origins))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use async_trait::async_trait;
    use locscout_embed::EmbeddingProvider;
    use locscout_vector::{EmbeddingMatrix, RecordMetadata, VectorStore};
    use serde_json::{json, Value};

    struct AxisProvider;

    #[async_trait]
    impl EmbeddingProvider for AxisProvider {
        async fn encode(&self, text: &str) -> Result<Vec<f32>> {
            match text {
                "east" => Ok(vec![1.0, 0.0]),
                "north" => Ok(vec![0.0, 1.0]),
                "wide" => Ok(vec![1.0, 0.0, 0.0]),
                _ => Err(LocScoutError::provider_unavailable("model offline")),
            }
        }

        fn model(&self) -> &str {
            "axis"
        }
    }

    fn state() -> Arc<AppState> {
        let metadata = vec![
            RecordMetadata::new(
                " https://maps.googleapis.com/maps/api/streetview?location=40.7,-74.0&heading=45 ",
                Some("40.7"),
                Some("-74.0"),
            ),
            RecordMetadata::new("https://x/b", Some("41.0"), Some("-73.0")),
            RecordMetadata::new("https://x/c", Some("not_a_number"), Some("2.0")),
        ];
        let full =
            EmbeddingMatrix::from_vecs(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]]).unwrap();
        let store = VectorStore::new(metadata, [("full".to_string(), full)]).unwrap();
        let search = SearchService::new(Arc::new(store), Arc::new(AxisProvider));
        Arc::new(AppState::new(AppConfig::default(), Arc::new(search)))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(state()))
                    .app_data(json_config())
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_search_returns_located_results() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/search")
            .set_json(json!({"query": "east", "top_k": 3, "threshold": 0.5}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(body["count"], 1);
        assert_eq!(
            results[0]["image_url"],
            "https://maps.googleapis.com/maps/api/streetview?location=40.7,-74.0&heading=45"
        );
        assert_eq!(results[0]["score"], 1.0);
        assert_eq!(results[0]["coordinates"]["latitude"], 40.7);
        assert_eq!(results[0]["coordinates"]["longitude"], -74.0);
        assert_eq!(results[0]["heading"], "45");
        assert!(results[0]["public_url"]
            .as_str()
            .unwrap()
            .starts_with("https://www.google.com/maps/@40.7,-74.0,"));
    }

    #[actix_web::test]
    async fn test_unknown_category_is_empty_ok() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/search")
            .set_json(json!({"query": "east", "category": "materials"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["results"], json!([]));
    }

    #[actix_web::test]
    async fn test_provider_failure_is_503() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/search")
            .set_json(json!({"query": "somewhere"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("model offline"));
    }

    #[actix_web::test]
    async fn test_bad_requests_are_400() {
        let app = app!();

        let cases = [
            json!({"query": ""}),
            json!({"query": "wide"}),
            json!({"query": "east", "top_k": 0}),
            json!({"query": "east", "threshold": 2.0}),
        ];
        for body in cases {
            let req = test::TestRequest::post()
                .uri("/api/search")
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {}", body);
        }

        let req = test::TestRequest::post()
            .uri("/api/search")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_categories() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/categories").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"categories": ["full"]}));
    }

    #[actix_web::test]
    async fn test_health() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["records"], 3);
        assert_eq!(body["categories"]["full"], 2);
        assert_eq!(body["embedding_model"], "axis");
    }
}
