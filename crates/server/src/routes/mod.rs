mod categories;
mod search;
mod system;

use actix_web::web;

/// Register every `/api` route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(search::search)
            .service(categories::categories)
            .service(system::health),
    );
}
