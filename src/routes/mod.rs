pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::error::AppError;

/// Registers the API under the caller's scope (mounted at `/api` by the app).
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::logout)
                .service(auth::me),
        )
        .service(
            web::scope("/todos")
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// Fallback for any request no route matched.
pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(json!({ "message": "Resource not found" }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("rejected request body: {}", err);
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

/// A task id that is not an integer cannot name an existing task.
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Todo not found".into()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query string: {}", err)).into()
    })
}
