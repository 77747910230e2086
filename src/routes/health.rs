use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::db::DbPool;

/// Health check endpoint
///
/// Reports `ok` with the current timestamp while the database answers, `degraded`
/// with a 503 otherwise.
#[get("/health")]
pub async fn health(pool: web::Data<DbPool>) -> impl Responder {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "timestamp": Utc::now()
        })),
        Err(err) => {
            log::warn!("health check failed: {}", err);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "timestamp": Utc::now()
            }))
        }
    }
}
