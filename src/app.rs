use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{web, App, Error};

use crate::routes;
use crate::services::Services;

const CORS_MAX_AGE_SECS: usize = 3600;

/// Builds one application instance: shared services, CORS, request logging, the
/// health check, the `/api` routes and a JSON 404 for everything else.
///
/// Used by the server binary per worker and by the integration tests directly.
pub fn build(
    services: &Services,
    allowed_origins: &[String],
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(services.pool.clone()))
        .app_data(services.auth.clone())
        .app_data(services.tasks.clone())
        .wrap(cors(allowed_origins))
        .wrap(Logger::default())
        .service(routes::health::health)
        .service(web::scope("/api").configure(routes::config))
        .default_service(web::to(routes::not_found))
}

fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(CORS_MAX_AGE_SECS)
}
