use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::bearer_token;
use crate::error::AppError;
use crate::models::Account;
use crate::services::auth::{AuthService, UNAUTHENTICATED};

/// Resolves the bearer token before the wrapped handler runs and stores the
/// `Account` in the request extensions for `AuthenticatedAccount`.
///
/// Applied per route, so an unmatched path still falls through to the 404 handler,
/// and a bad token is rejected before any body, path or query extractor can fail.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token = bearer_token(req.request()).map(str::to_owned);
        let auth = req.app_data::<web::Data<AuthService>>().cloned();

        Box::pin(async move {
            match authenticate(auth, token).await {
                Ok(account) => {
                    req.extensions_mut().insert(account);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.into_response(err.error_response()).map_into_right_body()),
            }
        })
    }
}

async fn authenticate(
    auth: Option<web::Data<AuthService>>,
    token: Option<String>,
) -> Result<Account, AppError> {
    let auth = auth.ok_or_else(|| {
        log::error!("AuthService is not registered as app data");
        AppError::InternalServerError("Internal server error".into())
    })?;
    let token = token.ok_or_else(|| AppError::Unauthorized(UNAUTHENTICATED.into()))?;
    auth.resolve_token(&token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedAccount, RegisterRequest};
    use crate::db;
    use crate::models::NewAccount;
    use actix_web::http::header;
    use actix_web::{test, App, HttpResponse};

    async fn whoami(caller: AuthenticatedAccount) -> HttpResponse {
        HttpResponse::Ok().body(caller.0.email)
    }

    async fn auth_service() -> web::Data<AuthService> {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        web::Data::new(AuthService::new(pool, 4))
    }

    #[actix_rt::test]
    async fn test_valid_token_reaches_handler() {
        let auth = auth_service().await;
        let token = auth
            .register(
                NewAccount::try_from(RegisterRequest {
                    first_name: Some("Grace".into()),
                    last_name: Some("Hopper".into()),
                    email: Some("grace@example.com".into()),
                    password: Some("cobol-rules".into()),
                    password_confirmation: Some("cobol-rules".into()),
                })
                .unwrap(),
            )
            .await
            .unwrap();

        let app = test::init_service(
            App::new().app_data(auth.clone()).service(
                web::resource("/whoami")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"grace@example.com"));
    }

    #[actix_rt::test]
    async fn test_bad_token_is_rejected_before_extractors() {
        let auth = auth_service().await;
        let app = test::init_service(
            App::new().app_data(auth).service(
                web::resource("/items/{id}")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(
                        |_caller: AuthenticatedAccount,
                         _id: web::Path<i64>,
                         _body: web::Json<serde_json::Value>| async { HttpResponse::Ok().finish() },
                    )),
            ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/items/not-a-number")
            .insert_header((header::AUTHORIZATION, "Bearer deadbeef"))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthenticated.");
    }
}
