use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::{Account, OwnerId};
use crate::services::auth::UNAUTHENTICATED;

/// The account behind the request's bearer token.
///
/// `AuthMiddleware` resolves the token and leaves the `Account` in the request
/// extensions; this extractor only picks it up. On a route without the middleware
/// there is nothing to pick up, and the request is rejected with a 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub Account);

impl AuthenticatedAccount {
    pub fn owner(&self) -> OwnerId {
        OwnerId::from(&self.0)
    }
}

impl FromRequest for AuthenticatedAccount {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Account>().cloned() {
            Some(account) => ready(Ok(AuthenticatedAccount(account))),
            None => ready(Err(AppError::Unauthorized(UNAUTHENTICATED.into()).into())),
        }
    }
}

/// The credentials of an `Authorization: Bearer <token>` header, if there are any.
pub(crate) fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: 42,
            first_name: "Alan".into(),
            last_name: "Turing".into(),
            email: "alan@example.com".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[actix_rt::test]
    async fn test_account_from_extensions() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(account());

        let extracted = AuthenticatedAccount::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(extracted.0.email, "alan@example.com");
        assert_eq!(extracted.owner().get(), 42);
    }

    #[actix_rt::test]
    async fn test_missing_account_is_unauthorized() {
        let req = TestRequest::default().to_http_request();

        let err = AuthenticatedAccount::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
