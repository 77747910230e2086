#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::test;
use serde_json::{json, Value};
use taskbook::{auth::AuthResponse, db, Services};

pub const ORIGIN: &str = "http://localhost:3000";
pub const PASSWORD: &str = "password123";

/// Services over a fresh in-memory database, with the cheapest bcrypt cost.
pub async fn services() -> Services {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    Services::new(pool, 4)
}

pub fn origins() -> Vec<String> {
    vec![ORIGIN.to_string()]
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn registration(email: &str) -> Value {
    json!({
        "first_name": "Test",
        "last_name": "User",
        "email": email,
        "password": PASSWORD,
        "password_confirmation": PASSWORD
    })
}

/// Registers `email` and returns the issued token.
pub async fn register<S, B>(app: &S, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(registration(email))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registration of {} failed", email);

    let body: AuthResponse = test::read_body_json(resp).await;
    body.token
}

/// Posts a login request and hands back the raw response.
pub async fn login<S, B>(app: &S, email: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    test::call_service(app, req).await
}

/// Creates a task from `body` and returns the created task as JSON.
pub async fn create_task<S, B>(app: &S, token: &str, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/todos")
        .insert_header(bearer(token))
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}

pub async fn list_tasks<S, B>(app: &S, token: &str, query: &str) -> Vec<Value>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/todos{}", query))
        .insert_header(bearer(token))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);
    test::read_body_json(resp).await
}
