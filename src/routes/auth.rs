use crate::{
    auth::{
        AuthMiddleware, AuthResponse, AuthenticatedAccount, Credentials, LoginRequest,
        RegisterRequest,
    },
    error::AppError,
    models::NewAccount,
    services::AuthService,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new account
///
/// Creates the account and returns its first bearer token.
///
/// ## Responses:
/// - `201 Created`: `{"token": "..."}`.
/// - `422 Unprocessable Entity`: field errors, including an already registered email.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let account = NewAccount::try_from(body.into_inner())?;
    let token = auth.register(account).await?;

    Ok(HttpResponse::Created().json(AuthResponse { token }))
}

/// Login
///
/// Issues an additional token. Tokens from earlier logins remain valid.
///
/// ## Responses:
/// - `200 OK`: `{"token": "..."}`.
/// - `401 Unauthorized`: unknown email or wrong password.
/// - `422 Unprocessable Entity`: missing or malformed fields.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let credentials = Credentials::try_from(body.into_inner())?;
    let token = auth.login(credentials).await?;

    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

/// Logout
///
/// Revokes every token of the calling account.
#[post("/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    auth: web::Data<AuthService>,
    caller: AuthenticatedAccount,
) -> Result<impl Responder, AppError> {
    auth.logout(&caller.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}

/// The calling account.
#[get("/me", wrap = "AuthMiddleware")]
pub async fn me(caller: AuthenticatedAccount) -> impl Responder {
    HttpResponse::Ok().json(caller.0)
}
