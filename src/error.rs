//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a client can observe falls into one of four families: validation (422),
//! authentication (401), not found (404) and internal (500), plus 400 for bodies that
//! cannot be parsed at all.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can simply return
//! `Result<_, AppError>`. `From` implementations for `sqlx::Error`,
//! `validator::ValidationErrors`, `bcrypt::BcryptError` and actix's `BlockingError`
//! allow conversion with the `?` operator.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use validator::{ValidationError, ValidationErrors};

/// Field name to the list of human readable messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed or revoked credentials (HTTP 401).
    Unauthorized(String),
    /// A request body that could not be parsed (HTTP 400).
    BadRequest(String),
    /// Unmatched resource, or a resource the caller does not own (HTTP 404).
    NotFound(String),
    /// Unexpected server-side failure (HTTP 500).
    /// The message is returned to the client, so it must stay generic.
    InternalServerError(String),
    /// Storage failure (HTTP 500). The detail is logged, never returned.
    DatabaseError(String),
    /// Field-keyed input validation failures (HTTP 422).
    ValidationError(FieldErrors),
}

impl AppError {
    /// Builds a validation error for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::ValidationError(errors)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(errors) => {
                write!(f, "Validation Error:")?;
                for (field, messages) in errors {
                    write!(f, " {}: {};", field, messages.join(" "))?;
                }
                Ok(())
            }
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg) => json!({ "error": msg }),
            AppError::DatabaseError(detail) => {
                log::error!("database error: {}", detail);
                json!({ "error": "Internal server error" })
            }
            AppError::ValidationError(errors) => {
                let message = errors
                    .values()
                    .flatten()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| "The given data was invalid.".to_string());
                json!({ "message": message, "errors": errors })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// `RowNotFound` becomes `NotFound`; everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|error| describe(field, error))
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::ValidationError(fields)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        log::error!("password hashing failed: {}", error);
        AppError::InternalServerError("Internal server error".into())
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        log::error!("blocking task failed: {}", error);
        AppError::InternalServerError("Internal server error".into())
    }
}

/// Turns a validator error into a sentence naming the field.
fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let name = field.replace('_', " ");
    match error.code.as_ref() {
        "required" => format!("The {} field is required.", name),
        "email" => format!("The {} field must be a valid email address.", name),
        "must_match" => format!("The {} field confirmation does not match.", name),
        "date" => format!("The {} field must be a valid date.", name),
        "length" => describe_length(&name, error),
        _ => format!("The {} field is invalid.", name),
    }
}

fn describe_length(name: &str, error: &ValidationError) -> String {
    let param = |key: &str| error.params.get(key).and_then(Value::as_u64);
    let len = error
        .params
        .get("value")
        .and_then(Value::as_str)
        .map(|value| value.chars().count() as u64);

    match (len, param("min"), param("max")) {
        (Some(0), _, _) => format!("The {} field is required.", name),
        (Some(len), Some(min), _) if len < min => {
            format!("The {} field must be at least {} characters.", name, min)
        }
        (_, _, Some(max)) => format!(
            "The {} field must not be greater than {} characters.",
            name, max
        ),
        _ => format!("The {} field is invalid.", name),
    }
}
