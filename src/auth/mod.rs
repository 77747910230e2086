pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;
use crate::models::NewAccount;

// Re-export necessary items
pub use extractors::AuthenticatedAccount;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, hash_token};

/// Represents the payload for a new account registration request.
///
/// Every field is optional at the wire level so that a missing field is reported as a
/// field error rather than a body parse failure.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(required, length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[validate(required, email, length(max = 255))]
    pub email: Option<String>,
    /// At least 8 characters and equal to `password_confirmation`.
    #[validate(required, length(min = 8))]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl TryFrom<RegisterRequest> for NewAccount {
    type Error = AppError;

    fn try_from(request: RegisterRequest) -> Result<Self, Self::Error> {
        let request = RegisterRequest {
            first_name: request.first_name.map(|name| name.trim().to_string()),
            last_name: request.last_name.map(|name| name.trim().to_string()),
            email: request.email.map(|email| normalize_email(&email)),
            ..request
        };

        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);
        if request.password.is_some() && request.password != request.password_confirmation {
            errors.add("password", ValidationError::new("must_match"));
        }
        if !errors.errors().is_empty() {
            return Err(errors.into());
        }

        Ok(NewAccount {
            first_name: request.first_name.unwrap_or_default(),
            last_name: request.last_name.unwrap_or_default(),
            email: request.email.unwrap_or_default(),
            password: request.password.unwrap_or_default(),
        })
    }
}

/// Represents the payload for a login request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required)]
    pub password: Option<String>,
}

/// Login data that has passed validation.
pub struct Credentials {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = AppError;

    fn try_from(request: LoginRequest) -> Result<Self, Self::Error> {
        let request = LoginRequest {
            email: request.email.map(|email| normalize_email(&email)),
            password: request.password.filter(|password| !password.is_empty()),
        };
        request.validate()?;

        Ok(Credentials {
            email: request.email.unwrap_or_default(),
            password: request.password.unwrap_or_default(),
        })
    }
}

/// Response body after successful registration or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer token for subsequent requests.
    pub token: String,
}

/// Emails compare case-insensitively, so they are stored lower-cased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("Ada@Example.com ".into()),
            password: Some("password123".into()),
            password_confirmation: Some("password123".into()),
        }
    }

    fn field_errors(error: AppError) -> crate::error::FieldErrors {
        match error {
            AppError::ValidationError(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_register_request_validation() {
        let account = NewAccount::try_from(valid_register()).unwrap();
        assert_eq!(account.email(), "ada@example.com");
        assert_eq!(account.first_name, "Ada");

        let errors = field_errors(NewAccount::try_from(RegisterRequest::default()).unwrap_err());
        for field in ["first_name", "last_name", "email", "password"] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
        assert_eq!(
            errors["first_name"],
            vec!["The first name field is required.".to_string()]
        );

        let request = RegisterRequest {
            email: Some("not-an-email".into()),
            ..valid_register()
        };
        let errors = field_errors(NewAccount::try_from(request).unwrap_err());
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["email"]);

        let request = RegisterRequest {
            first_name: Some("a".repeat(256)),
            ..valid_register()
        };
        assert!(field_errors(NewAccount::try_from(request).unwrap_err()).contains_key("first_name"));
    }

    #[test]
    fn test_register_password_rules() {
        let request = RegisterRequest {
            password: Some("short".into()),
            password_confirmation: Some("short".into()),
            ..valid_register()
        };
        let errors = field_errors(NewAccount::try_from(request).unwrap_err());
        assert_eq!(
            errors["password"],
            vec!["The password field must be at least 8 characters.".to_string()]
        );

        let request = RegisterRequest {
            password_confirmation: Some("password124".into()),
            ..valid_register()
        };
        let errors = field_errors(NewAccount::try_from(request).unwrap_err());
        assert_eq!(
            errors["password"],
            vec!["The password field confirmation does not match.".to_string()]
        );

        let request = RegisterRequest {
            password_confirmation: None,
            ..valid_register()
        };
        assert!(NewAccount::try_from(request).is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let credentials = Credentials::try_from(LoginRequest {
            email: Some(" Test@Example.com".into()),
            password: Some("anything".into()),
        })
        .unwrap();
        assert_eq!(credentials.email, "test@example.com");
        assert!(!format!("{:?}", credentials).contains("anything"));

        let errors = field_errors(
            Credentials::try_from(LoginRequest {
                email: Some("testexample.com".into()),
                password: Some(String::new()),
            })
            .unwrap_err(),
        );
        assert!(errors.contains_key("email"));
        assert_eq!(
            errors["password"],
            vec!["The password field is required.".to_string()]
        );
    }
}
