use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// The public projection of a registered account. The password hash never leaves
/// the auth service, so it is not part of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identifies the account that owns a set of tasks.
///
/// Only obtainable from a resolved `Account`, which in turn only comes out of token
/// resolution, so task queries cannot be issued on behalf of an arbitrary id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerId(i64);

impl OwnerId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<&Account> for OwnerId {
    fn from(account: &Account) -> Self {
        OwnerId(account.id)
    }
}

/// Registration data that has passed validation.
///
/// Built only through `TryFrom<RegisterRequest>`; `email` is already normalised.
pub struct NewAccount {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl NewAccount {
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_serialization_has_no_secret_fields() {
        let now = Utc::now();
        let account = Account {
            id: 7,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());

        assert_eq!(OwnerId::from(&account).get(), 7);
    }

    #[test]
    fn test_new_account_debug_redacts_password() {
        let account = NewAccount {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "correct horse battery".into(),
        };

        let printed = format!("{:?}", account);
        assert!(printed.contains("ada@example.com"));
        assert!(!printed.contains("correct horse battery"));
    }
}
