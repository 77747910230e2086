use actix_web::web;
use chrono::Utc;
use sqlx::{Executor, Sqlite};

use crate::auth::{generate_token, hash_password, hash_token, verify_password, Credentials};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{Account, NewAccount};

const EMAIL_TAKEN: &str = "The email has already been taken.";
const NO_SUCH_ACCOUNT: &str = "The provided email is not registered. Please register.";
const WRONG_PASSWORD: &str = "The provided password is incorrect.";
pub const UNAUTHENTICATED: &str = "Unauthenticated.";

/// Registers accounts, verifies credentials and manages bearer tokens.
///
/// A token is `active` while its digest is present in `access_tokens`. Logout deletes
/// every row for the account, which is the only way out of `active`.
#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(pool: DbPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// Creates the account and its first token in one transaction and returns the token.
    pub async fn register(&self, account: NewAccount) -> Result<String, AppError> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM accounts WHERE email = ?")
            .bind(account.email())
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::field("email", EMAIL_TAKEN));
        }

        let NewAccount {
            first_name,
            last_name,
            email,
            password,
        } = account;
        let cost = self.bcrypt_cost;
        let password_hash = web::block(move || hash_password(&password, cost)).await??;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let inserted: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO accounts (first_name, last_name, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&first_name)
        .bind(&last_name)
        .bind(&email)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await;

        let account_id = match inserted {
            Ok((id,)) => id,
            // Lost a race with a concurrent registration of the same address.
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(AppError::field("email", EMAIL_TAKEN));
            }
            Err(err) => return Err(err.into()),
        };

        let token = insert_token(&mut *tx, account_id).await?;
        tx.commit().await?;

        log::info!("registered account {}", account_id);
        Ok(token)
    }

    /// Issues an additional token; tokens from earlier logins stay valid.
    pub async fn login(&self, credentials: Credentials) -> Result<String, AppError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM accounts WHERE email = ?")
                .bind(&credentials.email)
                .fetch_optional(&self.pool)
                .await?;

        let (account_id, password_hash) =
            row.ok_or_else(|| AppError::Unauthorized(NO_SUCH_ACCOUNT.into()))?;

        let password = credentials.password;
        let matches = web::block(move || verify_password(&password, &password_hash)).await??;
        if !matches {
            log::info!("rejected login for account {}: wrong password", account_id);
            return Err(AppError::Unauthorized(WRONG_PASSWORD.into()));
        }

        let token = insert_token(&self.pool, account_id).await?;
        log::info!("account {} logged in", account_id);
        Ok(token)
    }

    /// Revokes every token of `account`, not only the one used for this request.
    pub async fn logout(&self, account: &Account) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE account_id = ?")
            .bind(account.id)
            .execute(&self.pool)
            .await?;

        log::info!(
            "account {} logged out, {} token(s) revoked",
            account.id,
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    /// Resolves a presented token to its owning account.
    pub async fn resolve_token(&self, token: &str) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            "SELECT a.id, a.first_name, a.last_name, a.email, a.created_at, a.updated_at \
             FROM access_tokens t JOIN accounts a ON a.id = t.account_id \
             WHERE t.token_hash = ?",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized(UNAUTHENTICATED.into()))
    }
}

async fn insert_token<'e, E>(executor: E, account_id: i64) -> Result<String, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let token = generate_token();
    sqlx::query("INSERT INTO access_tokens (account_id, token_hash, created_at) VALUES (?, ?, ?)")
        .bind(account_id)
        .bind(hash_token(&token))
        .bind(Utc::now())
        .execute(executor)
        .await?;
    Ok(token)
}
