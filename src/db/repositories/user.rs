use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::{FieldError, NewUser};
use crate::entities::{microposts, prelude::*, users};

use super::SaveError;

/// User data handed out of the repository (the password digest stays behind).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub remember_token: String,
    pub admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            remember_token: model.remember_token,
            admin: model.admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a user from a validated signup request.
    ///
    /// Runs the field validators plus the case-insensitive email uniqueness
    /// check, aggregating everything into one failure list. The email is
    /// persisted lower-cased and a fresh remember token is assigned. `admin`
    /// is always false here; there is no bulk path to it.
    pub async fn create(
        &self,
        new_user: &NewUser,
        security: &SecurityConfig,
    ) -> Result<User, SaveError> {
        let mut failures = new_user.validate().err().unwrap_or_default();

        let email = new_user.normalized_email();
        if failures.iter().all(|f| f.field != "email") {
            let taken = Users::find()
                .filter(users::Column::Email.eq(&email))
                .one(&self.conn)
                .await
                .context("Failed to check email uniqueness")?;

            if taken.is_some() {
                failures.push(FieldError::new("email", "has already been taken"));
            }
        }

        if !failures.is_empty() {
            return Err(SaveError::Invalid(failures));
        }

        let password = new_user.password.clone();
        let security = security.clone();
        let digest = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            name: Set(new_user.name.clone()),
            email: Set(email),
            password_digest: Set(digest),
            remember_token: Set(generate_remember_token()),
            admin: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        // The unique column is the backstop for a concurrent signup racing
        // past the lookup above.
        let model = active.insert(&self.conn).await.map_err(|e| {
            if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
                SaveError::Invalid(vec![FieldError::new("email", "has already been taken")])
            } else {
                SaveError::Database(anyhow::Error::new(e).context("Failed to insert user"))
            }
        })?;

        Ok(User::from(model))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Lookup by email, lower-casing the input first.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn find_by_remember_token(&self, token: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::RememberToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by remember token")?;

        Ok(user.map(User::from))
    }

    /// Verify a candidate password for the account behind `email`.
    ///
    /// Returns `None` for an unknown email and for a wrong password alike;
    /// a wrong password is not an error.
    ///
    /// Note: verification uses `spawn_blocking` because Argon2 is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user for authentication")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let digest = user.password_digest.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&digest)
                .map_err(|e| anyhow::anyhow!("Invalid password digest format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Rotate the remember token, invalidating the previous one.
    pub async fn regenerate_remember_token(&self, id: i32) -> Result<String> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for token rotation")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let token = generate_remember_token();
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.remember_token = Set(token.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(token)
    }

    /// Delete a user and every micropost they own in one transaction.
    /// If either delete fails the whole operation rolls back; no orphaned
    /// posts, no half-deleted account.
    pub async fn delete_with_microposts(&self, id: i32) -> Result<bool> {
        let deleted = self
            .conn
            .transaction::<_, bool, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    Microposts::delete_many()
                        .filter(microposts::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;

                    let res = Users::delete_by_id(id).exec(txn).await?;
                    Ok(res.rows_affected > 0)
                })
            })
            .await
            .context("User deletion transaction failed")?;

        Ok(deleted)
    }
}

/// Hash a password with Argon2id using the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a fresh remember token (64 character hex string).
#[must_use]
pub fn generate_remember_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
