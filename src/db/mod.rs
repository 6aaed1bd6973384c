use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{NewMicropost, NewUser};

pub mod migrator;
pub mod repositories;

pub use repositories::SaveError;
pub use repositories::micropost::Micropost;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // A pooled in-memory sqlite would give each connection its own
        // empty database, so pin the pool to a single connection there.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn micropost_repo(&self) -> repositories::micropost::MicropostRepository {
        repositories::micropost::MicropostRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        new_user: &NewUser,
        security: &SecurityConfig,
    ) -> Result<User, SaveError> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn find_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().find_by_id(id).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().find_by_email(email).await
    }

    pub async fn find_user_by_remember_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().find_by_remember_token(token).await
    }

    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().authenticate(email, password).await
    }

    pub async fn regenerate_remember_token(&self, user_id: i32) -> Result<String> {
        self.user_repo().regenerate_remember_token(user_id).await
    }

    pub async fn delete_user_with_microposts(&self, user_id: i32) -> Result<bool> {
        self.user_repo().delete_with_microposts(user_id).await
    }

    // ========== Microposts ==========

    pub async fn create_micropost(
        &self,
        user_id: i32,
        new_post: &NewMicropost,
    ) -> Result<Micropost, SaveError> {
        self.micropost_repo().create(user_id, new_post).await
    }

    pub async fn find_micropost(&self, id: i32) -> Result<Option<Micropost>> {
        self.micropost_repo().find_by_id(id).await
    }

    pub async fn find_micropost_owned(&self, id: i32, user_id: i32) -> Result<Option<Micropost>> {
        self.micropost_repo().find_owned(id, user_id).await
    }

    pub async fn delete_micropost(&self, id: i32) -> Result<bool> {
        self.micropost_repo().delete(id).await
    }

    pub async fn microposts_for_user(&self, user_id: i32) -> Result<Vec<Micropost>> {
        self.micropost_repo().for_user(user_id).await
    }

    /// The feed is the user's own posts in this snapshot, newest first.
    pub async fn feed(&self, user_id: i32) -> Result<Vec<Micropost>> {
        self.micropost_repo().for_user(user_id).await
    }
}
