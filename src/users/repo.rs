use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for accounts. Implementations own the stored
/// representation; callers only ever get copies.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Inserts a new account. Fails with [`StoreError::DuplicateEmail`] when the
    /// email is taken, even if a caller's earlier existence check raced.
    async fn create(
        &self,
        email: &str,
        full_name: Option<&str>,
        hashed_password: &str,
    ) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        // connection goes back to the pool when `conn` drops
        let mut conn = self.pool.acquire().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, hashed_password, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, hashed_password, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        email: &str,
        full_name: Option<&str>,
        hashed_password: &str,
    ) -> Result<User, StoreError> {
        // an uncommitted transaction rolls back on drop
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, full_name, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING id, email, full_name, hashed_password, is_active
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(hashed_password)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;
        tx.commit().await?;
        Ok(user)
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(err),
    }
}
