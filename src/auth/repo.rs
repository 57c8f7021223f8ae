use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, Subscription, User, UserRow},
    error::AppError,
};

/// Persistence for user records.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Fails with `Conflict` when the email is already stored.
    async fn create(&self, new: NewUser) -> Result<User, AppError>;

    async fn set_session_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError>;

    /// Marks the owner of `token` verified and clears the token in one step.
    async fn verify_by_token(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn update_subscription(
        &self,
        id: Uuid,
        subscription: Subscription,
    ) -> Result<Option<User>, AppError>;

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> Result<(), AppError>;

    async fn delete_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, subscription, avatar_url, \
     verification_token, verified, session_token, created_at";

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        let res = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, subscription, avatar_url, verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.subscription.as_str())
        .bind(&new.avatar_url)
        .bind(&new.verification_token)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::Conflict("Email in use".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_session_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET session_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn verify_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET verified = TRUE, verification_token = NULL
             WHERE verification_token = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        subscription: Subscription,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET subscription = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(subscription.as_str())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar_url = $2 WHERE id = $1")
            .bind(id)
            .bind(avatar_url)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM users WHERE email = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }
}
