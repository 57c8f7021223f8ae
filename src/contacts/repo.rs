use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Contact, ContactChanges, ContactFilter, NewContact};
use crate::error::AppError;

/// Owner-scoped contact storage. Another owner's row behaves as missing.
#[async_trait]
pub trait ContactRepo: Send + Sync {
    async fn list(&self, owner: Uuid, filter: ContactFilter) -> Result<Vec<Contact>, AppError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>, AppError>;
    async fn create(&self, owner: Uuid, new: NewContact) -> Result<Contact, AppError>;
    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: ContactChanges,
    ) -> Result<Option<Contact>, AppError>;
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>, AppError>;
}

const CONTACT_COLUMNS: &str = "id, owner_id, name, email, phone, favorite, created_at";

#[derive(Clone)]
pub struct PgContactRepo {
    db: PgPool,
}

impl PgContactRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactRepo for PgContactRepo {
    async fn list(&self, owner: Uuid, filter: ContactFilter) -> Result<Vec<Contact>, AppError> {
        let rows = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {CONTACT_COLUMNS}
              FROM contacts
             WHERE owner_id = $1
               AND ($2::boolean IS NULL OR favorite = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner)
        .bind(filter.favorite)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>, AppError> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, owner: Uuid, new: NewContact) -> Result<Contact, AppError> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contacts (owner_id, name, email, phone, favorite)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.favorite)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: ContactChanges,
    ) -> Result<Option<Contact>, AppError> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            UPDATE contacts
               SET name     = COALESCE($3, name),
                   email    = COALESCE($4, email),
                   phone    = COALESCE($5, phone),
                   favorite = COALESCE($6, favorite)
             WHERE id = $1 AND owner_id = $2
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.favorite)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Contact>, AppError> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            "DELETE FROM contacts WHERE id = $1 AND owner_id = $2 RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
