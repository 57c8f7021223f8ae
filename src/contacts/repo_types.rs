use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub favorite: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl ContactChanges {
    pub fn apply(self, c: &mut Contact) {
        if let Some(v) = self.name {
            c.name = v;
        }
        if let Some(v) = self.email {
            c.email = v;
        }
        if let Some(v) = self.phone {
            c.phone = v;
        }
        if let Some(v) = self.favorite {
            c.favorite = v;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContactFilter {
    pub limit: i64,
    pub offset: i64,
    pub favorite: Option<bool>,
}
