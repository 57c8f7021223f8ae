use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Subscription tier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    Starter,
    Pro,
    Business,
}

impl Subscription {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::Starter => "starter",
            Subscription::Pro => "pro",
            Subscription::Business => "business",
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subscription {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Subscription::Starter),
            "pro" => Ok(Subscription::Pro),
            "business" => Ok(Subscription::Business),
            other => Err(format!("unknown subscription '{}'", other)),
        }
    }
}

/// Row as stored in `users`.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub subscription: String,
    pub avatar_url: String,
    pub verification_token: Option<String>,
    pub verified: bool,
    pub session_token: Option<String>,
    pub created_at: OffsetDateTime,
}

/// User record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub subscription: Subscription,
    pub avatar_url: String,
    pub verification_token: Option<String>, // cleared once verified
    pub verified: bool,
    pub session_token: Option<String>, // single live bearer token
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            // the column carries a CHECK constraint, so unknown values never appear
            subscription: r.subscription.parse().unwrap_or_default(),
            avatar_url: r.avatar_url,
            verification_token: r.verification_token,
            verified: r.verified,
            session_token: r.session_token,
            created_at: r.created_at,
        }
    }
}

/// Fields supplied when inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub subscription: Subscription,
    pub avatar_url: String,
    pub verification_token: String,
}
