use serde::{Deserialize, Serialize};

use super::repo_types::{Contact, ContactChanges, ContactFilter, NewContact};
use crate::{
    error::AppError,
    validation::{is_valid_email, Validate},
};

const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl Validate for CreateContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [("name", &self.name), ("email", &self.email), ("phone", &self.phone)] {
            if value.as_deref().map(str::trim).unwrap_or_default().is_empty() {
                return Err(AppError::validation(format!("missing required {} field", field)));
            }
        }
        check_fields(self.email.as_deref(), self.phone.as_deref())
    }
}

impl From<CreateContactRequest> for NewContact {
    fn from(r: CreateContactRequest) -> Self {
        Self {
            name: r.name.unwrap_or_default().trim().to_string(),
            email: r.email.unwrap_or_default().trim().to_string(),
            phone: r.phone.unwrap_or_default().trim().to_string(),
            favorite: r.favorite.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl Validate for UpdateContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.favorite.is_none() {
            return Err(AppError::validation("missing fields"));
        }
        if matches!(self.name.as_deref().map(str::trim), Some("")) {
            return Err(AppError::validation("name must not be empty"));
        }
        check_fields(self.email.as_deref(), self.phone.as_deref())
    }
}

impl From<UpdateContactRequest> for ContactChanges {
    fn from(r: UpdateContactRequest) -> Self {
        Self {
            name: r.name.map(|v| v.trim().to_string()),
            email: r.email.map(|v| v.trim().to_string()),
            phone: r.phone.map(|v| v.trim().to_string()),
            favorite: r.favorite,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: Option<bool>,
}

impl Validate for FavoriteRequest {
    fn validate(&self) -> Result<(), AppError> {
        self.favorite
            .map(|_| ())
            .ok_or_else(|| AppError::validation("missing field favorite"))
    }
}

fn check_fields(email: Option<&str>, phone: Option<&str>) -> Result<(), AppError> {
    if let Some(email) = email {
        if !is_valid_email(email.trim()) {
            return Err(AppError::validation("Invalid email"));
        }
    }
    if let Some(phone) = phone {
        let phone = phone.trim();
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
        if digits < 3 || !allowed {
            return Err(AppError::validation("Invalid phone"));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub favorite: Option<bool>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl ListQuery {
    pub fn filter(&self) -> Result<ContactFilter, AppError> {
        if self.page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(AppError::validation(format!("limit must be between 1 and {}", MAX_LIMIT)));
        }
        let offset = (self.page - 1)
            .checked_mul(self.limit)
            .ok_or_else(|| AppError::validation("page out of range"))?;
        Ok(ContactFilter {
            limit: self.limit,
            offset,
            favorite: self.favorite,
        })
    }
}

impl Validate for ListQuery {
    fn validate(&self) -> Result<(), AppError> {
        self.filter().map(|_| ())
    }
}

#[derive(Debug, Serialize)]
pub struct ContactList {
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Serialize)]
pub struct ContactBody {
    pub contact: Contact,
}
