use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Subscription, User};
use crate::{
    error::AppError,
    validation::{is_valid_email, Validate},
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub subscription: Option<String>,
}

impl RegisterRequest {
    pub fn subscription(&self) -> Subscription {
        self.subscription
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        check_credentials(&self.email, &self.password)?;
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if let Some(tier) = self.subscription.as_deref() {
            tier.parse::<Subscription>().map_err(AppError::Validation)?;
        }
        Ok(())
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        check_credentials(&self.email, &self.password)
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::validation("Email or password is missing"));
    }
    if !is_valid_email(email.trim()) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: Option<String>,
}

impl SubscriptionRequest {
    pub fn tier(&self) -> Result<Subscription, AppError> {
        let raw = self
            .subscription
            .as_deref()
            .ok_or_else(|| AppError::validation("missing field subscription"))?;
        raw.parse().map_err(AppError::Validation)
    }
}

impl Validate for SubscriptionRequest {
    fn validate(&self) -> Result<(), AppError> {
        self.tier().map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: Option<String>,
}

impl Validate for ResendVerificationRequest {
    fn validate(&self) -> Result<(), AppError> {
        match self.email.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => Ok(()),
            _ => Err(AppError::validation("missing required field email")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserQuery {
    pub email: Option<String>,
}

impl Validate for DeleteUserQuery {
    fn validate(&self) -> Result<(), AppError> {
        match self.email.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => Ok(()),
            _ => Err(AppError::validation("missing query parameter email")),
        }
    }
}

/// Token and public profile returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub email: String,
    pub subscription: Subscription,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub subscription: Subscription,
    pub avatar_url: String,
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            subscription: u.subscription,
            avatar_url: u.avatar_url,
            verified: u.verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, sub: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            subscription: sub.map(Into::into),
        }
    }

    #[test]
    fn register_rules() {
        assert!(register("a@x.com", "pw123456", None).validate().is_ok());
        assert!(register("a@x.com", "pw123456", Some("pro")).validate().is_ok());
        assert!(register("", "pw123456", None).validate().is_err());
        assert!(register("a@x.com", "short", None).validate().is_err());
        assert!(register("not-an-email", "pw123456", None).validate().is_err());
        assert!(register("a@x.com", "pw123456", Some("gold")).validate().is_err());
    }

    #[test]
    fn register_defaults_to_starter() {
        assert_eq!(register("a@x.com", "pw123456", None).subscription(), Subscription::Starter);
        assert_eq!(
            register("a@x.com", "pw123456", Some("business")).subscription(),
            Subscription::Business
        );
    }

    #[test]
    fn login_requires_both_fields() {
        let ok = LoginRequest { email: "a@x.com".into(), password: "x".into() };
        assert!(ok.validate().is_ok());
        let missing = LoginRequest { email: "a@x.com".into(), password: String::new() };
        let err = missing.validate().unwrap_err();
        assert_eq!(err.to_string(), "Email or password is missing");
    }

    #[test]
    fn subscription_request_rules() {
        let none = SubscriptionRequest { subscription: None };
        assert_eq!(none.validate().unwrap_err().to_string(), "missing field subscription");
        let bad = SubscriptionRequest { subscription: Some("platinum".into()) };
        assert!(bad.validate().is_err());
        let good = SubscriptionRequest { subscription: Some("pro".into()) };
        assert_eq!(good.tier().unwrap(), Subscription::Pro);
    }

    #[test]
    fn resend_requires_email() {
        assert!(ResendVerificationRequest { email: None }.validate().is_err());
        assert!(ResendVerificationRequest { email: Some("  ".into()) }.validate().is_err());
        assert!(ResendVerificationRequest { email: Some("a@x.com".into()) }.validate().is_ok());
    }

    #[test]
    fn public_user_uses_camel_case() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            subscription: Subscription::Starter,
            avatar_url: "avatars/x.png".into(),
            verified: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["avatarUrl"], "avatars/x.png");
        assert_eq!(json["subscription"], "starter");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("passwordHash").is_none());
    }
}
