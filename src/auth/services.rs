//! Account lifecycle: registration, verification, sessions, profile updates.
use std::path::PathBuf;

use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, LoginResponse, LoginUser, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_decoy, verify_password},
    repo_types::{NewUser, Subscription, User},
    verification::{default_avatar_url, generate_token},
};
use crate::{avatars, error::AppError, mail::verification_message, state::AppState};

const BAD_CREDENTIALS: &str = "Email or password is wrong";

/// Creates an unverified account and mails its verification link.
pub async fn register(st: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let email = req.email.trim().to_string();
    let subscription = req.subscription();

    // CPU-heavy; keep it off the reactor
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;

    let user = st
        .users
        .create(NewUser {
            avatar_url: default_avatar_url(&email),
            email,
            password_hash,
            subscription,
            verification_token: generate_token(),
        })
        .await?;

    // freshly created users always carry a token
    let token = user.verification_token.as_deref().unwrap_or_default();
    st.mailer
        .send(verification_message(&st.config, &user.email, token))
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials and issues the user's single live session token.
pub async fn login(st: &AppState, req: LoginRequest) -> Result<LoginResponse, AppError> {
    let email = req.email.trim();
    let Some(user) = st.users.find_by_email(email).await? else {
        let password = req.password;
        tokio::task::spawn_blocking(move || verify_decoy(&password))
            .await
            .map_err(anyhow::Error::from)?;
        warn!(email, "login unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    let hash = user.password_hash.clone();
    let password = req.password;
    let password_ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(anyhow::Error::from)??;

    if !password_ok || !user.verified {
        warn!(user_id = %user.id, password_ok, verified = user.verified, "login rejected");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_ref(st).sign(user.id, &user.email)?;
    st.users.set_session_token(user.id, Some(&token)).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        token,
        user: LoginUser {
            email: user.email,
            subscription: user.subscription,
        },
    })
}

pub async fn logout(st: &AppState, user_id: Uuid) -> Result<(), AppError> {
    st.users.set_session_token(user_id, None).await?;
    info!(%user_id, "user logged out");
    Ok(())
}

pub async fn current(st: &AppState, user_id: Uuid) -> Result<User, AppError> {
    st.users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Conflict("User no longer exists".into()))
}

/// Changes the tier of `target`; only the owner may do so.
pub async fn update_subscription(
    st: &AppState,
    caller: Uuid,
    target: Uuid,
    subscription: Subscription,
) -> Result<User, AppError> {
    if caller != target {
        warn!(%caller, %target, "subscription change for another user refused");
        return Err(AppError::Forbidden("Cannot change another user's subscription".into()));
    }
    let user = st
        .users
        .update_subscription(target, subscription)
        .await?
        .ok_or_else(AppError::not_found)?;
    info!(user_id = %user.id, %subscription, "subscription updated");
    Ok(user)
}

/// Normalizes the uploaded file, moves it to public storage and points the user at it.
pub async fn update_avatar(
    st: &AppState,
    user_id: Uuid,
    temp_path: PathBuf,
    original_name: &str,
) -> Result<String, AppError> {
    if let Err(e) = avatars::normalize(temp_path.clone()).await {
        warn!(error = %e, %user_id, "avatar rejected");
        if let Err(rm) = tokio::fs::remove_file(&temp_path).await {
            warn!(error = %rm, path = %temp_path.display(), "temp upload not removed");
        }
        return Err(AppError::validation("Avatar must be a readable image"));
    }

    let previous = st.users.find_by_id(user_id).await?.map(|u| u.avatar_url);

    let file_name = avatars::public_file_name(user_id, original_name);
    let avatar_url = st.storage.put_file(&temp_path, &file_name).await?;
    st.users.update_avatar(user_id, &avatar_url).await?;

    if let Some(old_key) = previous
        .as_deref()
        .and_then(|url| st.storage.key_for_url(url))
        .filter(|key| *key != file_name)
    {
        if let Err(e) = st.storage.delete_object(old_key).await {
            warn!(error = %e, key = old_key, "previous avatar not removed");
        }
    }

    info!(%user_id, %avatar_url, "avatar updated");
    Ok(avatar_url)
}

/// Exchanges a mailed token for a verified account. Each token works once.
pub async fn verify(st: &AppState, token: &str) -> Result<User, AppError> {
    let user = st
        .users
        .verify_by_token(token)
        .await?
        .ok_or_else(AppError::not_found)?;
    info!(user_id = %user.id, "email verified");
    Ok(user)
}

pub async fn resend_verification(st: &AppState, email: &str) -> Result<(), AppError> {
    let user = st
        .users
        .find_by_email(email.trim())
        .await?
        .ok_or_else(|| AppError::validation("Incorrect email"))?;

    let token = match (user.verified, user.verification_token.as_deref()) {
        (false, Some(token)) => token,
        _ => {
            return Err(AppError::validation(
                "Verification has already been passed",
            ))
        }
    };

    st.mailer
        .send(verification_message(&st.config, &user.email, token))
        .await?;
    info!(user_id = %user.id, "verification mail resent");
    Ok(())
}

pub async fn delete_user_by_email(st: &AppState, caller: Uuid, email: &str) -> Result<(), AppError> {
    let user = st
        .users
        .delete_by_email(email.trim())
        .await?
        .ok_or_else(AppError::not_found)?;

    if let Some(key) = st.storage.key_for_url(&user.avatar_url) {
        if let Err(e) = st.storage.delete_object(key).await {
            warn!(error = %e, key, "avatar of deleted user not removed");
        }
    }

    info!(%caller, user_id = %user.id, email = %user.email, "user deleted");
    Ok(())
}
