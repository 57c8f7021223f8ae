use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{
        AvatarResponse, CurrentResponse, DeleteUserQuery, LoginRequest, LoginResponse,
        PublicUser, RegisterRequest, ResendVerificationRequest, SubscriptionRequest,
    },
    extractors::AuthUser,
    services,
};
use crate::{
    avatars,
    error::AppError,
    response::{ApiResponse, Message},
    state::AppState,
    validation::{parse_id, ValidJson, ValidQuery},
};

const AVATAR_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/verify", post(resend_verification))
        .route("/users/verify/:verification_token", get(verify))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users/current", get(current))
        .route(
            "/users/avatar",
            patch(update_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/users/:user_id", patch(update_subscription))
        .route("/users", delete(delete_user_by_email))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<ApiResponse<Message>, AppError> {
    services::register(&state, payload).await?;
    Ok(ApiResponse::created(Message {
        message: "Registration successful".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    let resp = services::login(&state, payload).await?;
    Ok(ApiResponse::ok(resp))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<StatusCode, AppError> {
    services::logout(&state, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<CurrentResponse>, AppError> {
    let user = services::current(&state, user.id).await?;
    Ok(ApiResponse::ok(CurrentResponse { user: user.into() }))
}

#[instrument(skip(state, caller, payload), fields(caller = %caller.id))]
pub async fn update_subscription(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
    ValidJson(payload): ValidJson<SubscriptionRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let target = parse_id(&user_id)?;
    let user = services::update_subscription(&state, caller.id, target, payload.tier()?).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// PATCH /users/avatar (multipart, field `avatar`)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn update_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<AvatarResponse>, AppError> {
    let mut mp = mp.map_err(|e| AppError::validation(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("avatar").to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        if !body.is_empty() {
            upload = Some((original_name, body));
        }
        break;
    }

    let Some((original_name, body)) = upload else {
        warn!("avatar upload without file");
        return Err(AppError::validation("Avatar must be provided"));
    };

    let temp_path =
        avatars::write_temp_upload(&state.config.avatars.tmp_dir, &original_name, body).await?;
    let avatar_url = services::update_avatar(&state, user.id, temp_path, &original_name).await?;
    Ok(ApiResponse::ok(AvatarResponse { avatar_url }))
}

#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    Path(verification_token): Path<String>,
) -> Result<ApiResponse<Message>, AppError> {
    services::verify(&state, &verification_token).await?;
    Ok(ApiResponse::message("Verification successful"))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ResendVerificationRequest>,
) -> Result<ApiResponse<Message>, AppError> {
    let email = payload.email.unwrap_or_default();
    services::resend_verification(&state, &email).await?;
    Ok(ApiResponse::message("Verification email sent"))
}

#[instrument(skip(state, caller), fields(caller = %caller.id))]
pub async fn delete_user_by_email(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidQuery(q): ValidQuery<DeleteUserQuery>,
) -> Result<ApiResponse<Message>, AppError> {
    let email = q.email.unwrap_or_default();
    services::delete_user_by_email(&state, caller.id, &email).await?;
    Ok(ApiResponse::message("User deleted from data base"))
}
