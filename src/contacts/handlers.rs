use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Router,
};
use tracing::{info, instrument};

use super::dto::{
    ContactBody, ContactList, CreateContactRequest, FavoriteRequest, ListQuery,
    UpdateContactRequest,
};
use super::repo_types::ContactChanges;
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    response::{ApiResponse, Message},
    state::AppState,
    validation::{parse_id, ValidJson, ValidQuery},
};

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/:contact_id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/contacts/:contact_id/favorite", patch(update_favorite))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    ValidQuery(q): ValidQuery<ListQuery>,
) -> Result<ApiResponse<ContactList>, AppError> {
    let contacts = state.contacts.list(user.id, q.filter()?).await?;
    Ok(ApiResponse::ok(ContactList { contacts }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(contact_id): Path<String>,
) -> Result<ApiResponse<ContactBody>, AppError> {
    let contact = state
        .contacts
        .get(user.id, parse_id(&contact_id)?)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(ApiResponse::ok(ContactBody { contact }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateContactRequest>,
) -> Result<ApiResponse<ContactBody>, AppError> {
    let contact = state.contacts.create(user.id, payload.into()).await?;
    info!(contact_id = %contact.id, "contact created");
    Ok(ApiResponse::created(ContactBody { contact }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(contact_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateContactRequest>,
) -> Result<ApiResponse<ContactBody>, AppError> {
    let contact = state
        .contacts
        .update(user.id, parse_id(&contact_id)?, payload.into())
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(ApiResponse::ok(ContactBody { contact }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(contact_id): Path<String>,
    ValidJson(payload): ValidJson<FavoriteRequest>,
) -> Result<ApiResponse<ContactBody>, AppError> {
    let changes = ContactChanges {
        favorite: payload.favorite,
        ..Default::default()
    };
    let contact = state
        .contacts
        .update(user.id, parse_id(&contact_id)?, changes)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(ApiResponse::ok(ContactBody { contact }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(contact_id): Path<String>,
) -> Result<ApiResponse<Message>, AppError> {
    state
        .contacts
        .delete(user.id, parse_id(&contact_id)?)
        .await?
        .ok_or_else(AppError::not_found)?;
    info!(%contact_id, "contact deleted");
    Ok(ApiResponse::message("contact deleted"))
}
