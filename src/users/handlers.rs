use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::errors::ServiceError;
use crate::state::AppState;
use crate::users::dto::{UpdateUserRequest, UserProfile};
use crate::users::service;

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user).put(update_user))
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ServiceError> {
    let user = service::get_user(state.users.as_ref(), id).await?;
    let profile = service::profile(state.doctors.as_ref(), user).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, patch))]
async fn update_user(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ServiceError> {
    let profile =
        service::update_user(state.users.as_ref(), state.doctors.as_ref(), id, patch).await?;
    Ok(Json(profile))
}
