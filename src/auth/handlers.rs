use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::auth::jwt::{AuthUser, TokenKeys};
use crate::errors::ServiceError;
use crate::state::AppState;
use crate::users::{dto::UserProfile, service as users_service};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/me", get(me))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let user = users_service::register(
        state.users.as_ref(),
        &payload.name,
        payload.age,
        &payload.email,
        &payload.password,
    )
    .await?;
    info!(user_id = %user.id, "user registered");

    let token = TokenKeys::from_ref(&state).issue(&user.email)?;
    let profile = users_service::profile(state.doctors.as_ref(), user).await?;
    Ok(Json(AuthResponse {
        token,
        user: profile,
    }))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let user = users_service::login(state.users.as_ref(), &payload.email, &payload.password).await?;

    let token = TokenKeys::from_ref(&state).issue(&user.email)?;
    let profile = users_service::profile(state.doctors.as_ref(), user).await?;
    Ok(Json(AuthResponse {
        token,
        user: profile,
    }))
}

/// GET /me — the profile behind the presented bearer token.
#[instrument(skip(state))]
async fn me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
) -> Result<Json<UserProfile>, ServiceError> {
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user not found with email: {email}")))?;
    let user = users_service::get_user(state.users.as_ref(), user.id).await?;
    let profile = users_service::profile(state.doctors.as_ref(), user).await?;
    Ok(Json(profile))
}
