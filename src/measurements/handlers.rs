use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::errors::ServiceError;
use crate::measurements::dto::MeasurementRequest;
use crate::measurements::repo::{self, Measurement};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/measurements", post(record))
        .route("/measurements/:id", get(get_one).delete(remove))
        .route("/measurements/user/:user_id", get(list_for_user))
        .route("/measurements/all-by-user", get(list_by_email))
}

#[derive(Debug, Deserialize)]
struct EmailQuery {
    email: String,
}

/// POST /measurements — append a snapshot for the user behind the email.
#[instrument(skip(state, payload))]
async fn record(
    State(state): State<AppState>,
    Json(payload): Json<MeasurementRequest>,
) -> Result<(StatusCode, Json<Measurement>), ServiceError> {
    let user = state
        .users
        .find_by_email(&payload.user_email)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "user not found with email: {}",
                payload.user_email
            ))
        })?;

    let measurement = repo::insert(
        &state.db,
        user.id,
        payload.temperature,
        payload.heart_rate,
        payload.oxygen,
        payload.humidity,
        payload.room_temperature,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Measurement>, ServiceError> {
    let measurement = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("measurement not found with id: {id}")))?;
    Ok(Json(measurement))
}

#[instrument(skip(state))]
async fn list_for_user(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Measurement>>, ServiceError> {
    let rows = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
async fn list_by_email(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Query(q): Query<EmailQuery>,
) -> Result<Json<Vec<Measurement>>, ServiceError> {
    let user = state
        .users
        .find_by_email(&q.email)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user not found with email: {}", q.email)))?;
    let rows = repo::list_by_user(&state.db, user.id).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
async fn remove(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    repo::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
