use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::doctors::dto::DoctorPayload;
use crate::doctors::repo::DoctorDetails;
use crate::doctors::service;
use crate::errors::ServiceError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/:id/doctor", put(put_doctor))
}

/// PUT /users/:id/doctor — reconcile a doctor payload for the user.
/// An all-blank body removes the assignment and returns null.
#[instrument(skip(state, payload))]
async fn put_doctor(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DoctorPayload>,
) -> Result<Json<Option<DoctorDetails>>, ServiceError> {
    let doctor =
        service::assign_doctor(state.users.as_ref(), state.doctors.as_ref(), id, &payload).await?;
    Ok(Json(doctor))
}
