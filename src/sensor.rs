use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::state::AppState;

/// Latest raw frame pushed by the measurement device. Held in process
/// memory only; each POST replaces the previous frame wholesale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SensorFrame {
    pub temperature: f32,
    pub humidity: f32,
    pub body_temperature: f32,
    pub bpm: f32,
    pub spo2: f32,
}

/// Readings below 60 bpm are sensor noise from a finger that is not on the
/// pad and are presented as "no reading".
pub fn presentable(mut frame: SensorFrame) -> SensorFrame {
    if frame.bpm < 60.0 {
        frame.bpm = 0.0;
    }
    frame
}

pub fn router() -> Router<AppState> {
    Router::new().route("/data", get(latest).post(receive))
}

#[instrument(skip(state, frame))]
async fn receive(State(state): State<AppState>, Json(frame): Json<SensorFrame>) -> Json<SensorFrame> {
    *state.sensor.write().await = frame;
    Json(frame)
}

#[instrument(skip(state))]
async fn latest(State(state): State<AppState>) -> Json<SensorFrame> {
    let frame = *state.sensor.read().await;
    Json(presentable(frame))
}
