use serde::Deserialize;

/// Incoming measurement, keyed by the user's email (the device only knows
/// the login identity). The server stamps the recording time.
#[derive(Debug, Deserialize)]
pub struct MeasurementRequest {
    pub user_email: String,
    pub temperature: f64,
    pub heart_rate: i32,
    pub oxygen: i32,
    pub humidity: f64,
    pub room_temperature: f64,
}
