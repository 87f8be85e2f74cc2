use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::config::WorkoutConfig;
use crate::errors::ServiceError;
use crate::state::AppState;

/// Per-equipment pick quotas applied to each body part's exercise list.
const EQUIPMENT_QUOTAS: &[(&str, usize)] = &[
    ("barbell", 2),
    ("dumbbell", 2),
    ("body weight", 1),
    ("cable", 1),
];

/// Maps the user's vitals to ExerciseDB body parts. `None` means no rule
/// applies and the unfiltered exercise list is used.
pub fn body_parts_for(age: i32, gender: &str, heart_rate: f64) -> Option<Vec<&'static str>> {
    if heart_rate > 100.0 {
        Some(vec!["cardio"])
    } else if age > 50 {
        Some(vec!["back", "waist"])
    } else if gender.eq_ignore_ascii_case("male") {
        Some(vec!["shoulders", "chest", "upper arms"])
    } else if gender.eq_ignore_ascii_case("female") {
        Some(vec!["glutes", "upper legs", "waist"])
    } else {
        None
    }
}

fn group_by_equipment(exercises: Vec<Value>) -> HashMap<String, Vec<Value>> {
    let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
    for exercise in exercises {
        let equipment = exercise["equipment"].as_str().unwrap_or("unknown").to_string();
        grouped.entry(equipment).or_default().push(exercise);
    }
    grouped
}

fn take_quota<R: rand::Rng>(source: &[Value], quota: usize, out: &mut Vec<Value>, rng: &mut R) {
    out.extend(source.choose_multiple(rng, quota.min(source.len())).cloned());
}

/// Client for the third-party exercise catalog. The lookup itself is a thin
/// wrapper; the selection rules above are ours.
pub struct WorkoutClient {
    client: reqwest::Client,
    config: WorkoutConfig,
}

impl WorkoutClient {
    pub fn new(config: WorkoutConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn recommendations(
        &self,
        age: i32,
        gender: &str,
        heart_rate: f64,
    ) -> anyhow::Result<Value> {
        let Some(parts) = body_parts_for(age, gender, heart_rate) else {
            return Ok(Value::Array(self.fetch("/exercises").await?));
        };

        let mut selected = Vec::new();
        for part in parts {
            let exercises = self.fetch(&format!("/exercises/bodyPart/{part}")).await?;
            let grouped = group_by_equipment(exercises);
            let mut rng = rand::thread_rng();
            for (equipment, quota) in EQUIPMENT_QUOTAS {
                if let Some(list) = grouped.get(*equipment) {
                    take_quota(list, *quota, &mut selected, &mut rng);
                }
            }
        }
        selected.shuffle(&mut rand::thread_rng());
        Ok(Value::Array(selected))
    }

    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<Value>> {
        let url = format!("{}{}", self.config.base_url, path);
        let host = reqwest::Url::parse(&url)?
            .host_str()
            .unwrap_or_default()
            .to_string();
        let exercises = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.config.api_key)
            .header("X-RapidAPI-Host", host)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await?;
        Ok(exercises)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/workouts/recommendations", get(recommendations))
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    age: i32,
    gender: String,
    heart_rate: f64,
}

#[instrument(skip(state))]
async fn recommendations(
    State(state): State<AppState>,
    AuthUser(_subject): AuthUser,
    Query(q): Query<RecommendationQuery>,
) -> Result<Json<Value>, ServiceError> {
    let picks = state
        .workouts
        .recommendations(q.age, &q.gender, q.heart_rate)
        .await?;
    Ok(Json(picks))
}
