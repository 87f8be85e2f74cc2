use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::doctors::repo::{DoctorStore, PgDoctorStore};
use crate::email::{HttpMailer, Mailer};
use crate::sensor::SensorFrame;
use crate::users::repo::{PgUserStore, UserStore};
use crate::workouts::WorkoutClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub doctors: Arc<dyn DoctorStore>,
    pub mailer: Arc<dyn Mailer>,
    pub workouts: Arc<WorkoutClient>,
    pub sensor: Arc<RwLock<SensorFrame>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self {
            users: Arc::new(PgUserStore::new(db.clone())),
            doctors: Arc::new(PgDoctorStore::new(db.clone())),
            mailer: Arc::new(HttpMailer::new(config.mail.clone())),
            workouts: Arc::new(WorkoutClient::new(config.workouts.clone())),
            sensor: Arc::new(RwLock::new(SensorFrame::default())),
            db,
            config,
        })
    }
}
