use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Outbound mail relay. Reports are sent through an HTTP mail API using the
/// official application address as the envelope sender.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub workouts: WorkoutConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".into()),
            api_key: std::env::var("MAIL_API_KEY").unwrap_or_default(),
            from_email: std::env::var("MAIL_FROM_EMAIL")
                .unwrap_or_else(|_| "reports@healthtrack.local".into()),
        };
        let workouts = WorkoutConfig {
            api_key: std::env::var("RAPIDAPI_KEY").unwrap_or_default(),
            base_url: std::env::var("EXERCISEDB_URL")
                .unwrap_or_else(|_| "https://exercisedb.p.rapidapi.com".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
            workouts,
        })
    }
}
