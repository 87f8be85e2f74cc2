use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Immutable biometric snapshot. Appended to a user's history and never
/// updated in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Measurement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub temperature: f64,
    pub heart_rate: i32,
    pub oxygen: i32,
    pub humidity: f64,
    pub room_temperature: f64,
    pub recorded_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    temperature: f64,
    heart_rate: i32,
    oxygen: i32,
    humidity: f64,
    room_temperature: f64,
) -> anyhow::Result<Measurement> {
    let row = sqlx::query_as::<_, Measurement>(
        r#"
        INSERT INTO measurements
            (user_id, temperature, heart_rate, oxygen, humidity, room_temperature, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING id, user_id, temperature, heart_rate, oxygen, humidity,
                  room_temperature, recorded_at
        "#,
    )
    .bind(user_id)
    .bind(temperature)
    .bind(heart_rate)
    .bind(oxygen)
    .bind(humidity)
    .bind(room_temperature)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Measurement>> {
    let row = sqlx::query_as::<_, Measurement>(
        r#"
        SELECT id, user_id, temperature, heart_rate, oxygen, humidity,
               room_temperature, recorded_at
        FROM measurements
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Measurement>> {
    let rows = sqlx::query_as::<_, Measurement>(
        r#"
        SELECT id, user_id, temperature, heart_rate, oxygen, humidity,
               room_temperature, recorded_at
        FROM measurements
        WHERE user_id = $1
        ORDER BY recorded_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM measurements WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
