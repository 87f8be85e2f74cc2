use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Doctor identity record. The email is the natural key used for matching;
/// the uuid is only the storage key. Many users may reference one row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DoctorDetails {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Narrow persistence contract for doctor records.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<DoctorDetails>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<DoctorDetails>>;
    /// Inserts the record. If another row already holds the same email the
    /// store returns that row instead of creating a duplicate, so two
    /// writers racing on one email both end up with the single surviving
    /// record.
    async fn save(&self, doctor: &DoctorDetails) -> anyhow::Result<DoctorDetails>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
}

pub struct PgDoctorStore {
    db: PgPool,
}

impl PgDoctorStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DoctorStore for PgDoctorStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<DoctorDetails>> {
        let doctor = sqlx::query_as::<_, DoctorDetails>(
            r#"
            SELECT id, name, email, phone
            FROM doctor_details
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(doctor)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<DoctorDetails>> {
        let doctor = sqlx::query_as::<_, DoctorDetails>(
            r#"
            SELECT id, name, email, phone
            FROM doctor_details
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(doctor)
    }

    async fn save(&self, doctor: &DoctorDetails) -> anyhow::Result<DoctorDetails> {
        // find-by-email followed by insert is not atomic at the service
        // level; the unique index plus DO NOTHING turns a lost race into
        // "reuse the row that won".
        let inserted = sqlx::query_as::<_, DoctorDetails>(
            r#"
            INSERT INTO doctor_details (id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, phone
            "#,
        )
        .bind(doctor.id)
        .bind(&doctor.name)
        .bind(&doctor.email)
        .bind(&doctor.phone)
        .fetch_optional(&self.db)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            None => {
                let existing = self.find_by_email(&doctor.email).await?;
                existing.ok_or_else(|| {
                    anyhow::anyhow!("doctor row vanished between insert and re-select")
                })
            }
        }
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM doctor_details WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
