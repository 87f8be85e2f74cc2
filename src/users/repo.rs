use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Physiological profile owned by exactly one user. Created lazily on the
/// first fetch and removed together with its owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct UserDetails {
    pub smoker: Option<bool>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub gender: Option<Gender>,
}

/// User aggregate: identity row plus the owned details sub-record. The
/// doctor relationship is held as a plain foreign key, never a live
/// back-pointer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub email: String,
    pub password_hash: String,
    pub doctor_id: Option<Uuid>,
    pub details: Option<UserDetails>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    age: Option<i32>,
    email: String,
    password_hash: String,
    doctor_id: Option<Uuid>,
    created_at: OffsetDateTime,
}

impl UserRow {
    fn into_user(self, details: Option<UserDetails>) -> User {
        User {
            id: self.id,
            name: self.name,
            age: self.age,
            email: self.email,
            password_hash: self.password_hash,
            doctor_id: self.doctor_id,
            details,
            created_at: self.created_at,
        }
    }
}

/// Narrow persistence contract for the user aggregate.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Upserts the identity row and the owned details sub-record as one
    /// aggregate write.
    async fn save(&self, user: &User) -> anyhow::Result<User>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn load_details(&self, user_id: Uuid) -> anyhow::Result<Option<UserDetails>> {
        let details = sqlx::query_as::<_, UserDetails>(
            r#"
            SELECT smoker, height, weight, gender
            FROM user_details
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(details)
    }

    async fn assemble(&self, row: Option<UserRow>) -> anyhow::Result<Option<User>> {
        match row {
            Some(row) => {
                let details = self.load_details(row.id).await?;
                Ok(Some(row.into_user(details)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, age, email, password_hash, doctor_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        self.assemble(row).await
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, age, email, password_hash, doctor_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        self.assemble(row).await
    }

    async fn save(&self, user: &User) -> anyhow::Result<User> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, age, email, password_hash, doctor_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                age = EXCLUDED.age,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                doctor_id = EXCLUDED.doctor_id
            RETURNING id, name, age, email, password_hash, doctor_id, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.doctor_id)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(details) = &user.details {
            sqlx::query(
                r#"
                INSERT INTO user_details (user_id, smoker, height, weight, gender)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (user_id) DO UPDATE SET
                    smoker = EXCLUDED.smoker,
                    height = EXCLUDED.height,
                    weight = EXCLUDED.weight,
                    gender = EXCLUDED.gender
                "#,
            )
            .bind(user.id)
            .bind(details.smoker)
            .bind(details.height)
            .bind(details.weight)
            .bind(details.gender)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row.into_user(user.details.clone()))
    }
}
