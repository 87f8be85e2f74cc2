use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::doctors::dto::DoctorPayload;
use crate::doctors::repo::DoctorDetails;
use crate::users::repo::{Gender, User, UserDetails};

/// Profile update patch. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
    #[serde(alias = "userDetails")]
    pub details: Option<DetailsPatch>,
    #[serde(alias = "doctorDetails")]
    pub doctor: Option<DoctorPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailsPatch {
    pub smoker: Option<bool>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub gender: Option<Gender>,
}

/// Public view of the user aggregate; the password hash never leaves the
/// service layer.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub email: String,
    pub details: Option<UserDetails>,
    pub doctor: Option<DoctorDetails>,
    pub created_at: OffsetDateTime,
}

impl UserProfile {
    pub fn from_user(user: User, doctor: Option<DoctorDetails>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            age: user.age,
            email: user.email,
            details: user.details,
            doctor,
            created_at: user.created_at,
        }
    }
}
