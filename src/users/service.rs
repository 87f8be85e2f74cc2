use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::doctors::repo::DoctorStore;
use crate::doctors::service::assign_doctor;
use crate::errors::ServiceError;
use crate::users::dto::{UpdateUserRequest, UserProfile};
use crate::users::repo::{User, UserDetails, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("user not found with id: {id}"))
}

/// Loads the user, creating the empty physiological sub-record on first
/// fetch.
pub async fn get_user(users: &dyn UserStore, id: Uuid) -> Result<User, ServiceError> {
    let mut user = users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    if user.details.is_none() {
        user.details = Some(UserDetails::default());
        user = users.save(&user).await?;
    }
    Ok(user)
}

pub async fn register(
    users: &dyn UserStore,
    name: &str,
    age: Option<i32>,
    email: &str,
    password: &str,
) -> Result<User, ServiceError> {
    if !is_valid_email(email) {
        return Err(ServiceError::Validation("invalid email".into()));
    }
    if password.is_empty() {
        return Err(ServiceError::Validation("password must not be empty".into()));
    }
    if users.find_by_email(email).await?.is_some() {
        return Err(ServiceError::Conflict("email already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        age,
        email: email.to_string(),
        password_hash: hash_password(password)?,
        doctor_id: None,
        details: None,
        created_at: OffsetDateTime::now_utc(),
    };
    Ok(users.save(&user).await?)
}

pub async fn login(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, ServiceError> {
    let user = users
        .find_by_email(email)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user not found with email: {email}")))?;
    if !verify_password(password, &user.password_hash)? {
        warn!(%email, "login failed: wrong credentials");
        return Err(ServiceError::Unauthorized("wrong credentials".into()));
    }
    get_user(users, user.id).await
}

/// Applies a profile patch as one aggregate write, then delegates any
/// doctor data to the reconciler and re-fetches, since that step mutates
/// the doctor reference out-of-band. Reconciler failures propagate
/// unchanged.
pub async fn update_user(
    users: &dyn UserStore,
    doctors: &dyn DoctorStore,
    id: Uuid,
    patch: UpdateUserRequest,
) -> Result<UserProfile, ServiceError> {
    let mut user = users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;

    if let Some(name) = patch.name {
        user.name = name;
    }
    if let Some(age) = patch.age {
        user.age = Some(age);
    }
    if let Some(email) = patch.email {
        if !is_valid_email(&email) {
            return Err(ServiceError::Validation("invalid email".into()));
        }
        user.email = email;
    }

    if let Some(details_patch) = &patch.details {
        let details = user.details.get_or_insert_with(UserDetails::default);
        if let Some(smoker) = details_patch.smoker {
            details.smoker = Some(smoker);
        }
        if let Some(height) = details_patch.height {
            details.height = Some(height);
        }
        if let Some(weight) = details_patch.weight {
            details.weight = Some(weight);
        }
        if let Some(gender) = details_patch.gender {
            details.gender = Some(gender);
        }
    }

    users.save(&user).await?;
    debug!(user_id = %id, "user aggregate saved");

    if let Some(doctor_payload) = &patch.doctor {
        assign_doctor(users, doctors, id, doctor_payload).await?;
    }

    let user = users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    profile(doctors, user).await
}

/// Resolves the doctor reference into the full public aggregate.
pub async fn profile(doctors: &dyn DoctorStore, user: User) -> Result<UserProfile, ServiceError> {
    let doctor = match user.doctor_id {
        Some(doctor_id) => doctors.find_by_id(doctor_id).await?,
        None => None,
    };
    Ok(UserProfile::from_user(user, doctor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctors::dto::DoctorPayload;
    use crate::testing::{seed_user, MemDoctorStore, MemUserStore};
    use crate::users::dto::DetailsPatch;
    use crate::users::repo::Gender;

    fn doctor_patch(name: &str, email: &str, phone: &str) -> UpdateUserRequest {
        UpdateUserRequest {
            doctor: Some(DoctorPayload {
                name: Some(name.into()),
                email: Some(email.into()),
                phone: Some(phone.into()),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn get_user_creates_details_lazily() {
        let users = MemUserStore::default();
        let user = seed_user(&users, "u@x.com").await;
        assert!(user.details.is_none());

        let fetched = get_user(&users, user.id).await.unwrap();
        assert!(fetched.details.is_some());

        // persisted, not just returned
        let reloaded = users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.details.is_some());
    }

    #[tokio::test]
    async fn register_hashes_the_password() {
        let users = MemUserStore::default();
        let user = register(&users, "Alice", Some(30), "alice@x.com", "s3cret")
            .await
            .unwrap();
        assert_ne!(user.password_hash, "s3cret");
        assert!(verify_password("s3cret", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let users = MemUserStore::default();
        register(&users, "Alice", None, "alice@x.com", "pw")
            .await
            .unwrap();
        let err = register(&users, "Other", None, "alice@x.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_verifies_hash_and_rejects_wrong_password() {
        let users = MemUserStore::default();
        register(&users, "Alice", None, "alice@x.com", "pw").await.unwrap();

        let user = login(&users, "alice@x.com", "pw").await.unwrap();
        assert_eq!(user.email, "alice@x.com");

        let err = login(&users, "alice@x.com", "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = login(&users, "ghost@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_patches_scalars_and_details() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        let patch = UpdateUserRequest {
            name: Some("Bob".into()),
            age: Some(41),
            details: Some(DetailsPatch {
                smoker: Some(false),
                height: Some(1.82),
                weight: Some(79.5),
                gender: Some(Gender::Male),
            }),
            ..Default::default()
        };
        let profile = update_user(&users, &doctors, user.id, patch).await.unwrap();

        assert_eq!(profile.name, "Bob");
        assert_eq!(profile.age, Some(41));
        let details = profile.details.expect("details created");
        assert_eq!(details.height, Some(1.82));
        assert_eq!(details.gender, Some(Gender::Male));
        assert!(profile.doctor.is_none());
    }

    #[tokio::test]
    async fn update_rejects_invalid_email() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        let patch = UpdateUserRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        let err = update_user(&users, &doctors, user.id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_with_doctor_creates_then_reuses_one_record() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        let first = update_user(&users, &doctors, user.id, doctor_patch("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();
        let doctor = first.doctor.expect("doctor attached");
        assert_eq!(doctor.name, "Dr. A");
        assert_eq!(doctor.email, "d@x.com");
        assert_eq!(doctor.phone.as_deref(), Some("111"));

        let second = update_user(&users, &doctors, user.id, doctor_patch("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();
        assert_eq!(second.doctor.expect("still attached").id, doctor.id);
        assert_eq!(doctors.len(), 1);
    }

    #[tokio::test]
    async fn reconciler_errors_are_not_swallowed() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        update_user(&users, &doctors, user.id, doctor_patch("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();
        let err = update_user(&users, &doctors, user.id, doctor_patch("Dr. B", "d@x.com", "111"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_user_update_is_not_found() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let err = update_user(&users, &doctors, Uuid::new_v4(), UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
    }
}
