use tracing::debug;
use uuid::Uuid;

use crate::doctors::dto::DoctorPayload;
use crate::doctors::repo::{DoctorDetails, DoctorStore};
use crate::errors::ServiceError;
use crate::users::repo::UserStore;

/// Reconciles a doctor identity payload against the store and links the
/// result to the user.
///
/// Returns `None` when an all-blank payload cleared the assignment,
/// otherwise the doctor record now referenced by the user. A payload whose
/// email matches a stored record must not contradict it in any other
/// supplied field; mismatches are rejected without touching the stored row.
pub async fn assign_doctor(
    users: &dyn UserStore,
    doctors: &dyn DoctorStore,
    user_id: Uuid,
    payload: &DoctorPayload,
) -> Result<Option<DoctorDetails>, ServiceError> {
    let mut user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user not found with id: {user_id}")))?;

    if payload.is_empty() {
        user.doctor_id = None;
        users.save(&user).await?;
        debug!(%user_id, "doctor assignment cleared");
        return Ok(None);
    }

    let email = payload
        .email()
        .ok_or_else(|| ServiceError::Validation("doctor email is required".into()))?;

    let doctor = match doctors.find_by_email(email).await? {
        Some(existing) => {
            check_payload_matches(&existing, payload)?;
            debug!(%user_id, doctor_id = %existing.id, "reusing existing doctor record");
            existing
        }
        None => {
            let created = doctors
                .save(&DoctorDetails {
                    id: Uuid::new_v4(),
                    name: payload.name().unwrap_or_default().to_string(),
                    email: email.to_string(),
                    phone: payload.phone().map(str::to_string),
                })
                .await?;
            // The store may hand back a row a racing writer created first;
            // re-check so its fields still surface as a conflict.
            check_payload_matches(&created, payload)?;
            debug!(%user_id, doctor_id = %created.id, "created doctor record");
            created
        }
    };

    user.doctor_id = Some(doctor.id);
    users.save(&user).await?;
    Ok(Some(doctor))
}

/// Every non-blank field the payload supplies must equal the stored value.
/// The email already matched, so only name and phone can disagree.
fn check_payload_matches(
    stored: &DoctorDetails,
    payload: &DoctorPayload,
) -> Result<(), ServiceError> {
    if let Some(name) = payload.name() {
        if stored.name != name {
            return Err(ServiceError::mismatch("doctor name", &stored.name, name));
        }
    }
    if let Some(phone) = payload.phone() {
        if let Some(stored_phone) = stored.phone.as_deref() {
            if stored_phone != phone {
                return Err(ServiceError::mismatch("doctor phone", stored_phone, phone));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_user, MemDoctorStore, MemUserStore};

    fn payload(name: &str, email: &str, phone: &str) -> DoctorPayload {
        let opt = |v: &str| (!v.is_empty()).then(|| v.to_string());
        DoctorPayload {
            name: opt(name),
            email: opt(email),
            phone: opt(phone),
        }
    }

    #[tokio::test]
    async fn creates_doctor_and_attaches_it() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        let result = assign_doctor(&users, &doctors, user.id, &payload("Dr. C", "new@x.com", "222"))
            .await
            .expect("assignment should succeed")
            .expect("a record should be returned");

        assert_eq!(result.name, "Dr. C");
        assert_eq!(result.email, "new@x.com");
        assert_eq!(result.phone.as_deref(), Some("222"));
        assert_eq!(doctors.len(), 1);

        let reloaded = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.doctor_id, Some(result.id));
    }

    #[tokio::test]
    async fn repeated_assignment_reuses_the_same_record() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;
        let p = payload("Dr. C", "new@x.com", "222");

        let first = assign_doctor(&users, &doctors, user.id, &p)
            .await
            .unwrap()
            .unwrap();
        let second = assign_doctor(&users, &doctors, user.id, &p)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(doctors.len(), 1);
    }

    #[tokio::test]
    async fn partial_payload_matching_stored_record_is_accepted() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        assign_doctor(&users, &doctors, user.id, &payload("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();
        // email only, everything else blank
        let result = assign_doctor(&users, &doctors, user.id, &payload("", "d@x.com", ""))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.name, "Dr. A");
        assert_eq!(doctors.len(), 1);
    }

    #[tokio::test]
    async fn conflicting_name_is_rejected_and_store_untouched() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        assign_doctor(&users, &doctors, user.id, &payload("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();

        let err = assign_doctor(&users, &doctors, user.id, &payload("Dr. B", "d@x.com", ""))
            .await
            .unwrap_err();

        match &err {
            ServiceError::Conflict(msg) => {
                assert!(msg.contains("Dr. A"), "expected value missing: {msg}");
                assert!(msg.contains("Dr. B"), "received value missing: {msg}");
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let stored = doctors.find_by_email("d@x.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "Dr. A");
        assert_eq!(stored.phone.as_deref(), Some("111"));
    }

    #[tokio::test]
    async fn conflicting_phone_is_rejected() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        assign_doctor(&users, &doctors, user.id, &payload("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();

        let err = assign_doctor(&users, &doctors, user.id, &payload("", "d@x.com", "999"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn empty_payload_clears_assignment() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        assign_doctor(&users, &doctors, user.id, &payload("Dr. A", "d@x.com", "111"))
            .await
            .unwrap();

        let result = assign_doctor(&users, &doctors, user.id, &payload("", "", ""))
            .await
            .unwrap();
        assert!(result.is_none());

        let reloaded = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.doctor_id, None);
        // the doctor row is shared, clearing one user's link keeps it
        assert_eq!(doctors.len(), 1);
    }

    #[tokio::test]
    async fn missing_email_on_non_empty_payload_is_a_validation_error() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let user = seed_user(&users, "u@x.com").await;

        let err = assign_doctor(&users, &doctors, user.id, &payload("Dr. A", "", "111"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();

        let err = assign_doctor(
            &users,
            &doctors,
            Uuid::new_v4(),
            &payload("Dr. A", "d@x.com", ""),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn two_users_share_one_doctor_record() {
        let users = MemUserStore::default();
        let doctors = MemDoctorStore::default();
        let alice = seed_user(&users, "alice@x.com").await;
        let bob = seed_user(&users, "bob@x.com").await;
        let p = payload("Dr. A", "d@x.com", "111");

        let first = assign_doctor(&users, &doctors, alice.id, &p)
            .await
            .unwrap()
            .unwrap();
        let second = assign_doctor(&users, &doctors, bob.id, &p)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(doctors.len(), 1);
    }
}
