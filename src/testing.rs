//! In-memory store doubles for service-level tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::doctors::repo::{DoctorDetails, DoctorStore};
use crate::users::repo::{User, UserStore};

#[derive(Default)]
pub struct MemUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, user: &User) -> anyhow::Result<User> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemDoctorStore {
    doctors: Mutex<Vec<DoctorDetails>>,
}

impl MemDoctorStore {
    pub fn len(&self) -> usize {
        self.doctors.lock().unwrap().len()
    }
}

#[async_trait]
impl DoctorStore for MemDoctorStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<DoctorDetails>> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<DoctorDetails>> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.email == email)
            .cloned())
    }

    async fn save(&self, doctor: &DoctorDetails) -> anyhow::Result<DoctorDetails> {
        let mut doctors = self.doctors.lock().unwrap();
        // same conflict-as-reuse semantics as the unique index in Postgres
        if let Some(existing) = doctors.iter().find(|d| d.email == doctor.email) {
            return Ok(existing.clone());
        }
        doctors.push(doctor.clone());
        Ok(doctor.clone())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        self.doctors.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }
}

pub async fn seed_user(store: &MemUserStore, email: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        name: "Test User".into(),
        age: Some(30),
        email: email.into(),
        password_hash: "$argon2$unused".into(),
        doctor_id: None,
        details: None,
        created_at: OffsetDateTime::now_utc(),
    };
    store.save(&user).await.expect("mem save cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(email: &str, name: &str) -> DoctorDetails {
        DoctorDetails {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn save_resolves_email_races_to_the_surviving_row() {
        let store = MemDoctorStore::default();
        let first = store.save(&doctor("d@x.com", "Dr. A")).await.unwrap();
        let second = store.save(&doctor("d@x.com", "Dr. B")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Dr. A");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let store = MemDoctorStore::default();
        let saved = store.save(&doctor("d@x.com", "Dr. A")).await.unwrap();
        store.delete(saved.id).await.unwrap();
        assert!(store.find_by_id(saved.id).await.unwrap().is_none());
        assert_eq!(store.len(), 0);
    }
}
