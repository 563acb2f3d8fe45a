use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{UserFilter, UserRecord};

/// User persistence as seen by the service.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_key(&self, id: Uuid) -> TrackerResult<UserRecord>;

    async fn find_many(&self, filter: &UserFilter) -> TrackerResult<Vec<UserRecord>>;

    /// Insert a new record or replace the one with the same id.
    async fn save(&self, record: &UserRecord) -> TrackerResult<()>;
}

/// Process-local store. Contact numbers are unique.
pub struct InMemoryUserStore {
    users: DashMap<Uuid, UserRecord>,
    contact_index: DashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            contact_index: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_key(&self, id: Uuid) -> TrackerResult<UserRecord> {
        self.users
            .get(&id)
            .map(|u| u.value().clone())
            .ok_or_else(|| TrackerError::NotFound(format!("user {}", id)))
    }

    async fn find_many(&self, filter: &UserFilter) -> TrackerResult<Vec<UserRecord>> {
        // Contact lookups go through the index instead of a scan.
        if let Some(contact) = &filter.contact_number {
            let Some(id) = self.contact_index.get(contact).map(|id| *id.value()) else {
                return Ok(Vec::new());
            };
            return Ok(self
                .users
                .get(&id)
                .map(|u| u.value().clone())
                .filter(|u| filter.matches(u))
                .into_iter()
                .collect());
        }

        Ok(self
            .users
            .iter()
            .filter(|u| filter.matches(u.value()))
            .map(|u| u.value().clone())
            .collect())
    }

    async fn save(&self, record: &UserRecord) -> TrackerResult<()> {
        match self.contact_index.entry(record.contact_number.clone()) {
            Entry::Occupied(existing) if *existing.get() != record.id => {
                return Err(TrackerError::Conflict(
                    "contact number already registered".to_string(),
                ));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(record.id);
            }
        }

        if let Some(previous) = self.users.insert(record.id, record.clone()) {
            if previous.contact_number != record.contact_number {
                self.contact_index
                    .remove_if(&previous.contact_number, |_, id| *id == record.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn passenger(contact: &str) -> UserRecord {
        UserRecord::new("Meera", contact, "hash".to_string(), Role::Passenger)
    }

    #[tokio::test]
    async fn test_save_then_find_by_key() {
        let store = InMemoryUserStore::new();
        let user = passenger("9000000010");
        store.save(&user).await.unwrap();

        assert_eq!(store.find_by_key(user.id).await.unwrap(), user);
        assert!(matches!(
            store.find_by_key(Uuid::new_v4()).await,
            Err(TrackerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_contact_conflicts() {
        let store = InMemoryUserStore::new();
        store.save(&passenger("9000000011")).await.unwrap();
        let err = store.save(&passenger("9000000011")).await.unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_resave_same_record_updates() {
        let store = InMemoryUserStore::new();
        let mut user = passenger("9000000012");
        store.save(&user).await.unwrap();
        user.display_name = "Meera K".to_string();
        store.save(&user).await.unwrap();

        let found = store
            .find_many(&UserFilter::with_contact("9000000012"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display_name, "Meera K");
    }

    #[tokio::test]
    async fn test_find_many_by_unknown_contact_is_empty() {
        let store = InMemoryUserStore::new();
        let found = store
            .find_many(&UserFilter::with_contact("0000"))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
