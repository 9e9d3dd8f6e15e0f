use crate::error::TutelaResult;
use crate::types::DataCategory;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistence capability supplied to components at construction.
///
/// Keys are `(subject_id, category)` pairs; the core mandates no schema for
/// the stored records beyond JSON. Implementations must be safe for
/// concurrent use from multiple request handlers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record stored for a subject under a category.
    async fn get(
        &self,
        subject_id: &str,
        category: DataCategory,
    ) -> TutelaResult<Option<serde_json::Value>>;

    /// Store (or replace) the record for a subject under a category.
    async fn put(
        &self,
        subject_id: &str,
        category: DataCategory,
        record: serde_json::Value,
    ) -> TutelaResult<()>;

    /// Delete the record for a subject under a category. Deleting a missing
    /// record is not an error.
    async fn delete(&self, subject_id: &str, category: DataCategory) -> TutelaResult<()>;

    /// The categories currently holding data for a subject, in the fixed
    /// [`DataCategory::ALL`] order.
    async fn categories(&self, subject_id: &str) -> TutelaResult<Vec<DataCategory>>;
}

/// In-memory [`RecordStore`].
///
/// The default store for tests and embedded deployments; production
/// deployments supply their own implementation over a real database.
pub struct MemoryStore {
    records: RwLock<HashMap<(String, DataCategory), serde_json::Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(
        &self,
        subject_id: &str,
        category: DataCategory,
    ) -> TutelaResult<Option<serde_json::Value>> {
        let records = self.records.read().await;
        Ok(records.get(&(subject_id.to_string(), category)).cloned())
    }

    async fn put(
        &self,
        subject_id: &str,
        category: DataCategory,
        record: serde_json::Value,
    ) -> TutelaResult<()> {
        let mut records = self.records.write().await;
        records.insert((subject_id.to_string(), category), record);
        Ok(())
    }

    async fn delete(&self, subject_id: &str, category: DataCategory) -> TutelaResult<()> {
        let mut records = self.records.write().await;
        records.remove(&(subject_id.to_string(), category));
        Ok(())
    }

    async fn categories(&self, subject_id: &str) -> TutelaResult<Vec<DataCategory>> {
        let records = self.records.read().await;
        Ok(DataCategory::ALL
            .iter()
            .copied()
            .filter(|c| records.contains_key(&(subject_id.to_string(), *c)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store
            .put(
                "user-1",
                DataCategory::PersonalPreferences,
                serde_json::json!({"theme": "dark"}),
            )
            .await
            .unwrap();

        let record = store
            .get("user-1", DataCategory::PersonalPreferences)
            .await
            .unwrap();
        assert_eq!(record.unwrap()["theme"], "dark");

        store
            .delete("user-1", DataCategory::PersonalPreferences)
            .await
            .unwrap();
        let record = store
            .get("user-1", DataCategory::PersonalPreferences)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_categories_in_fixed_order() {
        let store = MemoryStore::new();
        store
            .put(
                "user-1",
                DataCategory::EnrollmentRecords,
                serde_json::json!({}),
            )
            .await
            .unwrap();
        store
            .put(
                "user-1",
                DataCategory::PersonalPreferences,
                serde_json::json!({}),
            )
            .await
            .unwrap();

        let categories = store.categories("user-1").await.unwrap();
        assert_eq!(
            categories,
            vec![
                DataCategory::PersonalPreferences,
                DataCategory::EnrollmentRecords
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        store
            .delete("nobody", DataCategory::LearningHistory)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_subjects_are_isolated() {
        let store = MemoryStore::new();
        store
            .put("user-1", DataCategory::LearningHistory, serde_json::json!(1))
            .await
            .unwrap();
        let categories = store.categories("user-2").await.unwrap();
        assert!(categories.is_empty());
    }
}
