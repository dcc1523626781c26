use fanout_core::outcome::ExecutionResult;
use uuid::Uuid;

use crate::adapters::object_store::{ObjectStore, StoreError};

/// Writes one outcome under a fresh key and returns that key. Keys are never
/// reused, so no existing record is read or overwritten.
pub async fn persist_outcome(
    store: &impl ObjectStore,
    base_prefix: &str,
    outcome: &ExecutionResult,
) -> Result<String, StoreError> {
    let record = outcome.to_stored_record(base_prefix, Uuid::new_v4())?;
    store.put_object(&record.key, record.body).await?;
    Ok(record.key)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use fanout_core::outcome::ResponseRecord;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
            self.objects
                .lock()
                .expect("store lock")
                .push((key.to_string(), body));
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn put_object(&self, key: &str, _body: Vec<u8>) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.to_string(),
                message: "access denied".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn each_write_gets_a_distinct_key() {
        let store = MemoryStore::default();
        let outcome = ExecutionResult::failure("boom");

        let first = persist_outcome(&store, "", &outcome).await.expect("persist");
        let second = persist_outcome(&store, "", &outcome).await.expect("persist");

        assert_ne!(first, second);
        assert!(first.starts_with("errors/") && first.ends_with(".json"));
        assert_eq!(store.objects.lock().expect("store lock").len(), 2);
    }

    #[tokio::test]
    async fn success_is_written_under_hostname_prefix() {
        let store = MemoryStore::default();
        let outcome = ExecutionResult::Success(ResponseRecord {
            headers: Default::default(),
            body: String::new(),
            status: 200,
            hostname: "x.com".to_string(),
        });

        let key = persist_outcome(&store, "runs/42", &outcome)
            .await
            .expect("persist");
        assert!(key.starts_with("runs/42/responses/x.com-"));
    }

    #[tokio::test]
    async fn store_failure_is_returned_to_caller() {
        let error = persist_outcome(&FailingStore, "", &ExecutionResult::failure("boom"))
            .await
            .expect_err("write should fail");
        assert!(error.to_string().contains("access denied"));
    }
}
