//! Best-effort recording of generated greetings.
//!
//! Writes are attempted at most once. Failures are logged and discarded;
//! they never reach the caller.

use std::sync::Arc;

use crate::greeting::GreetingRequest;
use crate::metrics;
use crate::store::{GreetingRecord, GreetingStore};

/// Fire-and-forget writer in front of an optional [`GreetingStore`].
#[derive(Clone, Default)]
pub struct PersistenceRecorder {
    store: Option<Arc<dyn GreetingStore>>,
}

impl PersistenceRecorder {
    /// Recorder writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn GreetingStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Recorder with no store; every write is a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Whether a store is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Append `{name, effective relation, message}`. Never fails.
    pub async fn write(&self, request: &GreetingRequest, message: &str) {
        let Some(store) = self.store.as_ref() else {
            tracing::debug!("No greeting store configured, skipping persistence");
            return;
        };

        let record = GreetingRecord {
            name: request.name().to_string(),
            relation: request.effective_relation().label().to_string(),
            message: message.to_string(),
        };

        match store.insert(&record).await {
            Ok(()) => tracing::debug!(store = store.name(), "Greeting recorded"),
            Err(e) => {
                metrics::record_persistence_failure(store.name());
                tracing::warn!(store = store.name(), "Failed to record greeting: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingStore {
        records: Mutex<Vec<GreetingRecord>>,
    }

    #[async_trait]
    impl GreetingStore for CapturingStore {
        fn name(&self) -> &'static str {
            "capturing"
        }

        async fn insert(&self, record: &GreetingRecord) -> Result<(), StoreError> {
            self.records
                .lock()
                .expect("lock")
                .push(record.clone());
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl GreetingStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn insert(&self, _record: &GreetingRecord) -> Result<(), StoreError> {
            Err(StoreError::Config("no connection".into()))
        }
    }

    #[tokio::test]
    async fn test_write_uses_effective_relation() {
        let store = Arc::new(CapturingStore::default());
        let recorder = PersistenceRecorder::new(store.clone());
        let request = GreetingRequest::new("Deonna", Relation::Classmate).expect("request");

        recorder.write(&request, "Merry Christmas!").await;

        let records = store.records.lock().expect("lock");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relation, "Special Someone (Girlfriend)");
        assert_eq!(records[0].message, "Merry Christmas!");
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let recorder = PersistenceRecorder::new(Arc::new(BrokenStore));
        let request = GreetingRequest::new("Juan", Relation::Parents).expect("request");
        recorder.write(&request, "hi").await;
    }

    #[tokio::test]
    async fn test_disabled_is_noop() {
        let recorder = PersistenceRecorder::disabled();
        assert!(!recorder.is_enabled());
        let request = GreetingRequest::new("Juan", Relation::Parents).expect("request");
        recorder.write(&request, "hi").await;
    }
}
