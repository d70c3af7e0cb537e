//! Supabase (PostgREST) greeting store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::store::{GreetingRecord, GreetingStore, StoreError};

/// Table greetings are inserted into.
pub const GREETINGS_TABLE: &str = "greetings";

/// Inserts greetings through the Supabase REST interface.
#[derive(Clone)]
pub struct SupabaseStore {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    endpoint: Url,
    anon_key: String,
}

impl SupabaseStore {
    /// Create a store for the project at `project_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL is malformed.
    /// Returns [`StoreError::Http`] if the HTTP client fails to build.
    pub fn new(project_url: &str, anon_key: impl Into<String>) -> Result<Self, StoreError> {
        let mut base = Url::parse(project_url).map_err(|e| StoreError::Config(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Config(format!("not a base URL: {project_url}")));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("rest/v1/{GREETINGS_TABLE}"))
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let http = Client::builder()
            .user_agent(concat!("christmas-greeting/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                endpoint,
                anon_key: anon_key.into(),
            }),
        })
    }

    /// Insert endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

#[async_trait]
impl GreetingStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    #[tracing::instrument(name = "supabase_insert", skip_all)]
    async fn insert(&self, record: &GreetingRecord) -> Result<(), StoreError> {
        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
