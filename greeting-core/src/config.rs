//! Service configuration.
//!
//! [`GreetingConfig`] collects the optional credentials and builds the
//! service objects once, at the composition root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::generator::{GeminiClient, TextGenerator, GEMINI_BASE_URL};
use crate::orchestrator::{GreetingOrchestrator, Pacing, DEFAULT_AUTHOR};
use crate::persistence::PersistenceRecorder;
use crate::store::{GreetingStore, JsonlStore};
use crate::supabase::SupabaseStore;

/// Configuration for generation and persistence.
#[derive(Debug, Clone)]
pub struct GreetingConfig {
    /// Gemini API key. Absent selects the offline path.
    pub gemini_api_key: Option<String>,
    /// Gemini base URL.
    pub gemini_base_url: String,
    /// Supabase project URL.
    pub supabase_url: Option<String>,
    /// Supabase anonymous key.
    pub supabase_anon_key: Option<String>,
    /// Directory for the local JSONL store, used when Supabase is not set up.
    pub data_dir: Option<PathBuf>,
    /// Author named in prompts.
    pub author: String,
    /// Timing floors.
    pub pacing: Pacing,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GreetingConfig {
    /// Offline configuration with default pacing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            supabase_url: None,
            supabase_anon_key: None,
            data_dir: None,
            author: DEFAULT_AUTHOR.to_string(),
            pacing: Pacing::default(),
        }
    }

    /// Build the generative service client, if a key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the client cannot be built.
    pub fn generator(&self) -> CoreResult<Option<Arc<dyn TextGenerator>>> {
        let Some(key) = non_blank(self.gemini_api_key.as_deref()) else {
            tracing::warn!("GEMINI_API_KEY is not set. Greetings will use offline templates.");
            return Ok(None);
        };
        let client = GeminiClient::with_base_url(key, &self.gemini_base_url)
            .map_err(|e| CoreError::Config(e.to_string()))?;
        Ok(Some(Arc::new(client)))
    }

    /// Name of the store [`Self::store`] would build, without building it.
    #[must_use]
    pub fn store_name(&self) -> Option<&'static str> {
        match self.store_choice() {
            StoreChoice::Supabase { .. } => Some("supabase"),
            StoreChoice::Jsonl(_) => Some("jsonl"),
            StoreChoice::Disabled => None,
        }
    }

    fn store_choice(&self) -> StoreChoice<'_> {
        let url = non_blank(self.supabase_url.as_deref());
        let key = non_blank(self.supabase_anon_key.as_deref());
        if let (Some(url), Some(key)) = (url, key) {
            return StoreChoice::Supabase { url, key };
        }
        self.data_dir
            .as_deref()
            .map_or(StoreChoice::Disabled, StoreChoice::Jsonl)
    }

    /// Build the greeting store.
    ///
    /// Supabase wins when both its URL and key are present, then the JSONL
    /// store when a data directory is set. The JSONL directory is created
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the chosen store cannot be built.
    pub fn store(&self) -> CoreResult<Option<Arc<dyn GreetingStore>>> {
        let url = non_blank(self.supabase_url.as_deref());
        let key = non_blank(self.supabase_anon_key.as_deref());
        if url.is_some() != key.is_some() {
            tracing::warn!("Supabase is only partially configured, ignoring it");
        }

        match self.store_choice() {
            StoreChoice::Supabase { url, key } => {
                let store =
                    SupabaseStore::new(url, key).map_err(|e| CoreError::Config(e.to_string()))?;
                tracing::info!(endpoint = %store.endpoint(), "Recording greetings to Supabase");
                Ok(Some(Arc::new(store)))
            }
            StoreChoice::Jsonl(dir) => {
                let store = JsonlStore::with_data_dir(dir)
                    .map_err(|e| CoreError::Config(e.to_string()))?;
                tracing::info!(path = %store.path().display(), "Recording greetings to JSONL");
                Ok(Some(Arc::new(store)))
            }
            StoreChoice::Disabled => Ok(None),
        }
    }

    /// Build the orchestrator with every configured service wired in.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if a configured service cannot be built.
    pub fn orchestrator(&self) -> CoreResult<GreetingOrchestrator> {
        let recorder = self
            .store()?
            .map_or_else(PersistenceRecorder::disabled, PersistenceRecorder::new);
        Ok(GreetingOrchestrator::new(self.generator()?, recorder)
            .with_pacing(self.pacing)
            .with_author(self.author.clone()))
    }
}

enum StoreChoice<'a> {
    Supabase { url: &'a str, key: &'a str },
    Jsonl(&'a Path),
    Disabled,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_offline() {
        let config = GreetingConfig::new();
        assert!(config.generator().expect("generator").is_none());
        assert!(config.store().expect("store").is_none());
        assert!(!config.orchestrator().expect("orchestrator").has_generator());
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = GreetingConfig {
            gemini_api_key: Some("   ".into()),
            ..GreetingConfig::new()
        };
        assert!(config.generator().expect("generator").is_none());
    }

    #[test]
    fn test_key_builds_client() {
        let config = GreetingConfig {
            gemini_api_key: Some("key".into()),
            ..GreetingConfig::new()
        };
        let generator = config.generator().expect("generator").expect("configured");
        assert_eq!(generator.name(), "gemini");
    }

    #[test]
    fn test_bad_base_url() {
        let config = GreetingConfig {
            gemini_api_key: Some("key".into()),
            gemini_base_url: "::nope".into(),
            ..GreetingConfig::new()
        };
        assert!(matches!(config.generator(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_store_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let jsonl = GreetingConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..GreetingConfig::new()
        };
        assert_eq!(jsonl.store().expect("store").expect("configured").name(), "jsonl");

        let supabase = GreetingConfig {
            supabase_url: Some("https://example.supabase.co".into()),
            supabase_anon_key: Some("anon".into()),
            data_dir: Some(dir.path().to_path_buf()),
            ..GreetingConfig::new()
        };
        assert_eq!(
            supabase.store().expect("store").expect("configured").name(),
            "supabase"
        );

        let partial = GreetingConfig {
            supabase_url: Some("https://example.supabase.co".into()),
            ..GreetingConfig::new()
        };
        assert!(partial.store().expect("store").is_none());
    }

    #[test]
    fn test_store_name_does_not_touch_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("records");
        let jsonl = GreetingConfig {
            data_dir: Some(data_dir.clone()),
            ..GreetingConfig::new()
        };
        assert_eq!(jsonl.store_name(), Some("jsonl"));
        assert!(!data_dir.exists());

        let supabase = GreetingConfig {
            supabase_url: Some("https://example.supabase.co".into()),
            supabase_anon_key: Some("anon".into()),
            ..jsonl.clone()
        };
        assert_eq!(supabase.store_name(), Some("supabase"));

        let partial = GreetingConfig {
            supabase_anon_key: Some("anon".into()),
            ..GreetingConfig::new()
        };
        assert_eq!(partial.store_name(), None);
        assert_eq!(GreetingConfig::new().store_name(), None);
    }
}
