//! Greeting generation with offline fallback and minimum pacing.

use std::sync::Arc;
use std::time::Duration;

use crate::generator::{TextGenerator, GEMINI_MODEL};
use crate::greeting::{GeneratedGreeting, GreetingRequest, GreetingSource};
use crate::metrics;
use crate::persistence::PersistenceRecorder;
use crate::{prompt, template};

/// Author named in every prompt.
pub const DEFAULT_AUTHOR: &str = "Francis (Kaiko)";

/// Used when the service answers without any text.
pub const PLACEHOLDER_MESSAGE: &str =
    "Merry Christmas! Wishing you a season full of warmth, joy, and good company.";

/// Timing floors that keep the loading sequence perceptible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Simulated latency of the offline path.
    pub offline_delay: Duration,
    /// Wait after the service call and persistence finish.
    pub settle_delay: Duration,
    /// Interval between loading labels.
    pub status_interval: Duration,
    /// Wait before capturing a freshly rendered card.
    pub capture_settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            offline_delay: Duration::from_secs(4),
            settle_delay: Duration::from_secs(3),
            status_interval: Duration::from_millis(1500),
            capture_settle: Duration::from_millis(100),
        }
    }
}

impl Pacing {
    /// No waiting at all.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            offline_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            status_interval: Duration::from_millis(1),
            capture_settle: Duration::ZERO,
        }
    }
}

/// Produces one [`GeneratedGreeting`] per request.
#[derive(Clone)]
pub struct GreetingOrchestrator {
    generator: Option<Arc<dyn TextGenerator>>,
    recorder: PersistenceRecorder,
    pacing: Pacing,
    author: String,
    model: String,
}

impl GreetingOrchestrator {
    /// Orchestrator over the given services.
    ///
    /// With `generator == None` every greeting comes from the offline
    /// templates and nothing is persisted.
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, recorder: PersistenceRecorder) -> Self {
        Self {
            generator,
            recorder,
            pacing: Pacing::default(),
            author: DEFAULT_AUTHOR.to_string(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    /// Override the pacing.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Override the author named in prompts.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Pacing in use.
    #[must_use]
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Whether a generative service is configured.
    #[must_use]
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Generate a greeting. Single attempt, never fails.
    #[tracing::instrument(
        name = "generate_greeting",
        skip(self, request),
        fields(effective = %request.effective_relation())
    )]
    pub async fn generate(&self, request: &GreetingRequest) -> GeneratedGreeting {
        let fallback = || {
            template::render(
                request.name(),
                request.effective_relation(),
                request.is_special(),
            )
        };

        let Some(generator) = self.generator.as_ref() else {
            tracing::warn!("No generative service configured. Using offline template.");
            tokio::time::sleep(self.pacing.offline_delay).await;
            metrics::record_generation(GreetingSource::Fallback.as_str());
            return GeneratedGreeting::new(request, fallback(), GreetingSource::Fallback);
        };

        let prompt = prompt::compose(&self.author, request.name(), request.effective_relation());
        let (message, source) = match generator.generate(&self.model, &prompt).await {
            Ok(Some(text)) => (text, GreetingSource::External),
            Ok(None) => {
                tracing::warn!(backend = generator.name(), "Service returned no text");
                (PLACEHOLDER_MESSAGE.to_string(), GreetingSource::External)
            }
            Err(e) => {
                tracing::warn!(
                    backend = generator.name(),
                    "Generation failed, falling back to template: {e}"
                );
                (fallback(), GreetingSource::Fallback)
            }
        };

        self.recorder.write(request, &message).await;

        tokio::time::sleep(self.pacing.settle_delay).await;
        metrics::record_generation(source.as_str());
        GeneratedGreeting::new(request, message, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerationError;
    use crate::relation::Relation;
    use async_trait::async_trait;

    struct Canned(Option<&'static str>);

    #[async_trait]
    impl TextGenerator for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn generate(&self, model: &str, _prompt: &str) -> Result<Option<String>, GenerationError> {
            assert_eq!(model, GEMINI_MODEL);
            Ok(self.0.map(ToString::to_string))
        }
    }

    fn request() -> GreetingRequest {
        GreetingRequest::new("Juan", Relation::Parents).expect("request")
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_path_waits_four_seconds() {
        let orchestrator = GreetingOrchestrator::new(None, PersistenceRecorder::disabled());
        let started = tokio::time::Instant::now();
        let greeting = orchestrator.generate(&request()).await;
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        assert_eq!(greeting.source, GreetingSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_text_used() {
        let orchestrator = GreetingOrchestrator::new(
            Some(Arc::new(Canned(Some("Salamat, Ma and Pa!")))),
            PersistenceRecorder::disabled(),
        );
        let started = tokio::time::Instant::now();
        let greeting = orchestrator.generate(&request()).await;
        assert_eq!(greeting.message, "Salamat, Ma and Pa!");
        assert_eq!(greeting.source, GreetingSource::External);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_uses_placeholder() {
        let orchestrator = GreetingOrchestrator::new(
            Some(Arc::new(Canned(None))),
            PersistenceRecorder::disabled(),
        );
        let greeting = orchestrator.generate(&request()).await;
        assert_eq!(greeting.message, PLACEHOLDER_MESSAGE);
        assert_eq!(greeting.source, GreetingSource::External);
    }
}
