//! The end-to-end greeting flow for one session.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use greeting_core::{
    GeneratedGreeting, GreetingOrchestrator, GreetingRequest, LoadingAnimator, LoadingState,
    Relation, Session, SessionEvent, SessionState,
};
use tokio::sync::watch;

use crate::capture::{CardArtifact, ImageCapturer};
use crate::distribute::{ArtifactDistributor, ShareOutcome};
use crate::error::{FlowError, CAPTURE_FAILED_MESSAGE, GENERATION_FAILED_MESSAGE};
use crate::layout::{self, CardStyle, Surface};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one session from submission to a distributed card.
///
/// Locks are never held across an await.
pub struct GreetingFlow {
    session: Mutex<Session>,
    animator: Mutex<LoadingAnimator>,
    greeting: Mutex<Option<GeneratedGreeting>>,
    orchestrator: GreetingOrchestrator,
    style: CardStyle,
    capturer: ImageCapturer,
    distributor: ArtifactDistributor,
}

impl GreetingFlow {
    /// Flow over the given services.
    #[must_use]
    pub fn new(
        session: Session,
        orchestrator: GreetingOrchestrator,
        style: CardStyle,
        capturer: ImageCapturer,
        distributor: ArtifactDistributor,
    ) -> Self {
        let animator = LoadingAnimator::with_interval(orchestrator.pacing().status_interval);
        Self {
            session: Mutex::new(session),
            animator: Mutex::new(animator),
            greeting: Mutex::new(None),
            orchestrator,
            style,
            capturer,
            distributor,
        }
    }

    /// Current session state. Re-evaluates the cutoff.
    #[must_use]
    pub fn state(&self) -> SessionState {
        let mut session = lock(&self.session);
        session.is_expired();
        session.state()
    }

    /// Alert for the last failure, if the session is `Failed`.
    #[must_use]
    pub fn failure(&self) -> Option<String> {
        lock(&self.session).failure().map(ToString::to_string)
    }

    /// Loading display updates.
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<LoadingState> {
        lock(&self.animator).subscribe()
    }

    /// The greeting on display, if any.
    #[must_use]
    pub fn greeting(&self) -> Option<GeneratedGreeting> {
        lock(&self.greeting).clone()
    }

    /// Generate a greeting for `name`.
    ///
    /// # Errors
    ///
    /// - [`FlowError::Session`] when the season is over, a generation is
    ///   already running, or the session cannot accept a submission.
    /// - [`FlowError::Core`] when the name is blank.
    /// - [`FlowError::Generation`] when the generation task dies.
    #[tracing::instrument(name = "submit_greeting", skip(self))]
    pub async fn submit(&self, name: &str, relation: Relation) -> Result<GeneratedGreeting, FlowError> {
        {
            let mut session = lock(&self.session);
            if session.is_expired() {
                return Err(greeting_core::SessionError::Expired.into());
            }
            if session.state().is_busy() {
                return Err(greeting_core::SessionError::Busy.into());
            }
        }
        let request = GreetingRequest::new(name, relation)?;

        {
            let mut session = lock(&self.session);
            session.apply(SessionEvent::Submit)?;
            session.apply(SessionEvent::Classified)?;
        }
        *lock(&self.greeting) = None;
        lock(&self.animator).start();

        let orchestrator = self.orchestrator.clone();
        let task = tokio::spawn(async move { orchestrator.generate(&request).await });
        let joined = task.await;

        lock(&self.animator).cancel();

        match joined {
            Ok(greeting) => {
                lock(&self.session).apply(SessionEvent::Generated)?;
                tracing::info!(source = greeting.source.as_str(), "Greeting ready");
                *lock(&self.greeting) = Some(greeting.clone());
                Ok(greeting)
            }
            Err(e) => {
                tracing::error!("Generation task failed: {e}");
                let mut session = lock(&self.session);
                if !session.is_expired() {
                    session.apply(SessionEvent::Fail(GENERATION_FAILED_MESSAGE.to_string()))?;
                }
                Err(FlowError::Generation)
            }
        }
    }

    fn current_greeting(&self) -> Result<GeneratedGreeting, FlowError> {
        let state = self.state();
        if !state.has_greeting() {
            return Err(match state {
                SessionState::Expired => greeting_core::SessionError::Expired.into(),
                _ => FlowError::NoGreeting,
            });
        }
        self.greeting().ok_or(FlowError::NoGreeting)
    }

    /// Card sized for a `width`x`height` container.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoGreeting`] before a greeting is ready.
    pub fn compact(&self, width: u32, height: u32) -> Result<Surface, FlowError> {
        let greeting = self.current_greeting()?;
        Ok(layout::compact(&greeting, &self.style, width, height))
    }

    /// The 1080x1920 story card.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoGreeting`] before a greeting is ready.
    pub fn story(&self) -> Result<Surface, FlowError> {
        let greeting = self.current_greeting()?;
        Ok(layout::story(&greeting, &self.style))
    }

    /// Both layouts: the compact card for a `width`x`height` container and
    /// the story card.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoGreeting`] before a greeting is ready.
    pub fn layouts(&self, width: u32, height: u32) -> Result<(Surface, Surface), FlowError> {
        let greeting = self.current_greeting()?;
        Ok((
            layout::compact(&greeting, &self.style, width, height),
            layout::story(&greeting, &self.style),
        ))
    }

    /// Capture the story card.
    ///
    /// # Errors
    ///
    /// - [`FlowError::NoGreeting`] before a greeting is ready.
    /// - [`FlowError::Capture`] if capture fails; the session moves to
    ///   `Failed`.
    pub async fn capture(&self) -> Result<(GeneratedGreeting, CardArtifact), FlowError> {
        let greeting = self.current_greeting()?;
        let surface = layout::story(&greeting, &self.style);

        match self.capturer.capture(&surface).await {
            Ok(artifact) => {
                lock(&self.session).apply(SessionEvent::Captured)?;
                Ok((greeting, artifact))
            }
            Err(e) => {
                let mut session = lock(&self.session);
                if !session.is_expired() {
                    session.apply(SessionEvent::Fail(CAPTURE_FAILED_MESSAGE.to_string()))?;
                }
                Err(FlowError::Capture(e))
            }
        }
    }

    /// Capture and save the card.
    ///
    /// # Errors
    ///
    /// Capture errors as in [`Self::capture`], plus
    /// [`FlowError::Distribute`] if the file cannot be written.
    pub async fn download(&self) -> Result<PathBuf, FlowError> {
        let (greeting, artifact) = self.capture().await?;
        Ok(self.distributor.download(&artifact, &greeting.name).await?)
    }

    /// Capture and share the card.
    ///
    /// # Errors
    ///
    /// Capture errors as in [`Self::capture`]. Share failures are reported
    /// through the returned [`ShareOutcome`].
    pub async fn share(&self) -> Result<ShareOutcome, FlowError> {
        let (greeting, artifact) = self.capture().await?;
        Ok(self.distributor.share(&artifact, &greeting.name).await)
    }

    /// Back to the form.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Session`] once the season is over, or while a
    /// greeting is being generated.
    pub fn reset(&self) -> Result<SessionState, FlowError> {
        let state = lock(&self.session).apply(SessionEvent::Reset)?;
        lock(&self.animator).cancel();
        *lock(&self.greeting) = None;
        Ok(state)
    }
}
