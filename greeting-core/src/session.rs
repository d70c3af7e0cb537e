//! Per-session state machine.
//!
//! One [`Session`] tracks a single user's progress from the form to a
//! captured card. The cutoff is checked on every event and, once observed,
//! latches the session into [`SessionState::Expired`] for good.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cutoff::{Clock, CutoffPolicy, SystemClock};

/// Where a session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for a submission.
    Idle,
    /// Request accepted, recipient being classified.
    Classifying,
    /// Waiting on the orchestrator.
    Generating,
    /// Message final, card layouts available.
    Rendering,
    /// At least one card was captured.
    ArtifactReady,
    /// The season is over. Terminal.
    Expired,
    /// The last step failed. Reset or submit again.
    Failed,
}

impl SessionState {
    /// Whether a generation is in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Classifying | Self::Generating)
    }

    /// Whether a finished greeting is available for rendering.
    #[must_use]
    pub fn has_greeting(self) -> bool {
        matches!(self, Self::Rendering | Self::ArtifactReady)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Classifying => "classifying",
            Self::Generating => "generating",
            Self::Rendering => "rendering",
            Self::ArtifactReady => "artifact_ready",
            Self::Expired => "expired",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Inputs that move a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user submitted the form.
    Submit,
    /// Classification finished.
    Classified,
    /// The orchestrator produced a greeting.
    Generated,
    /// A card was captured.
    Captured,
    /// A step failed with a user-facing reason.
    Fail(String),
    /// Back to the form.
    Reset,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit => f.write_str("submit"),
            Self::Classified => f.write_str("classified"),
            Self::Generated => f.write_str("generated"),
            Self::Captured => f.write_str("captured"),
            Self::Fail(_) => f.write_str("fail"),
            Self::Reset => f.write_str("reset"),
        }
    }
}

/// Rejected events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A generation is already in flight.
    #[error("A greeting is already being generated")]
    Busy,

    /// The season has ended.
    #[error("The holiday season has ended")]
    Expired,

    /// The event makes no sense in the current state.
    #[error("Cannot apply {event} while {state}")]
    InvalidTransition {
        /// State at the time of the event.
        state: SessionState,
        /// Event name.
        event: String,
    },
}

/// State machine for one user session.
pub struct Session {
    state: SessionState,
    policy: CutoffPolicy,
    clock: Arc<dyn Clock>,
    failure: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CutoffPolicy::season(), Arc::new(SystemClock))
    }
}

impl Session {
    /// New session. Starts expired if the clock already reads past the
    /// cutoff.
    #[must_use]
    pub fn new(policy: CutoffPolicy, clock: Arc<dyn Clock>) -> Self {
        let mut session = Self {
            state: SessionState::Idle,
            policy,
            clock,
            failure: None,
        };
        session.is_expired();
        session
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// User-facing reason of the last failure, if the session is `Failed`.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Evaluate the cutoff. Once true, stays true.
    pub fn is_expired(&mut self) -> bool {
        if self.state == SessionState::Expired {
            return true;
        }
        if self.policy.is_expired(self.clock.as_ref()) {
            tracing::info!(cutoff = %self.policy.cutoff(), "Season ended, session expired");
            self.state = SessionState::Expired;
            self.failure = None;
            return true;
        }
        false
    }

    /// Apply `event` and return the new state.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Expired`] once the cutoff has passed.
    /// - [`SessionError::Busy`] when submitting or resetting during a
    ///   generation.
    /// - [`SessionError::InvalidTransition`] for any other event that does
    ///   not apply to the current state.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionState, SessionError> {
        use SessionEvent as E;
        use SessionState as S;

        if self.is_expired() {
            return Err(SessionError::Expired);
        }

        let next = match (self.state, &event) {
            (s, E::Submit | E::Reset) if s.is_busy() => return Err(SessionError::Busy),
            (S::Idle | S::Rendering | S::ArtifactReady | S::Failed, E::Submit) => S::Classifying,
            (S::Classifying, E::Classified) => S::Generating,
            (S::Generating, E::Generated) => S::Rendering,
            (S::Rendering | S::ArtifactReady, E::Captured) => S::ArtifactReady,
            (_, E::Fail(_) | E::Reset) => {
                if let E::Fail(reason) = &event {
                    self.failure = Some(reason.clone());
                    S::Failed
                } else {
                    S::Idle
                }
            }
            (state, event) => {
                return Err(SessionError::InvalidTransition {
                    state,
                    event: event.to_string(),
                })
            }
        };

        if next != S::Failed {
            self.failure = None;
        }
        tracing::debug!(from = %self.state, to = %next, %event, "Session transition");
        self.state = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutoff::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};

    fn instant(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().expect("valid date")
    }

    fn session_at(now: DateTime<Utc>) -> (Session, ManualClock) {
        let clock = ManualClock::new(now);
        let session = Session::new(
            CutoffPolicy::new(instant(2026, 1, 1)),
            Arc::new(clock.clone()),
        );
        (session, clock)
    }

    #[test]
    fn test_happy_path() {
        let (mut session, _) = session_at(instant(2025, 12, 24));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.apply(SessionEvent::Submit), Ok(SessionState::Classifying));
        assert_eq!(session.apply(SessionEvent::Classified), Ok(SessionState::Generating));
        assert_eq!(session.apply(SessionEvent::Generated), Ok(SessionState::Rendering));
        assert_eq!(session.apply(SessionEvent::Captured), Ok(SessionState::ArtifactReady));
        assert_eq!(session.apply(SessionEvent::Captured), Ok(SessionState::ArtifactReady));
        assert_eq!(session.apply(SessionEvent::Submit), Ok(SessionState::Classifying));
    }

    #[test]
    fn test_busy_guard() {
        let (mut session, _) = session_at(instant(2025, 12, 24));
        session.apply(SessionEvent::Submit).expect("submit");
        assert_eq!(session.apply(SessionEvent::Submit), Err(SessionError::Busy));
        session.apply(SessionEvent::Classified).expect("classified");
        assert_eq!(session.apply(SessionEvent::Submit), Err(SessionError::Busy));
    }

    #[test]
    fn test_reset_rejected_while_generating() {
        let (mut session, _) = session_at(instant(2025, 12, 24));
        session.apply(SessionEvent::Submit).expect("submit");
        assert_eq!(session.apply(SessionEvent::Reset), Err(SessionError::Busy));
        session.apply(SessionEvent::Classified).expect("classified");
        assert_eq!(session.apply(SessionEvent::Reset), Err(SessionError::Busy));
        assert_eq!(session.state(), SessionState::Generating);

        session.apply(SessionEvent::Generated).expect("generated");
        assert_eq!(session.apply(SessionEvent::Reset), Ok(SessionState::Idle));
    }

    #[test]
    fn test_invalid_transition() {
        let (mut session, _) = session_at(instant(2025, 12, 24));
        let err = session.apply(SessionEvent::Captured).expect_err("should reject");
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                state: SessionState::Idle,
                ..
            }
        ));
    }

    #[test]
    fn test_fail_records_reason_and_reset_clears() {
        let (mut session, _) = session_at(instant(2025, 12, 24));
        session.apply(SessionEvent::Submit).expect("submit");
        session
            .apply(SessionEvent::Fail("elves".into()))
            .expect("fail");
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.failure(), Some("elves"));
        session.apply(SessionEvent::Reset).expect("reset");
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.failure(), None);
    }

    #[test]
    fn test_starts_expired_past_cutoff() {
        let (mut session, _) = session_at(instant(2026, 1, 1));
        assert_eq!(session.state(), SessionState::Expired);
        assert_eq!(session.apply(SessionEvent::Submit), Err(SessionError::Expired));
    }

    #[test]
    fn test_expiry_is_monotonic() {
        let (mut session, clock) = session_at(instant(2025, 12, 31));
        assert!(!session.is_expired());

        clock.set(instant(2026, 1, 2));
        assert!(session.is_expired());

        // Even if the clock goes backwards the session stays expired.
        clock.set(instant(2025, 12, 1));
        assert!(session.is_expired());
        assert_eq!(session.apply(SessionEvent::Reset), Err(SessionError::Expired));
        assert_eq!(session.state(), SessionState::Expired);
    }

    #[test]
    fn test_expiry_mid_flow() {
        let (mut session, clock) = session_at(instant(2025, 12, 31));
        session.apply(SessionEvent::Submit).expect("submit");
        session.apply(SessionEvent::Classified).expect("classified");
        clock.set(instant(2026, 1, 1));
        assert_eq!(session.apply(SessionEvent::Generated), Err(SessionError::Expired));
        assert_eq!(session.state(), SessionState::Expired);
    }
}
