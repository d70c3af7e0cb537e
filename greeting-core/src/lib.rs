//! # Greeting Core
//!
//! Core logic for the holiday greeting generator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                greeting-core                │
//! ├─────────────────────────────────────────────┤
//! │  Relation        │  Orchestrator            │
//! │  - Classifier    │  - Gemini / fallback     │
//! │  - Prompt tones  │  - Pacing floors         │
//! │  - Templates     │  - Best-effort records   │
//! ├─────────────────────────────────────────────┤
//! │  Session FSM     │  Loading animator        │
//! │  - Cutoff latch  │  - Cancellable ticker    │
//! │  - Busy guard    │  - watch channel         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod cutoff;
pub mod error;
pub mod generator;
pub mod greeting;
pub mod loading;
pub mod metrics;
pub mod orchestrator;
pub mod persistence;
pub mod prompt;
pub mod relation;
pub mod session;
pub mod store;
pub mod supabase;
pub mod template;

pub use config::GreetingConfig;
pub use cutoff::{Clock, CutoffPolicy, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use generator::{GeminiClient, GenerationError, TextGenerator, GEMINI_MODEL};
pub use greeting::{GeneratedGreeting, GreetingRequest, GreetingSource};
pub use loading::{LoadingAnimator, LoadingState};
pub use orchestrator::{GreetingOrchestrator, Pacing};
pub use persistence::PersistenceRecorder;
pub use relation::{classify, suggested_relation, Classification, EffectiveRelation, Relation};
pub use session::{Session, SessionError, SessionEvent, SessionState};
pub use store::{GreetingRecord, GreetingStore, JsonlStore, StoreError};
pub use supabase::SupabaseStore;

/// Greeting core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
