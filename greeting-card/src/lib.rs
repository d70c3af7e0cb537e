//! # Greeting Card
//!
//! Card layouts, PNG capture and distribution for holiday greetings.
//!
//! ## Pipeline
//!
//! ```text
//! GeneratedGreeting ─► layout::story ─► Surface ─► svg ─► resvg ─► PNG (2160x3840)
//!                                                                   │
//!                                              ArtifactDistributor ◄┘
//!                                              ├─ download: Christmas-Greeting-<name>.png
//!                                              └─ share:    ShareCapability
//! ```
//!
//! [`GreetingFlow`] wires a session, the orchestrator, the loading animator
//! and this pipeline together.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod distribute;
pub mod error;
pub mod flow;
pub mod layout;
pub mod raster;
pub mod svg;

pub use capture::{CardArtifact, ImageCapturer, PIXEL_RATIO, PNG_MIME};
pub use distribute::{
    artifact_file_name, ArtifactDistributor, CommandShare, ShareCapability, ShareOutcome,
    SharePayload,
};
pub use error::{
    CaptureError, DistributeError, FlowError, RenderError, RenderResult, CAPTURE_FAILED_MESSAGE,
    GENERATION_FAILED_MESSAGE,
};
pub use flow::GreetingFlow;
pub use layout::{Avatar, CardStyle, Surface, STORY_HEIGHT, STORY_WIDTH};
pub use raster::{Rasterizer, SvgRasterizer};

/// Greeting card version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
