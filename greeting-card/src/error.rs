//! Card error types.

use greeting_core::{CoreError, SessionError};
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Alert shown when a card cannot be captured.
pub const CAPTURE_FAILED_MESSAGE: &str = "Oops! Could not capture the magic. Please try again.";

/// Alert shown when the generation flow fails unexpectedly.
pub const GENERATION_FAILED_MESSAGE: &str = "Oops! The elves dropped the server. Please try again.";

/// Errors that can occur while drawing or rasterizing a surface.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface could not be serialized.
    #[error("Surface serialization failed: {0}")]
    Serialize(String),

    /// The serialized surface could not be parsed or drawn.
    #[error("Rasterization failed: {0}")]
    Rasterize(String),

    /// The raster could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// The avatar image could not be loaded.
    #[error("Failed to load avatar: {0}")]
    Avatar(String),
}

/// Errors that can occur while capturing a card.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The surface does not have the story dimensions.
    #[error("Surface is {width}x{height}, expected 1080x1920")]
    WrongSize {
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },

    /// Drawing failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The rasterization task died.
    #[error("Rasterization task failed: {0}")]
    Task(String),
}

/// Errors that can occur while distributing an artifact.
#[derive(Debug, Error)]
pub enum DistributeError {
    /// Writing the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The share capability refused or crashed.
    #[error("Share failed: {0}")]
    Share(String),
}

/// Errors surfaced by the greeting flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The session rejected the step.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The request was invalid.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No greeting has been generated yet.
    #[error("No greeting to render yet")]
    NoGreeting,

    /// The generation task died.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    Generation,

    /// Capturing the card failed.
    #[error("{}", CAPTURE_FAILED_MESSAGE)]
    Capture(#[source] CaptureError),

    /// Writing the download failed.
    #[error(transparent)]
    Distribute(#[from] DistributeError),
}
