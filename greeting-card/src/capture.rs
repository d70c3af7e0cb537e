//! Card capture.

use std::sync::Arc;
use std::time::Duration;

use greeting_core::metrics;

use crate::error::CaptureError;
use crate::layout::{Surface, STORY_HEIGHT, STORY_WIDTH};
use crate::raster::Rasterizer;

/// Device pixels per logical pixel.
pub const PIXEL_RATIO: u32 = 2;

/// MIME type of every artifact.
pub const PNG_MIME: &str = "image/png";

/// A captured story card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardArtifact {
    bytes: Vec<u8>,
    logical_width: u32,
    logical_height: u32,
    pixel_ratio: u32,
}

impl CardArtifact {
    /// Encoded PNG bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Logical width, always 1080.
    #[must_use]
    pub fn logical_width(&self) -> u32 {
        self.logical_width
    }

    /// Logical height, always 1920.
    #[must_use]
    pub fn logical_height(&self) -> u32 {
        self.logical_height
    }

    /// Device pixels per logical pixel.
    #[must_use]
    pub fn pixel_ratio(&self) -> u32 {
        self.pixel_ratio
    }

    /// Raster size in device pixels.
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.logical_width * self.pixel_ratio,
            self.logical_height * self.pixel_ratio,
        )
    }

    /// MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        PNG_MIME
    }
}

/// Captures story surfaces into PNG artifacts.
#[derive(Clone)]
pub struct ImageCapturer {
    rasterizer: Arc<dyn Rasterizer>,
    settle: Duration,
}

impl ImageCapturer {
    /// Capturer drawing through `rasterizer`, waiting `settle` before each
    /// capture.
    #[must_use]
    pub fn new(rasterizer: Arc<dyn Rasterizer>, settle: Duration) -> Self {
        Self { rasterizer, settle }
    }

    /// Capture `surface` at twice its logical size.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::WrongSize`] if the surface is not 1080x1920.
    /// - [`CaptureError::Render`] if rasterization fails.
    /// - [`CaptureError::Task`] if the rasterization thread dies.
    #[tracing::instrument(name = "capture_card", skip_all)]
    pub async fn capture(&self, surface: &Surface) -> Result<CardArtifact, CaptureError> {
        let result = self.capture_inner(surface).await;
        match &result {
            Ok(artifact) => {
                metrics::record_capture("ok");
                tracing::debug!(bytes = artifact.bytes().len(), "Card captured");
            }
            Err(e) => {
                metrics::record_capture("failed");
                tracing::warn!("Card capture failed: {e}");
            }
        }
        result
    }

    async fn capture_inner(&self, surface: &Surface) -> Result<CardArtifact, CaptureError> {
        tokio::time::sleep(self.settle).await;

        if (surface.width(), surface.height()) != (STORY_WIDTH, STORY_HEIGHT) {
            return Err(CaptureError::WrongSize {
                width: surface.width(),
                height: surface.height(),
            });
        }

        let rasterizer = Arc::clone(&self.rasterizer);
        let surface = surface.clone();
        #[allow(clippy::cast_precision_loss)]
        let ratio = PIXEL_RATIO as f32;
        let bytes = tokio::task::spawn_blocking(move || rasterizer.rasterize(&surface, ratio))
            .await
            .map_err(|e| CaptureError::Task(e.to_string()))??;

        Ok(CardArtifact {
            bytes,
            logical_width: STORY_WIDTH,
            logical_height: STORY_HEIGHT,
            pixel_ratio: PIXEL_RATIO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::layout::Primitive;

    struct Fixed;

    impl Rasterizer for Fixed {
        fn rasterize(&self, _surface: &Surface, pixel_ratio: f32) -> crate::RenderResult<Vec<u8>> {
            assert!((pixel_ratio - 2.0).abs() < f32::EPSILON);
            Ok(vec![1, 2, 3])
        }
    }

    struct Broken;

    impl Rasterizer for Broken {
        fn rasterize(&self, _surface: &Surface, _pixel_ratio: f32) -> crate::RenderResult<Vec<u8>> {
            Err(RenderError::Rasterize("boom".into()))
        }
    }

    struct Panicking;

    impl Rasterizer for Panicking {
        fn rasterize(&self, _surface: &Surface, _pixel_ratio: f32) -> crate::RenderResult<Vec<u8>> {
            panic!("rasterizer crashed");
        }
    }

    fn story_surface() -> Surface {
        let mut surface = Surface::new(STORY_WIDTH, STORY_HEIGHT);
        surface.push(Primitive::Circle {
            cx: 10.0,
            cy: 10.0,
            r: 5.0,
            fill: None,
            opacity: 1.0,
        });
        surface
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_waits_for_settle() {
        let capturer = ImageCapturer::new(Arc::new(Fixed), Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        let artifact = capturer.capture(&story_surface()).await.expect("capture");
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(artifact.bytes(), &[1, 2, 3]);
        assert_eq!(artifact.pixel_size(), (2160, 3840));
        assert_eq!(artifact.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_rejects_other_sizes() {
        let capturer = ImageCapturer::new(Arc::new(Fixed), Duration::ZERO);
        let err = capturer
            .capture(&Surface::new(512, 900))
            .await
            .expect_err("should reject");
        assert!(matches!(
            err,
            CaptureError::WrongSize {
                width: 512,
                height: 900
            }
        ));
    }

    #[tokio::test]
    async fn test_render_failure_propagates() {
        let capturer = ImageCapturer::new(Arc::new(Broken), Duration::ZERO);
        let err = capturer.capture(&story_surface()).await.expect_err("should fail");
        assert!(matches!(err, CaptureError::Render(RenderError::Rasterize(_))));
    }

    #[tokio::test]
    async fn test_rasterizer_panic_is_contained() {
        let capturer = ImageCapturer::new(Arc::new(Panicking), Duration::ZERO);
        let err = capturer.capture(&story_surface()).await.expect_err("should fail");
        assert!(matches!(err, CaptureError::Task(_)));
    }
}
