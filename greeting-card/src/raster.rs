//! Surface rasterization.
//!
//! [`Rasterizer`] turns a [`Surface`] into encoded PNG bytes.
//! [`SvgRasterizer`] goes through the SVG intermediate representation and
//! the resvg/tiny-skia pipeline.

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::layout::Surface;
use crate::svg::render_svg;

/// Renders a surface to PNG bytes.
///
/// Implementations run on a blocking thread.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `surface` at `pixel_ratio` device pixels per logical pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be serialized, drawn or
    /// encoded.
    fn rasterize(&self, surface: &Surface, pixel_ratio: f32) -> RenderResult<Vec<u8>>;
}

/// resvg-backed rasterizer with a shared font database.
#[derive(Clone)]
pub struct SvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgRasterizer {
    /// Rasterizer using the system fonts. Fonts are loaded once, here.
    #[must_use]
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!(faces = fontdb.len(), "Loaded system fonts");
        Self::with_fonts(fontdb)
    }

    /// Rasterizer using `fontdb`.
    #[must_use]
    pub fn with_fonts(fontdb: usvg::fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Rasterize(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Rasterize("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, surface: &Surface, pixel_ratio: f32) -> RenderResult<Vec<u8>> {
        let svg_string = render_svg(surface, pixel_ratio)?;
        let pixmap = self.rasterize_svg(&svg_string)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Paint, Primitive};

    fn fontless() -> SvgRasterizer {
        SvgRasterizer::with_fonts(usvg::fontdb::Database::new())
    }

    #[test]
    fn test_png_has_device_size() {
        let mut surface = Surface::new(40, 20);
        surface.push(Primitive::Rect {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 20.0,
            radius: 0.0,
            fill: Some(Paint::solid("#D42426")),
            stroke: None,
            opacity: 1.0,
        });

        let png = fontless().rasterize(&surface, 2.0).expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);

        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (80, 40));
        assert_eq!(decoded.get_pixel(40, 20).0, [0xD4, 0x24, 0x26, 0xFF]);
    }

    #[test]
    fn test_serialization_failure_propagates() {
        let mut surface = Surface::new(10, 10);
        surface.push(Primitive::Circle {
            cx: f32::INFINITY,
            cy: 0.0,
            r: 1.0,
            fill: None,
            opacity: 1.0,
        });
        assert!(matches!(
            fontless().rasterize(&surface, 2.0),
            Err(RenderError::Serialize(_))
        ));
    }
}
