//! Surface serialization to SVG.
//!
//! The SVG document is the intermediate representation handed to the
//! rasterizer. Its `width`/`height` are in device pixels and its `viewBox`
//! in logical pixels, so the pixel ratio is applied by the SVG viewport.

use std::fmt::Write;

use crate::error::{RenderError, RenderResult};
use crate::layout::{Anchor, FontFamily, Paint, Primitive, Stroke, Surface, TextBlock};

/// Serialize `surface` at `pixel_ratio` device pixels per logical pixel.
///
/// # Errors
///
/// Returns [`RenderError::Serialize`] if the ratio or any coordinate is not
/// a finite number.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_svg(surface: &Surface, pixel_ratio: f32) -> RenderResult<String> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(RenderError::Serialize(format!(
            "invalid pixel ratio {pixel_ratio}"
        )));
    }
    for (index, primitive) in surface.primitives().iter().enumerate() {
        if !is_finite(primitive) {
            return Err(RenderError::Serialize(format!(
                "primitive {index} has a non-finite coordinate"
            )));
        }
    }

    let (view_w, view_h) = (surface.width(), surface.height());
    let out_w = (view_w as f32 * pixel_ratio).round() as u32;
    let out_h = (view_h as f32 * pixel_ratio).round() as u32;

    let mut svg = String::with_capacity(8192);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
    );

    write_defs(&mut svg, surface);

    let mut clip_id = 0_usize;
    for primitive in surface.primitives() {
        write_primitive(&mut svg, primitive, &mut clip_id);
    }

    svg.push_str("</svg>");
    Ok(svg)
}

fn is_finite(primitive: &Primitive) -> bool {
    let values: Vec<f32> = match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            radius,
            opacity,
            ..
        } => vec![*x, *y, *width, *height, *radius, *opacity],
        Primitive::Circle {
            cx, cy, r, opacity, ..
        } => vec![*cx, *cy, *r, *opacity],
        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            opacity,
        } => vec![*x1, *y1, *x2, *y2, stroke.width, *opacity],
        Primitive::Text(block) => vec![
            block.x,
            block.y,
            block.line_height,
            block.font.size,
            block.font.letter_spacing,
            block.opacity,
        ],
        Primitive::Image { cx, cy, r, .. } => vec![*cx, *cy, *r],
    };
    values.iter().all(|v| v.is_finite())
}

fn write_defs(svg: &mut String, surface: &Surface) {
    let gradients: Vec<_> = surface
        .primitives()
        .iter()
        .filter_map(|p| match p {
            Primitive::Rect {
                fill: Some(Paint::Linear(g)),
                ..
            }
            | Primitive::Circle {
                fill: Some(Paint::Linear(g)),
                ..
            } => Some(g),
            _ => None,
        })
        .collect();
    if gradients.is_empty() {
        return;
    }

    svg.push_str("<defs>");
    for g in gradients {
        let _ = write!(
            svg,
            "<linearGradient id=\"{}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
            escape_xml(&g.id),
            g.x1,
            g.y1,
            g.x2,
            g.y2,
        );
        for (offset, color) in &g.stops {
            let _ = write!(
                svg,
                "<stop offset=\"{offset}\" stop-color=\"{}\"/>",
                escape_xml(color),
            );
        }
        svg.push_str("</linearGradient>");
    }
    svg.push_str("</defs>");
}

fn paint_attr(paint: Option<&Paint>) -> String {
    match paint {
        Some(Paint::Solid(color)) => escape_xml(color),
        Some(Paint::Linear(g)) => format!("url(#{})", escape_xml(&g.id)),
        None => "none".to_string(),
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    let Some(stroke) = stroke else {
        return String::new();
    };
    let mut attrs = format!(
        " stroke=\"{}\" stroke-width=\"{}\"",
        escape_xml(&stroke.color),
        stroke.width
    );
    if let Some(dash) = stroke.dash {
        let _ = write!(attrs, " stroke-dasharray=\"{dash} {dash}\"");
    }
    attrs
}

fn write_primitive(svg: &mut String, primitive: &Primitive, clip_id: &mut usize) {
    match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            radius,
            fill,
            stroke,
            opacity,
        } => {
            let _ = write!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{radius}\" fill=\"{}\"{} opacity=\"{opacity}\"/>",
                paint_attr(fill.as_ref()),
                stroke_attrs(stroke.as_ref()),
            );
        }

        Primitive::Circle {
            cx,
            cy,
            r,
            fill,
            opacity,
        } => {
            let _ = write!(
                svg,
                "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"{}\" opacity=\"{opacity}\"/>",
                paint_attr(fill.as_ref()),
            );
        }

        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            opacity,
        } => {
            let _ = write!(
                svg,
                "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"{} stroke-linecap=\"round\" opacity=\"{opacity}\"/>",
                stroke_attrs(Some(stroke)),
            );
        }

        Primitive::Text(block) => write_text(svg, block),

        Primitive::Image { cx, cy, r, href } => {
            *clip_id += 1;
            let id = format!("avatar-clip-{clip_id}");
            let (x, y, size) = (cx - r, cy - r, r * 2.0);
            let escaped_href = escape_xml(href);
            let _ = write!(
                svg,
                "<clipPath id=\"{id}\"><circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\"/></clipPath>\
<image x=\"{x}\" y=\"{y}\" width=\"{size}\" height=\"{size}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#{id})\" xlink:href=\"{escaped_href}\"/>",
            );
        }
    }
}

fn write_text(svg: &mut String, block: &TextBlock) {
    let family = match block.font.family {
        FontFamily::Sans => "sans-serif",
        FontFamily::Serif => "serif",
    };
    let anchor = match block.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    };
    let _ = write!(
        svg,
        "<text x=\"{}\" y=\"{}\" font-family=\"{family}\" font-size=\"{}\" text-anchor=\"{anchor}\" opacity=\"{}\"",
        block.x, block.y, block.font.size, block.opacity,
    );
    if block.font.bold {
        svg.push_str(" font-weight=\"bold\"");
    }
    if block.font.italic {
        svg.push_str(" font-style=\"italic\"");
    }
    if block.font.letter_spacing > 0.0 {
        let _ = write!(svg, " letter-spacing=\"{}\"", block.font.letter_spacing);
    }
    svg.push('>');

    for (i, runs) in block.lines.iter().enumerate() {
        let dy = if i == 0 { 0.0 } else { block.line_height };
        let _ = write!(svg, "<tspan x=\"{}\" dy=\"{dy}\">", block.x);
        for run in runs {
            let _ = write!(
                svg,
                "<tspan fill=\"{}\">{}</tspan>",
                escape_xml(&run.color),
                escape_xml(&run.text),
            );
        }
        svg.push_str("</tspan>");
    }
    svg.push_str("</text>");
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{story, CardStyle};
    use greeting_core::{EffectiveRelation, GeneratedGreeting, GreetingSource, Relation};

    fn surface(name: &str) -> Surface {
        story(
            &GeneratedGreeting {
                name: name.to_string(),
                effective_relation: EffectiveRelation::Declared(Relation::Family),
                message: "Merry Christmas!".to_string(),
                source: GreetingSource::Fallback,
            },
            &CardStyle::default(),
        )
    }

    #[test]
    fn test_viewport_carries_pixel_ratio() {
        let svg = render_svg(&surface("Juan"), 2.0).expect("svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"2160\""));
        assert!(svg.contains("height=\"3840\""));
        assert!(svg.contains("viewBox=\"0 0 1080 1920\""));
    }

    #[test]
    fn test_backdrop_gradient_defined() {
        let svg = render_svg(&surface("Juan"), 1.0).expect("svg");
        assert!(svg.contains("<linearGradient id=\"story-backdrop\""));
        assert!(svg.contains("fill=\"url(#story-backdrop)\""));
    }

    #[test]
    fn test_name_is_escaped() {
        let svg = render_svg(&surface("<Tom & \"Jerry\">"), 1.0).expect("svg");
        assert!(svg.contains("&lt;Tom &amp; &quot;Jerry&quot;&gt;"));
        assert!(!svg.contains("<Tom"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut s = surface("Juan");
        s.push(Primitive::Circle {
            cx: f32::NAN,
            cy: 0.0,
            r: 1.0,
            fill: None,
            opacity: 1.0,
        });
        assert!(matches!(render_svg(&s, 2.0), Err(RenderError::Serialize(_))));
    }

    #[test]
    fn test_bad_pixel_ratio() {
        assert!(render_svg(&surface("Juan"), 0.0).is_err());
        assert!(render_svg(&surface("Juan"), f32::INFINITY).is_err());
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(escape_xml("a<b>&'\""), "a&lt;b&gt;&amp;&apos;&quot;");
    }
}
