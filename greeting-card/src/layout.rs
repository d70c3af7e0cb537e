//! Card layouts.
//!
//! A layout turns a [`GeneratedGreeting`] into a [`Surface`]: an ordered list
//! of drawing primitives with no dependency on any renderer. Both layouts
//! share the same slots (eyebrow, avatar, salutation, quoted message,
//! closing, signature). The story layout adds a fixed 1080x1920 backdrop.

use std::io::Cursor;
use std::path::Path;

use greeting_core::GeneratedGreeting;

use crate::error::{RenderError, RenderResult};

/// Story canvas width in logical pixels.
pub const STORY_WIDTH: u32 = 1080;
/// Story canvas height in logical pixels.
pub const STORY_HEIGHT: u32 = 1920;

const CHRISTMAS_RED: &str = "#D42426";
const CHRISTMAS_GOLD: &str = "#F8B229";
const CREAM: &str = "#FDFBF7";
const INK: &str = "#111827";
const BODY: &str = "#374151";
const MUTED: &str = "#9CA3AF";
const WHITE: &str = "#FFFFFF";

const STORY_GRADIENT: [(f32, &str); 3] = [(0.0, "#1A472A"), (0.5, "#2D5A3F"), (1.0, "#0F2B1D")];
const SNOWFLAKES: usize = 20;
const STORY_PADDING: f32 = 80.0;
const FOOTER_SIZE: f32 = 30.0;
const AVATAR_MAX_PX: u32 = 512;

/// Fill paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// Flat colour.
    Solid(String),
    /// Linear gradient.
    Linear(LinearGradient),
}

impl Paint {
    /// Flat colour paint.
    #[must_use]
    pub fn solid(color: &str) -> Self {
        Self::Solid(color.to_string())
    }
}

/// Linear gradient in bounding-box units.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    /// Identifier, unique within a surface.
    pub id: String,
    /// Start x (0..1).
    pub x1: f32,
    /// Start y (0..1).
    pub y1: f32,
    /// End x (0..1).
    pub x2: f32,
    /// End y (0..1).
    pub y2: f32,
    /// `(offset, colour)` pairs.
    pub stops: Vec<(f32, String)>,
}

/// Outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Colour.
    pub color: String,
    /// Width.
    pub width: f32,
    /// Dash length, for dashed outlines.
    pub dash: Option<f32>,
}

impl Stroke {
    fn solid(color: &str, width: f32) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: None,
        }
    }
}

/// Generic font family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    /// Sans-serif.
    Sans,
    /// Serif.
    Serif,
}

/// Text style.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Size in logical pixels.
    pub size: f32,
    /// Family.
    pub family: FontFamily,
    /// Bold weight.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Extra spacing between glyphs.
    pub letter_spacing: f32,
}

impl Font {
    fn sans(size: f32) -> Self {
        Self {
            size,
            family: FontFamily::Sans,
            bold: false,
            italic: false,
            letter_spacing: 0.0,
        }
    }

    fn serif(size: f32) -> Self {
        Self {
            family: FontFamily::Serif,
            ..Self::sans(size)
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn tracking(mut self, letter_spacing: f32) -> Self {
        self.letter_spacing = letter_spacing;
        self
    }
}

/// Horizontal alignment of a text block around its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `x` is the left edge.
    Start,
    /// `x` is the centre line.
    Middle,
    /// `x` is the right edge.
    End,
}

/// A coloured stretch of text within a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Text.
    pub text: String,
    /// Colour.
    pub color: String,
}

impl Run {
    fn new(text: impl Into<String>, color: &str) -> Self {
        Self {
            text: text.into(),
            color: color.to_string(),
        }
    }
}

/// One or more lines of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Anchor x.
    pub x: f32,
    /// Baseline of the first line.
    pub y: f32,
    /// Distance between baselines.
    pub line_height: f32,
    /// Style.
    pub font: Font,
    /// Alignment.
    pub anchor: Anchor,
    /// Lines, each made of runs.
    pub lines: Vec<Vec<Run>>,
    /// Opacity (0..1).
    pub opacity: f32,
}

impl TextBlock {
    fn single(x: f32, y: f32, font: Font, anchor: Anchor, runs: Vec<Run>) -> Self {
        Self {
            x,
            y,
            line_height: font.size * 1.2,
            font,
            anchor,
            lines: vec![runs],
            opacity: 1.0,
        }
    }

    /// Plain text, lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Rectangle, optionally rounded.
    Rect {
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Corner radius.
        radius: f32,
        /// Fill.
        fill: Option<Paint>,
        /// Outline.
        stroke: Option<Stroke>,
        /// Opacity (0..1).
        opacity: f32,
    },
    /// Circle.
    Circle {
        /// Centre x.
        cx: f32,
        /// Centre y.
        cy: f32,
        /// Radius.
        r: f32,
        /// Fill.
        fill: Option<Paint>,
        /// Opacity (0..1).
        opacity: f32,
    },
    /// Straight line.
    Line {
        /// Start x.
        x1: f32,
        /// Start y.
        y1: f32,
        /// End x.
        x2: f32,
        /// End y.
        y2: f32,
        /// Outline.
        stroke: Stroke,
        /// Opacity (0..1).
        opacity: f32,
    },
    /// Text.
    Text(TextBlock),
    /// Raster image clipped to a circle.
    Image {
        /// Centre x.
        cx: f32,
        /// Centre y.
        cy: f32,
        /// Radius.
        r: f32,
        /// Image source, usually a data URI.
        href: String,
    },
}

/// Renderable surface of fixed logical size.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    primitives: Vec<Primitive>,
}

impl Surface {
    /// Empty surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            primitives: Vec::new(),
        }
    }

    /// Logical width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Primitives in paint order.
    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Append a primitive on top.
    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Text of every text block, in paint order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text(block) => Some(block.text()),
                _ => None,
            })
            .collect()
    }

    /// Whether any text block equals `text`.
    #[must_use]
    pub fn contains_text(&self, text: &str) -> bool {
        self.texts().iter().any(|t| t == text)
    }

    fn extend(&mut self, primitives: Vec<Primitive>) {
        self.primitives.extend(primitives);
    }
}

/// Avatar image embedded as a PNG data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    data_uri: String,
}

impl Avatar {
    /// Decode an image and downscale it for embedding.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Avatar`] if the bytes are not a supported image.
    pub fn from_bytes(bytes: &[u8]) -> RenderResult<Self> {
        use base64::Engine;

        let image =
            image::load_from_memory(bytes).map_err(|e| RenderError::Avatar(e.to_string()))?;
        let image = image.thumbnail(AVATAR_MAX_PX, AVATAR_MAX_PX);

        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| RenderError::Avatar(format!("PNG encoding failed: {e}")))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
        Ok(Self {
            data_uri: format!("data:image/png;base64,{encoded}"),
        })
    }

    /// Load an avatar from a file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Avatar`] if the file cannot be read or decoded.
    pub fn from_path(path: &Path) -> RenderResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Avatar(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes)
    }

    /// The data URI.
    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Personal touches shared by every card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStyle {
    /// Name under "Warmly,".
    pub signature: String,
    /// Name in the story footer.
    pub nickname: String,
    /// Picture in the avatar ring. Initials are drawn when absent.
    pub avatar: Option<Avatar>,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            signature: "Francis Mistica".to_string(),
            nickname: "Kaiko".to_string(),
            avatar: None,
        }
    }
}

impl CardStyle {
    fn initials(&self) -> String {
        self.signature
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct CardMetrics {
    width: f32,
    radius: f32,
    frame_padding: f32,
    red_border: f32,
    border_gap: f32,
    dashed_border: f32,
    content_padding: f32,
    eyebrow_size: f32,
    divider_width: f32,
    divider_height: f32,
    section_gap: f32,
    avatar_diameter: f32,
    avatar_border: f32,
    heading_size: f32,
    message_size: f32,
    message_leading: f32,
    quote_size: f32,
    closing_size: f32,
    signature_size: f32,
    corner: f32,
}

impl CardMetrics {
    const COMPACT: Self = Self {
        width: 512.0,
        radius: 12.0,
        frame_padding: 8.0,
        red_border: 3.0,
        border_gap: 4.0,
        dashed_border: 1.0,
        content_padding: 40.0,
        eyebrow_size: 10.0,
        divider_width: 48.0,
        divider_height: 1.0,
        section_gap: 24.0,
        avatar_diameter: 160.0,
        avatar_border: 4.0,
        heading_size: 36.0,
        message_size: 20.0,
        message_leading: 1.625,
        quote_size: 60.0,
        closing_size: 12.0,
        signature_size: 18.0,
        corner: 64.0,
    };

    const STORY: Self = Self {
        width: 1000.0,
        radius: 24.0,
        frame_padding: 32.0,
        red_border: 6.0,
        border_gap: 8.0,
        dashed_border: 3.0,
        content_padding: 64.0,
        eyebrow_size: 20.0,
        divider_width: 96.0,
        divider_height: 4.0,
        section_gap: 40.0,
        avatar_diameter: 256.0,
        avatar_border: 8.0,
        heading_size: 60.0,
        message_size: 36.0,
        message_leading: 1.5,
        quote_size: 128.0,
        closing_size: 20.0,
        signature_size: 36.0,
        corner: 96.0,
    };

    fn scaled(self, s: f32) -> Self {
        Self {
            width: self.width * s,
            radius: self.radius * s,
            frame_padding: self.frame_padding * s,
            red_border: self.red_border * s,
            border_gap: self.border_gap * s,
            dashed_border: self.dashed_border * s,
            content_padding: self.content_padding * s,
            eyebrow_size: self.eyebrow_size * s,
            divider_width: self.divider_width * s,
            divider_height: self.divider_height * s,
            section_gap: self.section_gap * s,
            avatar_diameter: self.avatar_diameter * s,
            avatar_border: self.avatar_border * s,
            heading_size: self.heading_size * s,
            message_size: self.message_size * s,
            message_leading: self.message_leading,
            quote_size: self.quote_size * s,
            closing_size: self.closing_size * s,
            signature_size: self.signature_size * s,
            corner: self.corner * s,
        }
    }

    /// Distance from the card edge to the content box.
    fn inset(&self) -> f32 {
        self.frame_padding
            + self.red_border
            + self.border_gap
            + self.dashed_border
            + self.content_padding
    }
}

/// Card sized for an arbitrary container.
///
/// Proportions follow the container width; the card shrinks further when
/// the container is too short to hold it.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compact(greeting: &GeneratedGreeting, style: &CardStyle, width: u32, height: u32) -> Surface {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let mut metrics = CardMetrics::COMPACT.scaled(w / CardMetrics::COMPACT.width);
    let (_, card_height) = draw_card(greeting, style, &metrics, 0.0, 0.0);
    if card_height > h {
        metrics = metrics.scaled(h / card_height);
    }

    let (_, card_height) = draw_card(greeting, style, &metrics, 0.0, 0.0);
    let left = (w - metrics.width) / 2.0;
    let top = ((h - card_height) / 2.0).max(0.0);
    let (card, _) = draw_card(greeting, style, &metrics, left, top);

    let mut surface = Surface::new(width.max(1), height.max(1));
    surface.extend(card);
    surface
}

/// Fixed 1080x1920 story card.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn story(greeting: &GeneratedGreeting, style: &CardStyle) -> Surface {
    let (w, h) = (STORY_WIDTH as f32, STORY_HEIGHT as f32);
    let mut surface = Surface::new(STORY_WIDTH, STORY_HEIGHT);

    surface.push(Primitive::Rect {
        x: 0.0,
        y: 0.0,
        width: w,
        height: h,
        radius: 0.0,
        fill: Some(Paint::Linear(LinearGradient {
            id: "story-backdrop".to_string(),
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
            stops: STORY_GRADIENT
                .iter()
                .map(|(offset, color)| (*offset, (*color).to_string()))
                .collect(),
        })),
        stroke: None,
        opacity: 1.0,
    });

    let mut rng = SnowRng::seeded(&greeting.name);
    for _ in 0..SNOWFLAKES {
        let cx = rng.next_unit() * w;
        let cy = rng.next_unit() * h;
        let diameter = rng.next_unit() * 10.0 + 5.0;
        surface.push(Primitive::Circle {
            cx,
            cy,
            r: diameter / 2.0,
            fill: Some(Paint::solid(WHITE)),
            opacity: 0.4,
        });
    }

    let footer_baseline = h - STORY_PADDING;
    let top_limit = STORY_PADDING;
    let bottom_limit = footer_baseline - FOOTER_SIZE - STORY_PADDING;
    let available = bottom_limit - top_limit;

    let mut metrics = CardMetrics::STORY;
    let (_, card_height) = draw_card(greeting, style, &metrics, 0.0, 0.0);
    if card_height > available {
        metrics = metrics.scaled(available / card_height);
    }
    let (_, card_height) = draw_card(greeting, style, &metrics, 0.0, 0.0);
    let left = (w - metrics.width) / 2.0;
    let top = top_limit + (available - card_height) / 2.0;
    let (card, _) = draw_card(greeting, style, &metrics, left, top);
    surface.extend(card);

    let footer = format!("Christmas 2025 🎄 - by {}", style.nickname).to_uppercase();
    let mut footer = TextBlock::single(
        w / 2.0,
        footer_baseline,
        Font::sans(FOOTER_SIZE).tracking(FOOTER_SIZE * 0.2),
        Anchor::Middle,
        vec![Run::new(footer, WHITE)],
    );
    footer.opacity = 0.5;
    surface.push(Primitive::Text(footer));

    surface
}

/// Draw the card with its top-left corner at `(left, top)`.
///
/// Returns the primitives and the card height.
#[allow(clippy::too_many_lines)]
fn draw_card(
    greeting: &GeneratedGreeting,
    style: &CardStyle,
    m: &CardMetrics,
    left: f32,
    top: f32,
) -> (Vec<Primitive>, f32) {
    let inset = m.inset();
    let content_left = left + inset;
    let content_width = m.width - 2.0 * inset;
    let cx = left + m.width / 2.0;
    let mut y = top + inset;
    let mut content = Vec::new();

    // Eyebrow
    content.push(Primitive::Text(TextBlock::single(
        cx,
        y + m.eyebrow_size,
        Font::sans(m.eyebrow_size).bold().tracking(m.eyebrow_size * 0.35),
        Anchor::Middle,
        vec![Run::new("SEASONS GREETINGS", CHRISTMAS_RED)],
    )));
    y += m.eyebrow_size * 1.5 + m.eyebrow_size * 0.5;
    content.push(Primitive::Rect {
        x: cx - m.divider_width / 2.0,
        y,
        width: m.divider_width,
        height: m.divider_height,
        radius: 0.0,
        fill: Some(Paint::solid(CHRISTMAS_GOLD)),
        stroke: None,
        opacity: 0.5,
    });
    y += m.divider_height + m.section_gap;

    // Avatar ring
    let r = m.avatar_diameter / 2.0;
    let cy = y + r;
    content.push(Primitive::Circle {
        cx,
        cy,
        r: r + m.avatar_border,
        fill: Some(Paint::solid(CHRISTMAS_GOLD)),
        opacity: 0.8,
    });
    content.push(Primitive::Circle {
        cx,
        cy,
        r,
        fill: Some(Paint::solid(WHITE)),
        opacity: 1.0,
    });
    let inner = r - m.avatar_border;
    match style.avatar.as_ref() {
        Some(avatar) => content.push(Primitive::Image {
            cx,
            cy,
            r: inner,
            href: avatar.data_uri().to_string(),
        }),
        None => {
            content.push(Primitive::Circle {
                cx,
                cy,
                r: inner,
                fill: Some(Paint::solid(CREAM)),
                opacity: 1.0,
            });
            let size = inner * 0.8;
            content.push(Primitive::Text(TextBlock::single(
                cx,
                cy + size * 0.35,
                Font::serif(size).bold(),
                Anchor::Middle,
                vec![Run::new(style.initials(), CHRISTMAS_RED)],
            )));
        }
    }
    y += m.avatar_diameter + m.section_gap;

    // Salutation, shrunk to one line
    let salutation = format!("Dear {},", greeting.name);
    let natural = text_width(&salutation, m.heading_size, 0.0);
    let heading_size = if natural > content_width {
        m.heading_size * content_width / natural
    } else {
        m.heading_size
    };
    content.push(Primitive::Text(TextBlock::single(
        cx,
        y + heading_size,
        Font::sans(heading_size).bold(),
        Anchor::Middle,
        vec![
            Run::new("Dear ", INK),
            Run::new(greeting.name.clone(), CHRISTMAS_RED),
            Run::new(",", INK),
        ],
    )));
    y += heading_size * 1.2 + m.section_gap;

    // Quoted message
    let mut open_quote = TextBlock::single(
        content_left,
        y + m.quote_size * 0.55,
        Font::serif(m.quote_size),
        Anchor::Start,
        vec![Run::new("\u{201c}", CHRISTMAS_RED)],
    );
    open_quote.opacity = 0.1;
    content.push(Primitive::Text(open_quote));

    let message_padding = m.message_size;
    let lines = wrap_text(
        &greeting.message,
        content_width - 2.0 * message_padding,
        m.message_size,
    );
    let line_height = m.message_size * m.message_leading;
    #[allow(clippy::cast_precision_loss)]
    let message_height = line_height * lines.len().max(1) as f32;
    content.push(Primitive::Text(TextBlock {
        x: cx,
        y: y + m.message_size,
        line_height,
        font: Font::serif(m.message_size).italic(),
        anchor: Anchor::Middle,
        lines: lines.into_iter().map(|l| vec![Run::new(l, BODY)]).collect(),
        opacity: 1.0,
    }));
    y += message_height;

    let mut close_quote = TextBlock::single(
        content_left + content_width,
        y + m.quote_size * 0.55,
        Font::serif(m.quote_size),
        Anchor::End,
        vec![Run::new("\u{201d}", CHRISTMAS_RED)],
    );
    close_quote.opacity = 0.1;
    content.push(Primitive::Text(close_quote));
    y += m.section_gap * 1.5;

    // Closing
    content.push(Primitive::Text(TextBlock::single(
        cx,
        y + m.closing_size,
        Font::sans(m.closing_size).tracking(m.closing_size * 0.1),
        Anchor::Middle,
        vec![Run::new("WARMLY,", MUTED)],
    )));
    y += m.closing_size * 1.5 + m.closing_size * 0.3;
    content.push(Primitive::Text(TextBlock::single(
        cx,
        y + m.signature_size,
        Font::sans(m.signature_size).bold(),
        Anchor::Middle,
        vec![Run::new(style.signature.clone(), INK)],
    )));
    y += m.signature_size * 1.3;

    y += inset;
    let height = y - top;

    let mut card = frame(m, left, top, height);
    card.extend(content);
    (card, height)
}

fn frame(m: &CardMetrics, left: f32, top: f32, height: f32) -> Vec<Primitive> {
    let mut primitives = vec![Primitive::Rect {
        x: left,
        y: top,
        width: m.width,
        height,
        radius: m.radius,
        fill: Some(Paint::solid(CREAM)),
        stroke: None,
        opacity: 1.0,
    }];

    let red = m.frame_padding + m.red_border / 2.0;
    primitives.push(Primitive::Rect {
        x: left + red,
        y: top + red,
        width: m.width - 2.0 * red,
        height: height - 2.0 * red,
        radius: m.radius * 0.7,
        fill: None,
        stroke: Some(Stroke::solid(CHRISTMAS_RED, m.red_border)),
        opacity: 1.0,
    });

    let dashed = m.frame_padding + m.red_border + m.border_gap + m.dashed_border / 2.0;
    let (x0, y0) = (left + dashed, top + dashed);
    let (x1, y1) = (left + m.width - dashed, top + height - dashed);
    primitives.push(Primitive::Rect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
        radius: m.radius * 0.35,
        fill: None,
        stroke: Some(Stroke {
            color: CHRISTMAS_GOLD.to_string(),
            width: m.dashed_border,
            dash: Some(m.dashed_border * 4.0),
        }),
        opacity: 1.0,
    });

    // Corner ornaments
    let c = m.corner;
    let ornament = Stroke::solid(CHRISTMAS_RED, m.corner / 16.0);
    for (x, y, dx, dy) in [
        (x0, y0, c, c),
        (x1, y0, -c, c),
        (x0, y1, c, -c),
        (x1, y1, -c, -c),
    ] {
        primitives.push(Primitive::Line {
            x1: x,
            y1: y,
            x2: x + dx,
            y2: y,
            stroke: ornament.clone(),
            opacity: 0.2,
        });
        primitives.push(Primitive::Line {
            x1: x,
            y1: y,
            x2: x,
            y2: y + dy,
            stroke: ornament.clone(),
            opacity: 0.2,
        });
    }

    primitives
}

/// Approximate advance of `c` in ems.
fn glyph_em(c: char) -> f32 {
    match c {
        ' ' | 'i' | 'l' | 'j' | 'I' | '.' | ',' | '\'' | '!' | ':' | ';' | '|' => 0.28,
        'm' | 'w' | 'M' | 'W' => 0.82,
        c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.64,
        c if c.is_ascii() => 0.52,
        c if is_wide(c) => 1.0,
        _ => 0.6,
    }
}

fn is_wide(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1100..=0x115F
            | 0x2600..=0x27BF
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1FAFF
    )
}

/// Estimated width of `text` set at `font_size`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn text_width(text: &str, font_size: f32, letter_spacing: f32) -> f32 {
    let (ems, count) = text
        .chars()
        .fold((0.0_f32, 0_usize), |(ems, n), c| (ems + glyph_em(c), n + 1));
    ems * font_size + letter_spacing * count as f32
}

/// Greedy word wrap to `max_width`.
///
/// Whitespace collapses to single spaces. Words longer than a line are
/// broken between characters. Blank input yields no lines.
#[must_use]
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    if max_width <= 0.0 || !max_width.is_finite() {
        let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
        return if joined.is_empty() { Vec::new() } else { vec![joined] };
    }

    let fits = |s: &str| text_width(s, font_size, 0.0) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_string();
            continue;
        }
        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Deterministic snowflake placement, seeded from the recipient name.
struct SnowRng(u64);

impl SnowRng {
    fn seeded(name: &str) -> Self {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in name.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Self(if hash == 0 { 0x9e37_79b9_7f4a_7c15 } else { hash })
    }

    /// Next value in `[0, 1)`.
    #[allow(clippy::cast_precision_loss)]
    fn next_unit(&mut self) -> f32 {
        // xorshift64*
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        let bits = x.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 40;
        bits as f32 / (1_u64 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeting_core::{EffectiveRelation, GreetingSource, Relation};

    fn greeting(name: &str, message: &str) -> GeneratedGreeting {
        GeneratedGreeting {
            name: name.to_string(),
            effective_relation: EffectiveRelation::Declared(Relation::Parents),
            message: message.to_string(),
            source: GreetingSource::Fallback,
        }
    }

    fn card_rect(surface: &Surface) -> (f32, f32, f32, f32) {
        surface
            .primitives()
            .iter()
            .find_map(|p| match p {
                Primitive::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill: Some(Paint::Solid(color)),
                    ..
                } if color == CREAM => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .expect("card background")
    }

    #[test]
    fn test_story_slots() {
        let surface = story(&greeting("Juan", "Merry Christmas, Juan!"), &CardStyle::default());
        assert_eq!(surface.width(), STORY_WIDTH);
        assert_eq!(surface.height(), STORY_HEIGHT);
        assert!(surface.contains_text("SEASONS GREETINGS"));
        assert!(surface.contains_text("Dear Juan,"));
        assert!(surface.contains_text("Merry Christmas, Juan!"));
        assert!(surface.contains_text("WARMLY,"));
        assert!(surface.contains_text("Francis Mistica"));
        assert!(surface.contains_text("CHRISTMAS 2025 🎄 - BY KAIKO"));
    }

    #[test]
    fn test_snowflakes_are_seeded_by_name() {
        let flakes = |name: &str| -> Vec<Primitive> {
            story(&greeting(name, "hi"), &CardStyle::default())
                .primitives()
                .iter()
                .filter(|p| matches!(p, Primitive::Circle { opacity, .. } if (*opacity - 0.4).abs() < f32::EPSILON))
                .cloned()
                .collect()
        };
        let first = flakes("Juan");
        assert_eq!(first.len(), SNOWFLAKES);
        assert_eq!(first, flakes("Juan"));
        assert_ne!(first, flakes("Ana"));
    }

    #[test]
    fn test_long_message_stays_on_canvas() {
        let message = "Maligayang Pasko! ".repeat(80);
        let surface = story(&greeting("Juan", &message), &CardStyle::default());
        let (x, y, w, h) = card_rect(&surface);
        assert!(x >= 0.0 && x + w <= 1080.0);
        assert!(y >= 0.0 && y + h <= 1920.0 - STORY_PADDING);
    }

    #[test]
    fn test_compact_follows_container() {
        let g = greeting("Juan", "Merry Christmas, Juan!");
        let surface = compact(&g, &CardStyle::default(), 400, 2000);
        assert_eq!((surface.width(), surface.height()), (400, 2000));
        let (x, _, w, _) = card_rect(&surface);
        assert!(x.abs() < 0.01);
        assert!((w - 400.0).abs() < 0.01);

        let short = compact(&g, &CardStyle::default(), 400, 300);
        let (_, y, _, h) = card_rect(&short);
        assert!(y >= 0.0);
        assert!(y + h <= 300.01);
        assert!(short.contains_text("Dear Juan,"));
    }

    #[test]
    fn test_initials_without_avatar() {
        let surface = story(&greeting("Juan", "hi"), &CardStyle::default());
        assert!(surface.contains_text("FM"));
        assert!(!surface
            .primitives()
            .iter()
            .any(|p| matches!(p, Primitive::Image { .. })));
    }

    #[test]
    fn test_avatar_is_embedded() {
        let mut png = Cursor::new(Vec::new());
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 30, 30, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .expect("encode");
        let avatar = Avatar::from_bytes(png.get_ref()).expect("avatar");
        assert!(avatar.data_uri().starts_with("data:image/png;base64,"));

        let style = CardStyle {
            avatar: Some(avatar),
            ..CardStyle::default()
        };
        let surface = story(&greeting("Juan", "hi"), &style);
        assert!(surface
            .primitives()
            .iter()
            .any(|p| matches!(p, Primitive::Image { .. })));
    }

    #[test]
    fn test_bad_avatar() {
        assert!(matches!(
            Avatar::from_bytes(b"not an image"),
            Err(RenderError::Avatar(_))
        ));
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "Merry Christmas! Wishing you warmth, joy, and a wonderful holiday season.";
        let lines = wrap_text(text, 200.0, 20.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 20.0, 0.0) <= 200.0, "{line} overflows");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let lines = wrap_text(&"a".repeat(100), 50.0, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "a".repeat(100));
    }

    #[test]
    fn test_wrap_blank() {
        assert!(wrap_text("   ", 100.0, 10.0).is_empty());
    }
}
