//! Raster drawing surface.
//!
//! Strokes are committed straight into a `tiny_skia::Pixmap`; nothing about a
//! stroke survives once the pointer is released. The surface also answers
//! pixel queries for bounds analysis and encodes itself for the solver.

use crate::color::InkColor;
use crate::input::DrawMode;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Point, Rect};
use thiserror::Error;
use tiny_skia::{BlendMode, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Line width for ink strokes, in canvas pixels.
pub const DRAW_STROKE_WIDTH: f32 = 3.0;
/// Line width for eraser strokes, in canvas pixels.
pub const ERASE_STROKE_WIDTH: f32 = 50.0;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("PNG encoding error: {0}")]
    Encode(String),
}

/// Read-only view of a raster's RGBA8 pixels, row-major.
#[derive(Debug, Clone, Copy)]
pub struct RasterSnapshot<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> RasterSnapshot<'a> {
    /// Wrap a raw RGBA8 buffer. Returns `None` if the buffer length does not
    /// match `width * height * 4`.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (data.len() == expected).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Alpha value of the pixel at `(x, y)`, or `None` outside the raster.
    pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i + 3).copied()
    }
}

/// The visible drawing surface.
pub struct Surface {
    pixmap: Pixmap,
    /// Last point of the open stroke, `None` when no stroke is open.
    last_point: Option<Point>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("stroke_open", &self.last_point.is_some())
            .finish()
    }
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
            last_point: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Check if a stroke is currently open.
    pub fn is_stroke_open(&self) -> bool {
        self.last_point.is_some()
    }

    /// Start a new stroke at `point`.
    /// Returns false (and does nothing) if a stroke is already open.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if self.last_point.is_some() {
            log::debug!("Ignoring begin_stroke while a stroke is open");
            return false;
        }
        self.last_point = Some(point);
        true
    }

    /// Draw a segment from the last stroke point to `point`.
    /// Returns false if no stroke is open.
    pub fn extend_stroke(&mut self, point: Point, mode: &DrawMode) -> bool {
        let Some(last) = self.last_point else {
            return false;
        };

        let mut paint = Paint::default();
        paint.anti_alias = true;
        let width = match mode {
            DrawMode::Draw(color) => {
                paint.set_color_rgba8(color.r, color.g, color.b, color.a);
                paint.blend_mode = BlendMode::SourceOver;
                DRAW_STROKE_WIDTH
            }
            DrawMode::Erase { .. } => {
                // Only the source alpha matters for destination-out.
                paint.set_color_rgba8(0, 0, 0, 255);
                paint.blend_mode = BlendMode::DestinationOut;
                ERASE_STROKE_WIDTH
            }
        };

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };

        let mut pb = PathBuilder::new();
        pb.move_to(last.x as f32, last.y as f32);
        pb.line_to(point.x as f32, point.y as f32);
        if let Some(path) = pb.finish() {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        self.last_point = Some(point);
        true
    }

    /// Close the open stroke. Does nothing if none is open.
    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    /// Wipe the raster to fully transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Replace the raster with a new transparent one of the given size.
    /// Existing ink and any open stroke are discarded.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.pixmap = new_pixmap(width, height)?;
        self.last_point = None;
        log::debug!("Surface resized to {}x{}", width, height);
        Ok(())
    }

    /// Fill a solid, non-antialiased block of ink. Covers every pixel whose
    /// origin lies inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: InkColor) {
        let Some(rect) =
            tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
        else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = false;
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Borrow the full raster for pixel-level reads.
    ///
    /// Pixels are premultiplied; the alpha channel is exact.
    pub fn snapshot_pixels(&self) -> RasterSnapshot<'_> {
        RasterSnapshot {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            data: self.pixmap.data(),
        }
    }

    /// Encode the raster as PNG bytes (straight alpha).
    pub fn encode_png(&self) -> Result<Vec<u8>, SurfaceError> {
        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width(), self.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| SurfaceError::Encode(e.to_string()))?;
            writer
                .write_image_data(&rgba)
                .map_err(|e| SurfaceError::Encode(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        }

        Ok(png_data)
    }

    /// Serialize the raster as a `data:image/png;base64,...` URL.
    pub fn to_image_data(&self) -> Result<String, SurfaceError> {
        let png_data = self.encode_png()?;
        Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png_data)))
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, SurfaceError> {
    Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })
}
