//! Ink bounding-box extraction.

use crate::surface::RasterSnapshot;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Tight box around all ink, in canvas pixels. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// Midpoint of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x as f64 + self.max_x as f64) / 2.0,
            (self.min_y as f64 + self.max_y as f64) / 2.0,
        )
    }

    /// Width in pixels (inclusive).
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Height in pixels (inclusive).
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Pixel-covering rectangle.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.min_x as f64,
            self.min_y as f64,
            self.max_x as f64 + 1.0,
            self.max_y as f64 + 1.0,
        )
    }
}

/// Scan the whole raster for pixels with non-zero alpha.
///
/// Returns `None` if the raster holds no ink.
pub fn find_bounds(snapshot: &RasterSnapshot<'_>) -> Option<BoundingBox> {
    let width = snapshot.width();
    if width == 0 {
        return None;
    }

    let mut min_x = width;
    let mut min_y = snapshot.height();
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    let row_len = width as usize * 4;
    for (y, row) in (0u32..).zip(snapshot.data().chunks_exact(row_len)) {
        for (x, pixel) in (0u32..).zip(row.chunks_exact(4)) {
            if pixel[3] > 0 {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                found = true;
            }
        }
    }

    found.then_some(BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
    })
}
