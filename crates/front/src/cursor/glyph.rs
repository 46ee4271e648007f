// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Modifier decorations: three fixed unit-square paths and their coverage.

use ab_glyph_rasterizer::{point, Point, Rasterizer};

/// One decoration per modifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierGlyph {
    /// Chevron pointing down along the top edge.
    Shift,
    /// Chevron pointing up along the bottom edge.
    Alt,
    /// Sideways chevron pointing right.
    Ctrl,
}

impl ModifierGlyph {
    pub const ALL: [Self; 3] = [Self::Shift, Self::Alt, Self::Ctrl];

    /// Open polyline in unit-square coordinates (y grows downward).
    pub fn unit_path(self) -> [(f32, f32); 3] {
        match self {
            Self::Shift => [(0.0, 0.0), (0.5, 0.33), (1.0, 0.0)],
            Self::Alt => [(0.0, 1.0), (0.5, 0.66), (1.0, 1.0)],
            Self::Ctrl => [(0.0, 0.25), (1.0, 0.5), (0.0, 0.75)],
        }
    }
}

/// How a glyph is painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlyphPaint {
    /// Outline with the given width in unit-square units.
    Stroke(f32),
    /// Solid, closing the path.
    Fill,
}

/// Row-major coverage of `glyph` scaled to one `cell_w` x `cell_h` cell, in
/// a `width` x `height` raster. Geometry outside the raster is clipped.
pub fn coverage(
    glyph: ModifierGlyph,
    paint: GlyphPaint,
    cell_w: f32,
    cell_h: f32,
    width: u32,
    height: u32,
) -> Vec<f32> {
    let mut mask = vec![0.0; width as usize * height as usize];
    if width == 0 || height == 0 {
        return mask;
    }

    let path = glyph.unit_path().map(|(x, y)| point(x * cell_w, y * cell_h));
    let mut raster = Rasterizer::new(width as usize, height as usize);
    let clip = Clip { width: width as f32, height: height as f32 };

    match paint {
        GlyphPaint::Fill => clip.polygon(&mut raster, &path),
        GlyphPaint::Stroke(stroke) => {
            let half = (stroke * cell_w.min(cell_h) / 2.0).max(0.5);
            for segment in path.windows(2) {
                if let Some(quad) = segment_quad(segment[0], segment[1], half) {
                    clip.polygon(&mut raster, &quad);
                }
            }
        }
    }

    raster.for_each_pixel_2d(|x, y, alpha| {
        if let Some(slot) = mask.get_mut(y as usize * width as usize + x as usize) {
            *slot = alpha;
        }
    });
    mask
}

struct Clip {
    width: f32,
    height: f32,
}

impl Clip {
    fn point(&self, p: Point) -> Point {
        point(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    /// Closed polygon through `points`.
    fn polygon(&self, raster: &mut Rasterizer, points: &[Point]) {
        let Some(&last) = points.last() else {
            return;
        };
        let mut from = self.point(last);
        for &p in points {
            let to = self.point(p);
            raster.draw_line(from, to);
            from = to;
        }
    }
}

/// Rectangle of half-width `half` around the segment, wound consistently so
/// overlapping segments add up instead of cancelling.
fn segment_quad(a: Point, b: Point, half: f32) -> Option<[Point; 4]> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON {
        return None;
    }
    let (nx, ny) = (-dy / len * half, dx / len * half);
    Some([
        point(a.x + nx, a.y + ny),
        point(b.x + nx, b.y + ny),
        point(b.x - nx, b.y - ny),
        point(a.x - nx, a.y - ny),
    ])
}

#[cfg(test)]
#[path = "glyph_tests.rs"]
mod tests;
