// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cursor rendering with pending modifier state drawn over the cell.
//!
//! [`CursorCompositor::render`] is a pure function of its inputs: it reads the
//! base raster, never writes it, and keeps nothing between calls.

pub mod glyph;

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use anyhow::Context;
use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use self::glyph::{GlyphPaint, ModifierGlyph};

pub const CTRL_ON: u32 = 0x01;
pub const CTRL_LOCK: u32 = 0x02;
pub const ALT_ON: u32 = 0x04;
pub const ALT_LOCK: u32 = 0x08;
pub const SHIFT_ON: u32 = 0x10;
pub const SHIFT_LOCK: u32 = 0x20;

/// Largest flat-fill edge, in pixels. Bigger cells come back empty.
pub const MAX_FALLBACK_EDGE: u32 = 4096;

/// Snapshot of the key handler's sticky modifiers.
///
/// "On" means armed for the next key only; "lock" means latched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierState {
    pub shift_on: bool,
    pub shift_lock: bool,
    pub alt_on: bool,
    pub alt_lock: bool,
    pub ctrl_on: bool,
    pub ctrl_lock: bool,
}

impl ModifierState {
    /// Decode the key handler's meta-state bitmask. Unknown bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            shift_on: bits & SHIFT_ON != 0,
            shift_lock: bits & SHIFT_LOCK != 0,
            alt_on: bits & ALT_ON != 0,
            alt_lock: bits & ALT_LOCK != 0,
            ctrl_on: bits & CTRL_ON != 0,
            ctrl_lock: bits & CTRL_LOCK != 0,
        }
    }

    pub fn bits(&self) -> u32 {
        [
            (self.ctrl_on, CTRL_ON),
            (self.ctrl_lock, CTRL_LOCK),
            (self.alt_on, ALT_ON),
            (self.alt_lock, ALT_LOCK),
            (self.shift_on, SHIFT_ON),
            (self.shift_lock, SHIFT_LOCK),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, bit)| acc | bit)
    }

    pub fn is_empty(&self) -> bool {
        self.bits() == 0
    }

    /// "On" wins over "lock" within a family.
    fn paint_for(&self, glyph: ModifierGlyph, stroke: f32) -> Option<GlyphPaint> {
        let (on, lock) = match glyph {
            ModifierGlyph::Shift => (self.shift_on, self.shift_lock),
            ModifierGlyph::Alt => (self.alt_on, self.alt_lock),
            ModifierGlyph::Ctrl => (self.ctrl_on, self.ctrl_lock),
        };
        if on {
            Some(GlyphPaint::Stroke(stroke))
        } else if lock {
            Some(GlyphPaint::Fill)
        } else {
            None
        }
    }
}

/// Where the cursor sits, read fresh from the screen buffer per paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorGeometry {
    pub column: u32,
    pub row: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub double_width: bool,
}

impl CursorGeometry {
    fn width(&self) -> u64 {
        u64::from(self.cell_width) * if self.double_width { 2 } else { 1 }
    }
}

/// Colors and stroke used by the compositor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorStyle {
    /// Flat fill used when the cell cannot be read from the base raster.
    pub highlight: Rgba<u8>,
    /// Modifier glyphs and the dead-key character.
    pub decoration: Rgba<u8>,
    /// Outline width for "on" modifiers, in unit-square units.
    pub stroke_width: f32,
}

impl Default for CursorStyle {
    fn default() -> Self {
        Self {
            highlight: Rgba([229, 229, 229, 255]),
            decoration: Rgba([255, 176, 0, 255]),
            stroke_width: 0.1,
        }
    }
}

/// The decorated cursor block and where it goes on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorRegion {
    pub x: u32,
    pub y: u32,
    pub image: RgbaImage,
    /// The block is the flat highlight rather than the inverted cell.
    pub fallback: bool,
}

#[derive(Clone, Default)]
pub struct CursorCompositor {
    style: CursorStyle,
    font: Option<FontArc>,
}

impl std::fmt::Debug for CursorCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCompositor")
            .field("style", &self.style)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl CursorCompositor {
    pub fn new(style: CursorStyle) -> Self {
        Self { style, font: None }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn style(&self) -> &CursorStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: CursorStyle) {
        self.style = style;
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Load the font used for the pending dead-key character.
    pub fn load_font(&mut self, path: &Path) -> anyhow::Result<()> {
        let data =
            std::fs::read(path).with_context(|| format!("read font {}", path.display()))?;
        self.set_font_bytes(data)?;
        debug!("cursor: loaded font {}", path.display());
        Ok(())
    }

    pub fn set_font_bytes(&mut self, data: Vec<u8>) -> anyhow::Result<()> {
        let font = FontArc::try_from_vec(data).context("parse font")?;
        self.font = Some(font);
        Ok(())
    }

    /// Render the cursor block for `geometry` over `base`.
    pub fn render(
        &self,
        base: &RgbaImage,
        geometry: &CursorGeometry,
        modifiers: ModifierState,
        dead_key: Option<char>,
    ) -> CursorRegion {
        let x = u64::from(geometry.column) * u64::from(geometry.cell_width);
        let y = u64::from(geometry.row) * u64::from(geometry.cell_height);
        let width = geometry.width();
        let height = u64::from(geometry.cell_height);

        let in_bounds = x.saturating_add(width) <= u64::from(base.width())
            && y.saturating_add(height) <= u64::from(base.height());

        let (mut image, fallback) = match (in_bounds, u32::try_from(width)) {
            // In bounds implies every coordinate fits in u32.
            (true, Ok(w)) => {
                let mut block =
                    imageops::crop_imm(base, x as u32, y as u32, w, geometry.cell_height)
                        .to_image();
                imageops::invert(&mut block);
                (block, false)
            }
            (_, Ok(w)) if w <= MAX_FALLBACK_EDGE && geometry.cell_height <= MAX_FALLBACK_EDGE => {
                trace!("cursor: cell at {},{} outside raster, flat fill", geometry.column, geometry.row);
                (RgbaImage::from_pixel(w, geometry.cell_height, self.style.highlight), true)
            }
            _ => {
                warn!("cursor: {width}x{height} cell too large to draw, skipping");
                (RgbaImage::new(0, 0), true)
            }
        };
        if image.width() == 0 || image.height() == 0 {
            return CursorRegion { x: saturate(x), y: saturate(y), image, fallback };
        }

        if let Some(ch) = dead_key {
            self.draw_dead_key(&mut image, ch, geometry.cell_height as f32);
        }

        let (cell_w, cell_h) = (geometry.cell_width as f32, geometry.cell_height as f32);
        for glyph in ModifierGlyph::ALL {
            let Some(paint) = modifiers.paint_for(glyph, self.style.stroke_width) else {
                continue;
            };
            let mask =
                glyph::coverage(glyph, paint, cell_w, cell_h, image.width(), image.height());
            for (pixel, coverage) in image.pixels_mut().zip(mask) {
                blend(pixel, self.style.decoration, coverage);
            }
        }

        CursorRegion { x: saturate(x), y: saturate(y), image, fallback }
    }

    /// Draw `ch` with its top-left at the cell origin, one cell high.
    fn draw_dead_key(&self, image: &mut RgbaImage, ch: char, cell_h: f32) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(cell_h);
        let ascent = font.as_scaled(scale).ascent();
        let glyph = font.glyph_id(ch).with_scale_and_position(scale, ab_glyph::point(0.0, ascent));
        let Some(outlined) = font.outline_glyph(glyph) else {
            trace!("cursor: no outline for dead key {ch:?}");
            return;
        };

        let bounds = outlined.px_bounds();
        let (left, top) = (bounds.min.x.floor() as i64, bounds.min.y.floor() as i64);
        let decoration = self.style.decoration;
        outlined.draw(|gx, gy, coverage| {
            let (px, py) = (left + i64::from(gx), top + i64::from(gy));
            let (Ok(px), Ok(py)) = (u32::try_from(px), u32::try_from(py)) else {
                return;
            };
            if let Some(pixel) = image.get_pixel_mut_checked(px, py) {
                blend(pixel, decoration, coverage);
            }
        });
    }
}

fn saturate(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Source-over blend of `color` at `coverage`; the destination alpha is kept.
fn blend(pixel: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    if coverage <= 0.0 {
        return;
    }
    let a = (coverage.min(1.0) * f32::from(color[3])).round() as u16;
    let inv = 255 - a;
    for c in 0..3 {
        pixel[c] = ((u16::from(color[c]) * a + u16::from(pixel[c]) * inv) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "compositor_tests.rs"]
mod tests;
