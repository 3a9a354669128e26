//! Drawing primitives built purely on single-pixel writes.
//!
//! Positions are signed so shapes may extend past the panel edge; pixels that
//! land outside GRAM are dropped. Shape math runs in `i64` and only the part
//! of a shape that overlaps GRAM is walked.

use super::font::{GlyphTable, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::color::Color;
use crate::orientation::Orientation;
use crate::{Result, PANEL_HEIGHT, PANEL_WIDTH};

/// Half-length of each crosshair arm, and the gap left around its centre.
const CROSS_ARM: i64 = 15;
const CROSS_GAP: i64 = 2;

/// Last native GRAM column and row.
const MAX_X: i64 = PANEL_WIDTH as i64 - 1;
const MAX_Y: i64 = PANEL_HEIGHT as i64 - 1;

/// Anything that can take a pixel write in native coordinates.
pub trait PixelSink {
    /// Writes one pixel; out-of-range coordinates are a silent no-op.
    fn set_point(&mut self, x: u16, y: u16, color: Color) -> Result<()>;

    /// Orientation used for text and bitmap axis mapping.
    fn orientation(&self) -> Orientation;
}

/// Line, box, circle and text drawing for every [`PixelSink`].
pub trait Rasterizer: PixelSink {
    /// Plots a signed coordinate, clipping anything outside GRAM.
    fn plot(&mut self, x: i32, y: i32, color: Color) -> Result<()> {
        put(self, x.into(), y.into(), color)
    }

    /// Bresenham line, both endpoints inclusive.
    ///
    /// The axis with the larger absolute delta drives the loop; x drives on
    /// ties.
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) -> Result<()> {
        line(self, (x0.into(), y0.into()), (x1.into(), y1.into()), color)
    }

    /// Rectangle outline from (x0, y0) to (x1, y1), optionally filled strictly
    /// inside the border.
    fn draw_box(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        border: Color,
        fill: Option<Color>,
    ) -> Result<()> {
        self.draw_line(x0, y0, x1, y0, border)?;
        self.draw_line(x1, y0, x1, y1, border)?;
        self.draw_line(x0, y0, x0, y1, border)?;
        self.draw_line(x0, y1, x1, y1, border)?;

        if let Some(fill) = fill {
            let (x0, y0, x1, y1) = (i64::from(x0), i64::from(y0), i64::from(x1), i64::from(y1));
            for y in (y0 + 1).max(0)..y1.min(MAX_Y + 1) {
                line(self, (x0 + 1, y), (x1 - 1, y), fill)?;
            }
        }
        Ok(())
    }

    /// Midpoint circle outline.
    fn draw_circle(&mut self, xc: i32, yc: i32, r: u16, color: Color) -> Result<()> {
        let mut x = 0i32;
        let mut y = r as i32;
        let mut p = 1 - r as i32;

        while x < y {
            plot_octants(self, xc, yc, x, y, color)?;
            x += 1;
            if p < 0 {
                p += 2 * x + 1;
            } else {
                y -= 1;
                p += 2 * (x - y) + 1;
            }
            plot_octants(self, xc, yc, x, y, color)?;
        }
        Ok(())
    }

    /// Solid disk of `fill`, outlined with `border` when the colors differ.
    ///
    /// Scans the bounding square rather than tracing spans, so the disk has
    /// no gaps.
    fn draw_circle_fill(
        &mut self,
        xc: i32,
        yc: i32,
        r: u16,
        border: Color,
        fill: Color,
    ) -> Result<()> {
        let (cx, cy, rad) = (i64::from(xc), i64::from(yc), i64::from(r));
        for dy in (-rad).max(-cy)..rad.min(MAX_Y + 1 - cy) {
            for dx in (-rad).max(-cx)..rad.min(MAX_X + 1 - cx) {
                if in_disk(dx, dy, rad, true) {
                    put(self, cx + dx, cy + dy, fill)?;
                }
            }
        }
        if fill != border {
            self.draw_circle(xc, yc, r, border)?;
        }
        Ok(())
    }

    /// Calibration crosshair: four arms with a small gap at the centre.
    fn draw_cross(&mut self, x: i32, y: i32, color: Color) -> Result<()> {
        let (x, y) = (i64::from(x), i64::from(y));
        line(self, (x - CROSS_ARM, y), (x - CROSS_GAP, y), color)?;
        line(self, (x + CROSS_GAP, y), (x + CROSS_ARM, y), color)?;
        line(self, (x, y - CROSS_ARM), (x, y - CROSS_GAP), color)?;
        line(self, (x, y + CROSS_GAP), (x, y + CROSS_ARM), color)
    }

    /// 2x2 touch feedback marker.
    fn draw_touch_point(&mut self, x: i32, y: i32, color: Color) -> Result<()> {
        let (x, y) = (i64::from(x), i64::from(y));
        put(self, x, y, color)?;
        put(self, x + 1, y, color)?;
        put(self, x, y + 1, color)?;
        put(self, x + 1, y + 1, color)
    }

    /// Blits one 8x16 glyph, writing every cell as foreground or background.
    ///
    /// Portrait draws row `i` at `(x + col, y + i)`. Landscape swaps the axes
    /// and inverts one: `(y - i, x + col)`.
    fn put_char<G>(
        &mut self,
        glyphs: &G,
        x: i32,
        y: i32,
        ch: char,
        fg: Color,
        bg: Color,
    ) -> Result<()>
    where
        G: GlyphTable + ?Sized,
    {
        let Some(glyph) = glyphs.glyph(ch) else {
            return Ok(());
        };
        let portrait = self.orientation().is_portrait();
        let (x, y) = (i64::from(x), i64::from(y));
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                let color = if (bits >> (7 - col)) & 0x01 == 0x01 {
                    fg
                } else {
                    bg
                };
                let (row, col) = (row as i64, col as i64);
                if portrait {
                    put(self, x + col, y + row, color)?;
                } else {
                    put(self, y - row, x + col, color)?;
                }
            }
        }
        Ok(())
    }

    /// Draws a string, wrapping to the next line at the right edge and back
    /// to the origin at the bottom.
    fn draw_text<G>(
        &mut self,
        glyphs: &G,
        x: i32,
        y: i32,
        text: &str,
        fg: Color,
        bg: Color,
    ) -> Result<()>
    where
        G: GlyphTable + ?Sized,
    {
        let (width, height) = self.orientation().dimensions();
        let (max_x, max_y) = (
            width as i32 - GLYPH_WIDTH as i32,
            height as i32 - GLYPH_HEIGHT as i32,
        );
        let (mut x, mut y) = (x, y);
        for ch in text.chars() {
            self.put_char(glyphs, x, y, ch, fg, bg)?;
            if x < max_x {
                x += GLYPH_WIDTH as i32;
            } else if y < max_y {
                x = 0;
                y += GLYPH_HEIGHT as i32;
            } else {
                x = 0;
                y = 0;
            }
        }
        Ok(())
    }
}

impl<S: PixelSink + ?Sized> Rasterizer for S {}

/// Writes one pixel if it lands inside GRAM.
fn put<S: PixelSink + ?Sized>(sink: &mut S, x: i64, y: i64, color: Color) -> Result<()> {
    if (0..=MAX_X).contains(&x) && (0..=MAX_Y).contains(&y) {
        sink.set_point(x as u16, y as u16, color)
    } else {
        Ok(())
    }
}

/// Bresenham walk in closed form. After `k` major-axis steps the minor axis
/// has moved `(steps / 2 + k * |dminor|) / steps` times, which is exactly
/// where the error accumulator would have put it. Only the steps whose major
/// coordinate falls inside GRAM are visited.
fn line<S: PixelSink + ?Sized>(
    sink: &mut S,
    from: (i64, i64),
    to: (i64, i64),
    color: Color,
) -> Result<()> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let x_major = dx.abs() >= dy.abs();
    let (major0, minor0, dmajor, dminor, major_max) = if x_major {
        (from.0, from.1, dx, dy, MAX_X)
    } else {
        (from.1, from.0, dy, dx, MAX_Y)
    };
    let steps = dmajor.abs();
    let (smajor, sminor) = (dmajor.signum(), dminor.signum());

    let first = (if smajor < 0 { major0 - major_max } else { -major0 }).max(0);
    let last = (if smajor < 0 { major0 } else { major_max - major0 }).min(steps);

    for k in first..=last {
        let moved = match steps {
            0 => 0,
            _ => ((steps / 2) as i128 + k as i128 * dminor.abs() as i128) / steps as i128,
        };
        let major = major0 + smajor * k;
        let minor = minor0 + sminor * moved as i64;
        let (x, y) = if x_major { (major, minor) } else { (minor, major) };
        put(sink, x, y, color)?;
    }
    Ok(())
}

/// Mirrors one octant point around the centre.
fn plot_octants<S: PixelSink + ?Sized>(
    sink: &mut S,
    xc: i32,
    yc: i32,
    x: i32,
    y: i32,
    color: Color,
) -> Result<()> {
    let (xc, yc, x, y) = (i64::from(xc), i64::from(yc), i64::from(x), i64::from(y));
    for (px, py) in [
        (xc + x, yc + y),
        (xc - x, yc + y),
        (xc + x, yc - y),
        (xc - x, yc - y),
        (xc + y, yc + x),
        (xc - y, yc + x),
        (xc + y, yc - x),
        (xc - y, yc - x),
    ] {
        put(sink, px, py, color)?;
    }
    Ok(())
}

/// Disk membership by squared distance. The band between (r-1)^2 and r^2 is
/// the border ring; `solid` also admits everything inside it.
fn in_disk(dx: i64, dy: i64, r: i64, solid: bool) -> bool {
    let d = dx * dx + dy * dy;
    let (rsq_min, rsq_max) = ((r - 1) * (r - 1), r * r);
    let on_border = rsq_min < d && d <= rsq_max;
    on_border || (solid && d <= rsq_max)
}
