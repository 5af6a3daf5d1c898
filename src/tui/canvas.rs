//! Half-block terminal canvas
//!
//! Every terminal cell shows two vertically stacked pixels using the upper
//! half block glyph: foreground paints the top pixel, background the bottom.
//! The logical playfield is scaled uniformly into the pixel grid and centered.

use std::io::Write;

use crossterm::{
    cursor, queue,
    style::{self, Attribute, Color as TermColor},
};

use crate::assets::Sprite;
use crate::game::render::{Align, Color, DisplayError, RenderTarget, Surface, TextStyle};

const LETTERBOX: Color = Color(0, 0, 0);

fn term_color(c: Color) -> TermColor {
    TermColor::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

/// Mapping from logical playfield units to terminal pixels and cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    scale: f32,
    off_x: f32,
    off_y: f32,
}

impl Viewport {
    pub fn fit(cols: u16, rows: u16, logical_w: f32, logical_h: f32) -> Self {
        let (pw, ph) = (cols as f32, rows as f32 * 2.0);
        let scale = (pw / logical_w).min(ph / logical_h).max(f32::EPSILON);
        Self {
            cols,
            rows,
            scale,
            off_x: (pw - logical_w * scale) / 2.0,
            off_y: (ph - logical_h * scale) / 2.0,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixel_size(&self) -> (usize, usize) {
        (self.cols as usize, self.rows as usize * 2)
    }

    pub fn to_pixel(&self, x: f32, y: f32) -> (f32, f32) {
        (self.off_x + x * self.scale, self.off_y + y * self.scale)
    }

    /// Logical x under the middle of a terminal column
    pub fn logical_x(&self, col: u16) -> f32 {
        (col as f32 + 0.5 - self.off_x) / self.scale
    }

    /// Terminal cell holding a logical point
    pub fn cell(&self, x: f32, y: f32) -> (i32, i32) {
        let (px, py) = self.to_pixel(x, y);
        (px.floor() as i32, (py / 2.0).floor() as i32)
    }
}

/// Pixel grid, two pixels per terminal row
pub struct PixelBuf {
    w: usize,
    h: usize,
    px: Vec<Color>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![LETTERBOX; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, LETTERBOX);
    }

    pub fn fill(&mut self, c: Color) {
        self.px.iter_mut().for_each(|p| *p = c);
    }

    pub fn set(&mut self, x: i32, y: i32, c: Color) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        self.px.get(y * self.w + x).copied().unwrap_or(LETTERBOX)
    }

    /// Write the grid starting at the top-left cell
    pub fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev: Option<(Color, Color)> = None;

        for row in 0..rows {
            queue!(out, cursor::MoveTo(0, row as u16))?;
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if prev != Some((top, bot)) {
                    queue!(
                        out,
                        style::SetForegroundColor(term_color(top)),
                        style::SetBackgroundColor(term_color(bot))
                    )?;
                    prev = Some((top, bot));
                }
                if top == bot {
                    queue!(out, style::Print(' '))?;
                } else {
                    queue!(out, style::Print('\u{2580}'))?;
                }
            }
        }
        queue!(out, style::ResetColor)
    }
}

struct TextRun {
    col: i32,
    row: i32,
    text: String,
    color: Color,
    bold: bool,
}

/// Terminal render target for the logical playfield
pub struct TerminalCanvas<W: Write> {
    out: W,
    logical: (f32, f32),
    viewport: Viewport,
    pixels: PixelBuf,
    texts: Vec<TextRun>,
}

impl<W: Write> TerminalCanvas<W> {
    pub fn new(out: W, cols: u16, rows: u16, logical_w: f32, logical_h: f32) -> Self {
        let viewport = Viewport::fit(cols, rows, logical_w, logical_h);
        let (w, h) = viewport.pixel_size();
        Self {
            out,
            logical: (logical_w, logical_h),
            viewport,
            pixels: PixelBuf::new(w, h),
            texts: Vec::new(),
        }
    }
}

impl<W: Write> Surface for TerminalCanvas<W> {
    fn clear(&mut self, color: Color) {
        self.pixels.fill(LETTERBOX);
        let (w, h) = self.logical;
        self.fill_rect(0.0, 0.0, w, h, color);
        self.texts.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, y0) = self.viewport.to_pixel(x, y);
        let (x1, y1) = self.viewport.to_pixel(x + w, y + h);
        for py in y0.round() as i32..y1.round() as i32 {
            for px in x0.round() as i32..x1.round() as i32 {
                self.pixels.set(px, py, color);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let (pcx, pcy) = self.viewport.to_pixel(cx, cy);
        let r = radius * self.viewport.scale();
        for py in (pcy - r).floor() as i32..=(pcy + r).ceil() as i32 {
            for px in (pcx - r).floor() as i32..=(pcx + r).ceil() as i32 {
                let dx = px as f32 + 0.5 - pcx;
                let dy = py as f32 + 0.5 - pcy;
                if dx * dx + dy * dy <= r * r {
                    self.pixels.set(px, py, color);
                }
            }
        }
    }

    fn draw_sprite(&mut self, sprite: &Sprite, cx: f32, cy: f32, w: f32, h: f32, angle_deg: f32) {
        let (pcx, pcy) = self.viewport.to_pixel(cx, cy);
        let (pw, ph) = (w * self.viewport.scale(), h * self.viewport.scale());
        if pw <= 0.0 || ph <= 0.0 {
            return;
        }
        let reach = (pw * pw + ph * ph).sqrt() / 2.0;
        let (sin, cos) = angle_deg.to_radians().sin_cos();

        for py in (pcy - reach).floor() as i32..=(pcy + reach).ceil() as i32 {
            for px in (pcx - reach).floor() as i32..=(pcx + reach).ceil() as i32 {
                let dx = px as f32 + 0.5 - pcx;
                let dy = py as f32 + 0.5 - pcy;
                // Undo the clockwise rotation
                let lx = dx * cos + dy * sin;
                let ly = -dx * sin + dy * cos;
                if let Some(c) = sprite.sample(lx / pw + 0.5, ly / ph + 0.5) {
                    self.pixels.set(px, py, c);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        let (col, row) = self.viewport.cell(x, y);
        let len = text.chars().count() as i32;
        let col = match style.align {
            Align::Left => col,
            Align::Center => col - len / 2,
        };
        self.texts.push(TextRun {
            col,
            row,
            text: text.to_string(),
            color: style.color,
            bold: style.outline.is_some() || style.size >= 24.0,
        });
    }
}

impl<W: Write> RenderTarget for TerminalCanvas<W> {
    fn present(&mut self) -> Result<(), DisplayError> {
        self.pixels.render(&mut self.out)?;

        let (cols, rows) = (self.viewport.cols as i32, self.viewport.rows as i32);
        for run in &self.texts {
            if run.row < 0 || run.row >= rows {
                continue;
            }
            // Clip to the screen
            let skip = (-run.col).max(0) as usize;
            let start = run.col.max(0);
            let visible: String = run
                .text
                .chars()
                .skip(skip)
                .take((cols - start).max(0) as usize)
                .collect();
            if visible.is_empty() {
                continue;
            }

            let under = self.pixels.get(start as usize, run.row as usize * 2 + 1);
            queue!(
                self.out,
                cursor::MoveTo(start as u16, run.row as u16),
                style::SetForegroundColor(term_color(run.color)),
                style::SetBackgroundColor(term_color(under))
            )?;
            if run.bold {
                queue!(self.out, style::SetAttribute(Attribute::Bold))?;
            }
            queue!(
                self.out,
                style::Print(visible),
                style::SetAttribute(Attribute::Reset)
            )?;
        }

        queue!(self.out, style::ResetColor)?;
        self.out.flush()?;
        Ok(())
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.viewport = Viewport::fit(cols, rows, self.logical.0, self.logical.1);
        let (w, h) = self.viewport.pixel_size();
        self.pixels.resize(w, h);
    }
}
