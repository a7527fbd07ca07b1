//! Renderer abstraction: the interactive canvas and the batch export issue
//! identical draw calls through the `Renderer` trait.
//!
//! Shape rasterization (rects, rotated rect sprites, lines, bitmap text,
//! image blits) lives in default trait methods over a per-backend
//! `blend_pixel`; `FramebufferRenderer` feeds the minifb window's u32
//! buffer, `CaptureRenderer` feeds an `image::RgbaImage` for export.

use image::RgbaImage;

use crate::geometry::{Rect, Vec2};

/// RGBA color, 0-255 per channel.
pub type Color = [u8; 4];

/// World-to-screen transform of the interactive view.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// World position at the top-left screen corner.
    pub position: Vec2,
    /// Screen pixels per world unit.
    pub scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: Vec2::ZERO,
            scale: 4.0,
        }
    }
}

impl Camera {
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.position) * self.scale
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen * (1.0 / self.scale) + self.position
    }

    /// Zoom by `factor`, keeping the world point under `screen_anchor`
    /// fixed on screen.
    pub fn zoom_around(&mut self, screen_anchor: Vec2, factor: f32) {
        let before = self.screen_to_world(screen_anchor);
        self.scale = (self.scale * factor).clamp(0.25, 64.0);
        let after = self.screen_to_world(screen_anchor);
        self.position = self.position + (before - after);
    }
}

/// Pixel-sink drawing interface shared by the window and export paths.
pub trait Renderer {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Alpha-blend one pixel; out-of-bounds and clipped-out pixels are
    /// silently dropped.
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color);

    fn clear(&mut self, color: Color);

    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);

    fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    fn screen_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.floor().max(0.0) as i32;
        let y0 = rect.y.floor().max(0.0) as i32;
        let x1 = rect.right().ceil().min(self.width() as f32) as i32;
        let y1 = rect.bottom().ceil().min(self.height() as f32) as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    fn draw_rect_outline(&mut self, rect: Rect, color: Color) {
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, 1.0), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - 1.0, rect.width, 1.0), color);
        self.fill_rect(Rect::new(rect.x, rect.y, 1.0, rect.height), color);
        self.fill_rect(Rect::new(rect.right() - 1.0, rect.y, 1.0, rect.height), color);
    }

    /// Oriented rectangle sprite: `size` extents centered on `center`,
    /// rotated by `angle` radians. Scans the bounding box and inverse-
    /// rotates each pixel into the sprite's local frame.
    fn fill_rotated_rect(&mut self, center: Vec2, size: Vec2, angle: f32, color: Color) {
        let radius = size.length() / 2.0 + 1.0;
        let x0 = (center.x - radius).floor().max(0.0) as i32;
        let y0 = (center.y - radius).floor().max(0.0) as i32;
        let x1 = (center.x + radius).ceil().min(self.width() as f32) as i32;
        let y1 = (center.y + radius).ceil().min(self.height() as f32) as i32;
        let half = size * 0.5;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let local = (p - center).rotated(-angle);
                if local.x.abs() <= half.x && local.y.abs() <= half.y {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    fn draw_line(&mut self, a: Vec2, b: Vec2, color: Color) {
        let delta = b - a;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0);
        for i in 0..=steps as i32 {
            let p = a.lerp(b, i as f32 / steps);
            self.blend_pixel(p.x.floor() as i32, p.y.floor() as i32, color);
        }
    }

    fn draw_image(&mut self, pos: Vec2, img: &RgbaImage) {
        let px = pos.x.round() as i32;
        let py = pos.y.round() as i32;
        for (x, y, pixel) in img.enumerate_pixels() {
            self.blend_pixel(px + x as i32, py + y as i32, pixel.0);
        }
    }

    /// Draw text with the built-in 5x7 bitmap font; `scale` is an integer
    /// pixel multiplier in practice but accepted as f32 for layout math.
    fn draw_text(&mut self, pos: Vec2, text: &str, color: Color, scale: f32) {
        let scale = scale.max(1.0) as i32;
        let mut cx = pos.x.round() as i32;
        let cy = pos.y.round() as i32;
        for ch in text.chars() {
            let glyph = glyph_columns(ch);
            for (col, bits) in glyph.iter().enumerate() {
                for row in 0..7 {
                    if bits & (1 << row) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.blend_pixel(
                                cx + col as i32 * scale + sx,
                                cy + row * scale + sy,
                                color,
                            );
                        }
                    }
                }
            }
            cx += (GLYPH_WIDTH as i32 + 1) * scale;
        }
    }
}

pub const GLYPH_WIDTH: usize = 5;
pub const GLYPH_HEIGHT: usize = 7;

/// Size of a rendered text run at `scale`.
pub fn measure_text(text: &str, scale: f32) -> Vec2 {
    let scale = scale.max(1.0);
    let count = text.chars().count() as f32;
    Vec2::new(
        (count * (GLYPH_WIDTH as f32 + 1.0) - 1.0).max(0.0) * scale,
        GLYPH_HEIGHT as f32 * scale,
    )
}

fn glyph_columns(ch: char) -> [u8; 5] {
    let index = ch as usize;
    if (0x20..=0x7E).contains(&index) {
        FONT_5X7[index - 0x20]
    } else {
        FONT_5X7[(b'?' - 0x20) as usize]
    }
}

/// Classic 5x7 ASCII font, one byte per column, bit 0 = top row.
const FONT_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x14, 0x08, 0x3E, 0x08, 0x14], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x07, 0x08, 0x70, 0x08, 0x07], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x10, 0x08, 0x08, 0x10, 0x08], // ~
];

fn clipped_out(clips: &[Rect], x: i32, y: i32) -> bool {
    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
    clips.iter().any(|c| !c.contains(p))
}

fn blend_channel(dst: u8, src: u8, alpha: u16) -> u8 {
    ((src as u16 * alpha + dst as u16 * (255 - alpha)) / 255) as u8
}

/// Renderer over the minifb window's `0x00RRGGBB` u32 buffer.
pub struct FramebufferRenderer {
    pub buffer: Vec<u32>,
    width: usize,
    height: usize,
    clips: Vec<Rect>,
}

impl FramebufferRenderer {
    pub fn new(width: usize, height: usize) -> FramebufferRenderer {
        FramebufferRenderer {
            buffer: vec![0; width * height],
            width,
            height,
            clips: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.buffer = vec![0; width * height];
        }
    }
}

impl Renderer for FramebufferRenderer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        if clipped_out(&self.clips, x, y) {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let dst = self.buffer[idx];
        let alpha = color[3] as u16;
        let r = blend_channel((dst >> 16) as u8, color[0], alpha);
        let g = blend_channel((dst >> 8) as u8, color[1], alpha);
        let b = blend_channel(dst as u8, color[2], alpha);
        self.buffer[idx] = (r as u32) << 16 | (g as u32) << 8 | b as u32;
    }

    fn clear(&mut self, color: Color) {
        let value = (color[0] as u32) << 16 | (color[1] as u32) << 8 | color[2] as u32;
        self.buffer.fill(value);
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clips.push(rect);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}

/// Renderer into an RGBA image, used by the export path.
pub struct CaptureRenderer {
    pub image: RgbaImage,
    clips: Vec<Rect>,
}

impl CaptureRenderer {
    pub fn new(width: u32, height: u32) -> CaptureRenderer {
        CaptureRenderer {
            image: RgbaImage::new(width, height),
            clips: Vec::new(),
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Renderer for CaptureRenderer {
    fn width(&self) -> usize {
        self.image.width() as usize
    }

    fn height(&self) -> usize {
        self.image.height() as usize
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return;
        }
        if clipped_out(&self.clips, x, y) {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let alpha = color[3] as u16;
        pixel.0 = [
            blend_channel(pixel.0[0], color[0], alpha),
            blend_channel(pixel.0[1], color[1], alpha),
            blend_channel(pixel.0[2], color[2], alpha),
            pixel.0[3].max(color[3]),
        ];
    }

    fn clear(&mut self, color: Color) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = color;
        }
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clips.push(rect);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}
