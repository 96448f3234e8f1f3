//! RGBA color as found in palette files.

pub const MAX_RGB_VALUE: f64 = 255.0;

/// 8-bit RGB channels with a fractional (0-1) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0.0)
    }

    /// Channels scaled onto `[0, 1]`, alpha unchanged.
    pub fn to_fractional(&self) -> [f64; 4] {
        [
            self.r as f64 / MAX_RGB_VALUE,
            self.g as f64 / MAX_RGB_VALUE,
            self.b as f64 / MAX_RGB_VALUE,
            self.a,
        ]
    }

    /// Build from fractional channels, clamping into range.
    pub fn from_fractional(channels: [f64; 4]) -> Self {
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * MAX_RGB_VALUE).round() as u8;
        Self {
            r: to_u8(channels[0]),
            g: to_u8(channels[1]),
            b: to_u8(channels[2]),
            a: channels[3].clamp(0.0, 1.0),
        }
    }

    /// Straight (non-premultiplied) 8-bit RGBA.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [self.r, self.g, self.b, (self.a.clamp(0.0, 1.0) * MAX_RGB_VALUE).round() as u8]
    }
}
