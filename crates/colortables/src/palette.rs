//! `.pal` palette file parsing.
//!
//! ```text
//! ; comment
//! Unit: C
//! Color:  50  31  31  31
//! Color4: 30   0   0   0   0
//! Color: -50   0   4 165   0 217 255
//! ```
//!
//! Each `Color` line carries a boundary followed by one color, or two colors
//! when the boundary is a discontinuity. `Color4` colors include an alpha
//! channel on a 0-255 scale.

use std::fs;
use std::path::Path;

use tracing::debug;
use wx_common::units::{self, Unit};
use wx_common::{WxError, WxResult};

use crate::color::{Rgba, MAX_RGB_VALUE};

/// One boundary and its color(s).
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub bound: f64,
    pub colors: Vec<Rgba>,
}

impl PaletteEntry {
    pub fn new(bound: f64, colors: Vec<Rgba>) -> Self {
        Self { bound, colors }
    }
}

/// Parsed palette: entries sorted by ascending boundary plus optional unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub entries: Vec<PaletteEntry>,
    pub unit: Option<Unit>,
}

impl Palette {
    /// Build from entries in any order. A repeated boundary keeps the last
    /// entry seen.
    pub fn from_entries(entries: impl IntoIterator<Item = PaletteEntry>, unit: Option<Unit>) -> Self {
        let mut sorted: Vec<PaletteEntry> = Vec::new();
        for entry in entries {
            match sorted.iter_mut().find(|e| e.bound == entry.bound) {
                Some(existing) => *existing = entry,
                None => sorted.push(entry),
            }
        }
        sorted.sort_by(|a, b| a.bound.total_cmp(&b.bound));
        Self { entries: sorted, unit }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> WxResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| WxError::Io(format!("Failed to read palette {:?}: {}", path.as_ref(), e)))?;
        let palette = Self::parse(&content)?;
        debug!(
            path = ?path.as_ref(),
            entries = palette.entries.len(),
            "Parsed palette file"
        );
        Ok(palette)
    }

    pub fn parse(content: &str) -> WxResult<Self> {
        let mut entries = Vec::new();
        let mut unit = None;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            match parse_line(line).map_err(|e| annotate(e, lineno + 1))? {
                Some(Directive::Color(entry)) => entries.push(entry),
                Some(Directive::Unit(u)) => unit = Some(u),
                None => {}
            }
        }

        Ok(Self::from_entries(entries, unit))
    }

    pub fn min_bound(&self) -> Option<f64> {
        self.entries.first().map(|e| e.bound)
    }

    pub fn max_bound(&self) -> Option<f64> {
        self.entries.last().map(|e| e.bound)
    }

    pub fn get(&self, bound: f64) -> Option<&[Rgba]> {
        self.entries
            .iter()
            .find(|e| e.bound == bound)
            .map(|e| e.colors.as_slice())
    }
}

enum Directive {
    Color(PaletteEntry),
    Unit(Unit),
}

fn annotate(err: WxError, lineno: usize) -> WxError {
    match err {
        WxError::InvalidValue(msg) => WxError::InvalidValue(format!("line {}: {}", lineno, msg)),
        other => other,
    }
}

fn parse_line(line: &str) -> WxResult<Option<Directive>> {
    let mut tokens = line.split_whitespace();
    let header = match tokens.next() {
        Some(h) => h.to_lowercase(),
        None => return Ok(None),
    };

    if header.contains("color") {
        let has_alpha = header.contains("color4");
        let data: Vec<&str> = tokens.collect();
        let Some((bound, values)) = data.split_first() else {
            return Ok(None);
        };
        let bound: f64 = bound
            .parse()
            .map_err(|_| WxError::invalid(format!("invalid boundary '{}'", bound)))?;
        return Ok(Some(Directive::Color(PaletteEntry::new(
            bound,
            parse_colors(values, has_alpha)?,
        ))));
    }

    if header.trim_end_matches(':') == "unit" || header.trim_end_matches(':') == "units" {
        let repr = tokens.collect::<Vec<_>>().join(" ");
        return Ok(Some(Directive::Unit(units::get(&repr)?)));
    }

    // Product:, Step:, ... carry nothing we use.
    Ok(None)
}

fn parse_colors(values: &[&str], has_alpha: bool) -> WxResult<Vec<Rgba>> {
    let width = if has_alpha { 4 } else { 3 };
    if values.len() < width {
        return Err(WxError::invalid(format!(
            "expected at least {} color values, found {}",
            width,
            values.len()
        )));
    }

    let mut colors = vec![parse_color(&values[..width], has_alpha)?];
    if values.len() >= 2 * width {
        colors.push(parse_color(&values[width..2 * width], has_alpha)?);
    }
    Ok(colors)
}

fn parse_color(values: &[&str], has_alpha: bool) -> WxResult<Rgba> {
    let channel = |s: &str| -> WxResult<u8> {
        s.parse::<u8>()
            .map_err(|_| WxError::invalid(format!("invalid color channel '{}'", s)))
    };
    let r = channel(values[0])?;
    let g = channel(values[1])?;
    let b = channel(values[2])?;
    if has_alpha {
        let a: f64 = values[3]
            .parse()
            .map_err(|_| WxError::invalid(format!("invalid alpha '{}'", values[3])))?;
        Ok(Rgba::rgba(r, g, b, a / MAX_RGB_VALUE))
    } else {
        Ok(Rgba::rgb(r, g, b))
    }
}
