//! Segment data, colormap sampling and value normalization.

use wx_common::geo::relative_percentage;
use wx_common::{WxError, WxResult};

use crate::color::Rgba;
use crate::palette::PaletteEntry;

/// One gradient stop: at position `x` the channel arrives at `low` from the
/// left and leaves with `high` to the right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStop {
    pub x: f64,
    pub low: f64,
    pub high: f64,
}

impl SegmentStop {
    pub const fn new(x: f64, low: f64, high: f64) -> Self {
        Self { x, low, high }
    }
}

/// Per-channel stops, each sorted by `x` over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentData {
    pub red: Vec<SegmentStop>,
    pub green: Vec<SegmentStop>,
    pub blue: Vec<SegmentStop>,
    pub alpha: Vec<SegmentStop>,
}

impl SegmentData {
    /// Build segment data from palette entries.
    ///
    /// Boundaries are rescaled to `[0, 1]`. Between each adjacent pair the
    /// gradient runs from the lower entry's first color to its second color;
    /// a lower entry with a single color borrows the upper entry's first
    /// color, which makes the pair a continuous ramp.
    pub fn from_entries(entries: &[PaletteEntry]) -> WxResult<Self> {
        let mut sorted: Vec<&PaletteEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.bound.total_cmp(&b.bound));

        let (min_bound, max_bound) = match (sorted.first(), sorted.last()) {
            (Some(lo), Some(hi)) if lo.bound != hi.bound => (lo.bound, hi.bound),
            _ => return Err(WxError::invalid("color map requires more than one color")),
        };

        let mut data = SegmentData::default();
        for (i, pair) in sorted.windows(2).enumerate() {
            let (lo, hi) = (pair[0], pair[1]);
            let (Some(lo_first), Some(hi_first)) = (lo.colors.first(), hi.colors.first()) else {
                return Err(WxError::invalid(format!(
                    "empty colors between boundaries {} and {}",
                    lo.bound, hi.bound
                )));
            };
            let lo_second = lo.colors.get(1).unwrap_or(hi_first);

            let lo_frac = relative_percentage(lo.bound, min_bound, max_bound);
            let hi_frac = relative_percentage(hi.bound, min_bound, max_bound);
            let lo1 = lo_first.to_fractional();
            let lo2 = lo_second.to_fractional();
            let hi1 = hi_first.to_fractional();

            for (channel, stops) in data.channels_mut().into_iter().enumerate() {
                if i == 0 {
                    stops.push(SegmentStop::new(lo_frac, lo1[channel], lo1[channel]));
                }
                stops.push(SegmentStop::new(hi_frac, lo2[channel], hi1[channel]));
            }
        }

        for stops in data.channels_mut() {
            stops.sort_by(|a, b| a.x.total_cmp(&b.x));
        }
        Ok(data)
    }

    fn channels_mut(&mut self) -> [&mut Vec<SegmentStop>; 4] {
        [&mut self.red, &mut self.green, &mut self.blue, &mut self.alpha]
    }

    pub fn channels(&self) -> [&[SegmentStop]; 4] {
        [&self.red, &self.green, &self.blue, &self.alpha]
    }
}

/// Evaluate one channel at `x`. Outside `[0, 1]` the end values hold.
fn eval_channel(stops: &[SegmentStop], x: f64) -> f64 {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return 0.0;
    };
    if x <= first.x {
        return first.high;
    }
    if x >= last.x {
        return last.low;
    }
    // First stop strictly right of x.
    let idx = stops.partition_point(|s| s.x <= x);
    let left = &stops[idx - 1];
    let right = &stops[idx];
    let span = right.x - left.x;
    if span <= 0.0 {
        return right.high;
    }
    let t = (x - left.x) / span;
    left.high + t * (right.low - left.high)
}

/// Named piecewise-linear colormap.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    pub segments: SegmentData,
}

impl Colormap {
    pub fn new(name: impl Into<String>, segments: SegmentData) -> Self {
        Self { name: name.into(), segments }
    }

    /// Color at normalized position `f`; NaN is transparent.
    pub fn sample(&self, f: f64) -> Rgba {
        if f.is_nan() {
            return Rgba::transparent();
        }
        let [r, g, b, a] = self.segments.channels();
        Rgba::from_fractional([
            eval_channel(r, f),
            eval_channel(g, f),
            eval_channel(b, f),
            eval_channel(a, f),
        ])
    }

    /// Lookup table of `n` evenly spaced samples from 0 to 1.
    pub fn lut(&self, n: usize) -> Vec<[u8; 4]> {
        if n < 2 {
            return vec![self.sample(0.0).to_rgba8(); n];
        }
        (0..n)
            .map(|i| self.sample(i as f64 / (n - 1) as f64).to_rgba8())
            .collect()
    }
}

/// Linear normalization of data values onto `[0, 1]`, unclipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.vmax == self.vmin {
            return 0.0;
        }
        relative_percentage(value, self.vmin, self.vmax)
    }

    pub fn inverse(&self, frac: f64) -> f64 {
        self.vmin + frac * (self.vmax - self.vmin)
    }
}
