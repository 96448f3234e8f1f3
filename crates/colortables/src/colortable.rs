//! Colortable: palette entries + unit + colormap + normalization.

use std::path::Path;

use tracing::debug;
use wx_common::units::{self, Scale, Unit};
use wx_common::{WxError, WxResult};

use crate::color::Rgba;
use crate::colormap::{Colormap, Normalize, SegmentData};
use crate::palette::{Palette, PaletteEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct Colortable {
    basename: String,
    entries: Vec<PaletteEntry>,
    unit: Unit,
    cmap: Colormap,
    norm: Normalize,
}

impl Colortable {
    /// Build a colortable. Without a unit the boundaries are taken as a
    /// `Scale(min, max)` of themselves.
    pub fn new(basename: impl Into<String>, entries: Vec<PaletteEntry>, unit: Option<Unit>) -> WxResult<Self> {
        let basename = basename.into();
        let palette = Palette::from_entries(entries, None);
        let (vmin, vmax) = match (palette.min_bound(), palette.max_bound()) {
            (Some(lo), Some(hi)) if lo != hi => (lo, hi),
            _ => return Err(WxError::invalid("color map requires more than one color")),
        };
        let unit = match unit {
            Some(u) => u,
            None => Unit::Scale(Scale::new(vmin, vmax)?),
        };

        let segments = SegmentData::from_entries(&palette.entries)?;
        let name = format!("{}_{}", basename, unit.abbrev());
        Ok(Self {
            basename,
            entries: palette.entries,
            unit,
            cmap: Colormap::new(name, segments),
            norm: Normalize::new(vmin, vmax),
        })
    }

    pub fn from_palette(basename: impl Into<String>, palette: Palette) -> WxResult<Self> {
        Self::new(basename, palette.entries, palette.unit)
    }

    /// `<basename>_<unit abbreviation>`.
    pub fn name(&self) -> &str {
        &self.cmap.name
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn cmap(&self) -> &Colormap {
        &self.cmap
    }

    pub fn norm(&self) -> Normalize {
        self.norm
    }

    /// Same colors with every boundary expressed in `to`.
    pub fn convert(&self, to: &Unit) -> WxResult<Colortable> {
        if *to == self.unit {
            return Ok(self.clone());
        }
        let entries = self
            .entries
            .iter()
            .map(|e| Ok(PaletteEntry::new(self.unit.convert(e.bound, to)?, e.colors.clone())))
            .collect::<WxResult<Vec<_>>>()?;
        debug!(from = %self.unit, to = %to, name = %self.basename, "Converted colortable");
        Colortable::new(self.basename.clone(), entries, Some(*to))
    }

    /// [`convert`](Self::convert) with a unit looked up by abbreviation.
    pub fn convert_to(&self, unit: &str) -> WxResult<Colortable> {
        self.convert(&units::get(unit)?)
    }

    /// Color for a data value in this colortable's unit.
    pub fn color_for(&self, value: f64) -> Rgba {
        self.cmap.sample(self.norm.apply(value))
    }
}

/// Parse a palette file into a colortable named `name`.
pub fn load_colortable<P: AsRef<Path>>(name: &str, path: P) -> WxResult<Colortable> {
    let palette = Palette::from_file(path)?;
    Colortable::from_palette(name, palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<PaletteEntry> {
        vec![
            PaletteEntry::new(-40.0, vec![Rgba::rgb(0, 0, 0)]),
            PaletteEntry::new(0.0, vec![Rgba::rgb(255, 0, 0)]),
            PaletteEntry::new(40.0, vec![Rgba::rgb(255, 255, 255)]),
        ]
    }

    #[test]
    fn test_default_unit_is_scale_of_bounds() {
        let ct = Colortable::new("test", entries(), None).unwrap();
        assert_eq!(ct.unit(), Unit::scale(-40.0, 40.0).unwrap());
        assert_eq!(ct.name(), "test_-40-40");
    }

    #[test]
    fn test_name_uses_unit_abbreviation() {
        let ct = Colortable::new("ir", entries(), Some(units::CELSIUS)).unwrap();
        assert_eq!(ct.name(), "ir_C");
    }

    #[test]
    fn test_convert_to_same_unit_is_identity() {
        let ct = Colortable::new("ir", entries(), Some(units::CELSIUS)).unwrap();
        assert_eq!(ct.convert(&units::CELSIUS).unwrap(), ct);
    }

    #[test]
    fn test_convert_celsius_to_fahrenheit() {
        let ct = Colortable::new("ir", entries(), Some(units::CELSIUS)).unwrap();
        let f = ct.convert_to("F").unwrap();
        assert_eq!(f.name(), "ir_F");
        let bounds: Vec<f64> = f.entries().iter().map(|e| e.bound).collect();
        assert!((bounds[0] + 40.0).abs() < 1e-9);
        assert!((bounds[1] - 32.0).abs() < 1e-9);
        assert!((bounds[2] - 104.0).abs() < 1e-9);
        assert_eq!(f.color_for(32.0), Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn test_convert_across_dimensions_fails() {
        let ct = Colortable::new("ir", entries(), Some(units::CELSIUS)).unwrap();
        assert!(matches!(ct.convert(&units::KNOT), Err(WxError::Units(_))));
    }

    #[test]
    fn test_color_for_value() {
        let ct = Colortable::new("ir", entries(), Some(units::CELSIUS)).unwrap();
        assert_eq!(ct.color_for(-40.0), Rgba::rgb(0, 0, 0));
        assert_eq!(ct.color_for(0.0), Rgba::rgb(255, 0, 0));
        assert_eq!(ct.color_for(100.0), Rgba::rgb(255, 255, 255));
    }
}
