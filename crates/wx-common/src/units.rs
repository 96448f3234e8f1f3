//! Physical units and linear scales used by colortables and decoders.
//!
//! Named units carry a [`Dimension`] and are converted through a registry of
//! per-pair conversion functions. A [`Scale`] is a pseudo-unit describing an
//! arbitrary linear range (e.g. raw pixel counts `0-255`).

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{WxError, WxResult};

/// Physical dimension of a named unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Temperature,
    Speed,
    Distance,
    Angle,
    Reflectivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedUnit {
    Kelvin,
    Celsius,
    Fahrenheit,
    Knot,
    MeterPerSecond,
    Mile,
    Kilometer,
    Meter,
    Degree,
    Radian,
    Dbz,
}

impl NamedUnit {
    pub const ALL: [NamedUnit; 11] = [
        NamedUnit::Kelvin,
        NamedUnit::Celsius,
        NamedUnit::Fahrenheit,
        NamedUnit::Knot,
        NamedUnit::MeterPerSecond,
        NamedUnit::Mile,
        NamedUnit::Kilometer,
        NamedUnit::Meter,
        NamedUnit::Degree,
        NamedUnit::Radian,
        NamedUnit::Dbz,
    ];

    pub fn dimension(&self) -> Dimension {
        match self {
            NamedUnit::Kelvin | NamedUnit::Celsius | NamedUnit::Fahrenheit => Dimension::Temperature,
            NamedUnit::Knot | NamedUnit::MeterPerSecond => Dimension::Speed,
            NamedUnit::Mile | NamedUnit::Kilometer | NamedUnit::Meter => Dimension::Distance,
            NamedUnit::Degree | NamedUnit::Radian => Dimension::Angle,
            NamedUnit::Dbz => Dimension::Reflectivity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamedUnit::Kelvin => "Kelvin",
            NamedUnit::Celsius => "Celsius",
            NamedUnit::Fahrenheit => "Fahrenheit",
            NamedUnit::Knot => "Knot",
            NamedUnit::MeterPerSecond => "Meters per second",
            NamedUnit::Mile => "Mile",
            NamedUnit::Kilometer => "Kilometer",
            NamedUnit::Meter => "Meter",
            NamedUnit::Degree => "Degree",
            NamedUnit::Radian => "Radian",
            NamedUnit::Dbz => "Decibel relative to Z",
        }
    }

    /// Lookup keys; the first entry is the display abbreviation.
    pub fn abbreviations(&self) -> &'static [&'static str] {
        match self {
            NamedUnit::Kelvin => &["K", "kelvin"],
            NamedUnit::Celsius => &["C", "°C", "degC", "celsius"],
            NamedUnit::Fahrenheit => &["F", "°F", "degF", "fahrenheit"],
            NamedUnit::Knot => &["kt", "kts", "knot", "knots"],
            NamedUnit::MeterPerSecond => &[
                "m/s",
                "mps",
                "ms-1",
                "m s-1",
                "meter per second",
                "meters per second",
            ],
            NamedUnit::Mile => &["mi", "mile", "miles"],
            NamedUnit::Kilometer => &["km", "kilometer", "kilometers"],
            NamedUnit::Meter => &["m", "meter", "meters"],
            NamedUnit::Degree => &["deg", "°", "degree", "degrees"],
            NamedUnit::Radian => &["rad", "radian", "radians"],
            NamedUnit::Dbz => &["dBZ"],
        }
    }
}

/// Arbitrary linear range used as a pseudo-unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    lo: f64,
    hi: f64,
}

impl Scale {
    /// A scale needs two distinct bounds; `lo > hi` describes a reversed scale.
    pub fn new(lo: f64, hi: f64) -> WxResult<Self> {
        if lo == hi || !lo.is_finite() || !hi.is_finite() {
            return Err(WxError::invalid(format!(
                "scale bounds must be finite and distinct, got {} and {}",
                lo, hi
            )));
        }
        Ok(Self { lo, hi })
    }

    pub fn unity() -> Self {
        Self { lo: 0.0, hi: 1.0 }
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    pub fn reverse(&self) -> Self {
        Self { lo: self.hi, hi: self.lo }
    }

    /// Affine remap of `value` from this scale onto `other`; values outside
    /// the bounds extrapolate.
    pub fn remap(&self, value: f64, other: &Scale) -> f64 {
        let frac = (value - self.lo) / (self.hi - self.lo);
        other.lo + frac * (other.hi - other.lo)
    }

    pub fn abbrev(&self) -> String {
        format!("{}-{}", self.lo, self.hi)
    }
}

/// A unit of measure: a named physical unit or a linear scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unit {
    Named(NamedUnit),
    Scale(Scale),
}

pub const KELVIN: Unit = Unit::Named(NamedUnit::Kelvin);
pub const CELSIUS: Unit = Unit::Named(NamedUnit::Celsius);
pub const FAHRENHEIT: Unit = Unit::Named(NamedUnit::Fahrenheit);
pub const KNOT: Unit = Unit::Named(NamedUnit::Knot);
pub const METER_PER_SECOND: Unit = Unit::Named(NamedUnit::MeterPerSecond);
pub const MILE: Unit = Unit::Named(NamedUnit::Mile);
pub const KILOMETER: Unit = Unit::Named(NamedUnit::Kilometer);
pub const METER: Unit = Unit::Named(NamedUnit::Meter);
pub const DEGREE: Unit = Unit::Named(NamedUnit::Degree);
pub const RADIAN: Unit = Unit::Named(NamedUnit::Radian);
pub const DBZ: Unit = Unit::Named(NamedUnit::Dbz);

const MPS_PER_KNOT: f64 = 0.514_444;
const KM_PER_MILE: f64 = 1.609_344;

type Conversion = fn(f64) -> f64;

static CONVERSIONS: Lazy<HashMap<(NamedUnit, NamedUnit), Conversion>> = Lazy::new(|| {
    use NamedUnit::*;

    let mut table: HashMap<(NamedUnit, NamedUnit), Conversion> = HashMap::new();
    table.insert((Kelvin, Celsius), |v| v - 273.15);
    table.insert((Celsius, Kelvin), |v| v + 273.15);
    table.insert((Kelvin, Fahrenheit), |v| (v - 273.15) * 1.8 + 32.0);
    table.insert((Fahrenheit, Kelvin), |v| (v - 32.0) / 1.8 + 273.15);
    table.insert((Celsius, Fahrenheit), |v| v * 1.8 + 32.0);
    table.insert((Fahrenheit, Celsius), |v| (v - 32.0) / 1.8);

    table.insert((Knot, MeterPerSecond), |v| v * MPS_PER_KNOT);
    table.insert((MeterPerSecond, Knot), |v| v / MPS_PER_KNOT);

    table.insert((Mile, Kilometer), |v| v * KM_PER_MILE);
    table.insert((Kilometer, Mile), |v| v / KM_PER_MILE);
    table.insert((Mile, Meter), |v| v * KM_PER_MILE * 1000.0);
    table.insert((Meter, Mile), |v| v / (KM_PER_MILE * 1000.0));
    table.insert((Kilometer, Meter), |v| v * 1000.0);
    table.insert((Meter, Kilometer), |v| v / 1000.0);

    table.insert((Degree, Radian), f64::to_radians);
    table.insert((Radian, Degree), f64::to_degrees);
    table
});

static ABBREVIATIONS: Lazy<HashMap<String, NamedUnit>> = Lazy::new(|| {
    NamedUnit::ALL
        .iter()
        .flat_map(|unit| {
            unit.abbreviations()
                .iter()
                .map(move |abbrev| (abbrev.to_lowercase(), *unit))
        })
        .collect()
});

impl Unit {
    pub fn scale(lo: f64, hi: f64) -> WxResult<Self> {
        Ok(Unit::Scale(Scale::new(lo, hi)?))
    }

    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Unit::Named(named) => Some(named.dimension()),
            Unit::Scale(_) => None,
        }
    }

    /// Display abbreviation (`K`, `kt`, `0-255` ...).
    pub fn abbrev(&self) -> String {
        match self {
            Unit::Named(named) => named.abbreviations()[0].to_string(),
            Unit::Scale(scale) => scale.abbrev(),
        }
    }

    /// Convert `value`, expressed in this unit, into `to`.
    pub fn convert(&self, value: f64, to: &Unit) -> WxResult<f64> {
        match (self, to) {
            (Unit::Scale(from), Unit::Scale(to)) => Ok(from.remap(value, to)),
            (Unit::Named(from), Unit::Named(to)) if from == to => Ok(value),
            (Unit::Named(from), Unit::Named(to)) => CONVERSIONS
                .get(&(*from, *to))
                .map(|f| f(value))
                .ok_or_else(|| {
                    WxError::Units(format!(
                        "Conversion from {} to {} not registered",
                        from.name(),
                        to.name()
                    ))
                }),
            _ => Err(WxError::Units(format!(
                "Conversion between {} and {} is not possible",
                self, to
            ))),
        }
    }

    /// Convert every value of a slice, failing on the first unsupported pair.
    pub fn convert_all(&self, values: &[f64], to: &Unit) -> WxResult<Vec<f64>> {
        values.iter().map(|v| self.convert(*v, to)).collect()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Named(named) => write!(f, "{}", named.name()),
            Unit::Scale(scale) => write!(f, "Scale({})", scale.abbrev()),
        }
    }
}

impl From<NamedUnit> for Unit {
    fn from(unit: NamedUnit) -> Self {
        Unit::Named(unit)
    }
}

impl From<Scale> for Unit {
    fn from(scale: Scale) -> Self {
        Unit::Scale(scale)
    }
}

/// Resolve a unit from its abbreviation or name (case-insensitive).
///
/// A bare number `n` resolves to `Scale(0, n)`.
pub fn get(repr: &str) -> WxResult<Unit> {
    let key = repr.trim().to_lowercase();
    if let Some(unit) = ABBREVIATIONS.get(&key) {
        return Ok(Unit::Named(*unit));
    }
    if let Ok(hi) = key.parse::<f64>() {
        return Unit::scale(0.0, hi);
    }
    Err(WxError::Units(format!("unit not found: '{}'", repr)))
}

/// Convenience wrapper: convert `value` from `from` into `to`.
pub fn convert(value: f64, from: &Unit, to: &Unit) -> WxResult<f64> {
    from.convert(value, to)
}
