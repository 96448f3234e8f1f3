//! Scoped access to NetCDF files and OPeNDAP endpoints.
//!
//! A [`DatasetHandle`] owns the open `netcdf::File`; the underlying library
//! handle is closed when the handle is dropped.

use std::sync::Once;

use netcdf::AttributeValue;
use tracing::{debug, info};
use wx_common::{WxError, WxResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when a missing optional
/// attribute is handled on the Rust side. Safe to call repeatedly; only the
/// first call does anything.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

pub struct DatasetHandle {
    source: String,
    file: netcdf::File,
}

impl DatasetHandle {
    /// Open a local path or an OPeNDAP URL.
    pub fn open(source: &str) -> WxResult<Self> {
        silence_hdf5_errors();
        let file = netcdf::open(source)
            .map_err(|e| WxError::NetCdf(format!("Failed to open {}: {}", source, e)))?;
        info!(source = %source, "Opened dataset");
        Ok(Self {
            source: source.to_string(),
            file,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file(&self) -> &netcdf::File {
        &self.file
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    pub fn variable(&self, name: &str) -> WxResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| WxError::NetCdf(format!("{}: missing variable '{}'", self.source, name)))
    }

    fn global(&self, name: &str) -> WxResult<AttributeValue> {
        self.file
            .attribute(name)
            .ok_or_else(|| WxError::NetCdf(format!("{}: missing global attribute '{}'", self.source, name)))?
            .value()
            .map_err(|e| WxError::NetCdf(format!("{}: bad global attribute '{}': {}", self.source, name, e)))
    }

    pub fn global_str(&self, name: &str) -> WxResult<String> {
        value_str(self.global(name)?)
            .ok_or_else(|| WxError::NetCdf(format!("{}: global attribute '{}' is not text", self.source, name)))
    }

    pub fn global_f64(&self, name: &str) -> WxResult<f64> {
        value_f64s(self.global(name)?)
            .first()
            .copied()
            .ok_or_else(|| WxError::NetCdf(format!("{}: global attribute '{}' is not numeric", self.source, name)))
    }
}

impl Drop for DatasetHandle {
    fn drop(&mut self) {
        debug!(source = %self.source, "Closing dataset");
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn attr_value(var: &netcdf::Variable, name: &str) -> Option<AttributeValue> {
    if !has_attr(var, name) {
        return None;
    }
    var.attribute_value(name)?.ok()
}

pub fn attr_str(var: &netcdf::Variable, name: &str) -> Option<String> {
    attr_value(var, name).and_then(value_str)
}

pub fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    attr_f64s(var, name).first().copied()
}

pub fn attr_f64s(var: &netcdf::Variable, name: &str) -> Vec<f64> {
    attr_value(var, name).map(value_f64s).unwrap_or_default()
}

pub fn require_f64(var: &netcdf::Variable, name: &str) -> WxResult<f64> {
    attr_f64(var, name)
        .ok_or_else(|| WxError::NetCdf(format!("variable '{}' has no numeric '{}'", var.name(), name)))
}

fn value_str(value: AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(mut all) if !all.is_empty() => Some(all.swap_remove(0)),
        _ => None,
    }
}

fn value_f64s(value: AttributeValue) -> Vec<f64> {
    match value {
        AttributeValue::Double(v) => vec![v],
        AttributeValue::Doubles(v) => v,
        AttributeValue::Float(v) => vec![v as f64],
        AttributeValue::Floats(v) => v.into_iter().map(f64::from).collect(),
        AttributeValue::Schar(v) => vec![v as f64],
        AttributeValue::Uchar(v) => vec![v as f64],
        AttributeValue::Short(v) => vec![v as f64],
        AttributeValue::Ushort(v) => vec![v as f64],
        AttributeValue::Int(v) => vec![v as f64],
        AttributeValue::Uint(v) => vec![v as f64],
        AttributeValue::Longlong(v) => vec![v as f64],
        AttributeValue::Ulonglong(v) => vec![v as f64],
        AttributeValue::Shorts(v) => v.into_iter().map(f64::from).collect(),
        AttributeValue::Ints(v) => v.into_iter().map(f64::from).collect(),
        AttributeValue::Str(s) => s.trim().parse().map(|v| vec![v]).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// True for the CF `_Unsigned = "true"` convention on signed storage.
pub fn is_unsigned(var: &netcdf::Variable) -> bool {
    attr_str(var, "_Unsigned")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_netcdf_error() {
        let err = DatasetHandle::open("/nonexistent/path/scan.nc").err().unwrap();
        assert!(matches!(err, WxError::NetCdf(_)));
    }

    #[test]
    fn test_numeric_attribute_values() {
        assert_eq!(value_f64s(AttributeValue::Floats(vec![25.0, 35.0])), vec![25.0, 35.0]);
        assert_eq!(value_f64s(AttributeValue::Str("6371200".into())), vec![6_371_200.0]);
        assert!(value_f64s(AttributeValue::Str("n/a".into())).is_empty());
        assert_eq!(value_str(AttributeValue::Str("IR_WV".into())), Some("IR_WV".to_string()));
    }
}
