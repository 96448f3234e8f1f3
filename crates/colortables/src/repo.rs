//! Named colortable repositories loaded lazily from a palette directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;
use wx_common::{WxError, WxResult};

use crate::colortable::{load_colortable, Colortable};

#[derive(Debug)]
struct RepoEntry {
    file: String,
    loaded: OnceCell<Arc<Colortable>>,
}

/// Group of colortables registered by label and palette file name.
///
/// Nothing is read from disk until a label is first requested; the parsed
/// colortable is then kept for later lookups.
#[derive(Debug)]
pub struct PaletteRepo {
    name: String,
    palettes_dir: PathBuf,
    entries: BTreeMap<String, RepoEntry>,
}

impl PaletteRepo {
    pub fn new(name: impl Into<String>, palettes_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            palettes_dir: palettes_dir.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Register `label` -> palette file. Re-registering a label replaces it.
    pub fn register(&mut self, label: impl Into<String>, file: impl Into<String>) -> &mut Self {
        self.entries.insert(
            label.into(),
            RepoEntry {
                file: file.into(),
                loaded: OnceCell::new(),
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn palette_path(&self, label: &str) -> Option<PathBuf> {
        self.entries.get(label).map(|e| self.palettes_dir.join(&e.file))
    }

    pub fn is_loaded(&self, label: &str) -> bool {
        self.entries
            .get(label)
            .map(|e| e.loaded.get().is_some())
            .unwrap_or(false)
    }

    pub fn get(&self, label: &str) -> WxResult<Arc<Colortable>> {
        let entry = self.entries.get(label).ok_or_else(|| {
            WxError::invalid(format!("no colortable '{}' in repository '{}'", label, self.name))
        })?;
        let table = entry.loaded.get_or_try_init(|| {
            let path = self.palettes_dir.join(&entry.file);
            info!(repo = %self.name, label = %label, path = ?path, "Loading colortable");
            load_colortable(label, &path).map(Arc::new)
        })?;
        Ok(Arc::clone(table))
    }
}

/// The standard palette groups.
#[derive(Debug)]
pub struct PaletteRepos {
    pub ir: PaletteRepo,
    pub vis: PaletteRepo,
    pub wv: PaletteRepo,
    pub reflectivity: PaletteRepo,
    pub velocity: PaletteRepo,
    pub diff_reflectivity: PaletteRepo,
}

impl PaletteRepos {
    pub fn new<P: AsRef<Path>>(palettes_dir: P) -> Self {
        let dir = palettes_dir.as_ref();

        let mut ir = PaletteRepo::new("ir", dir);
        ir.register("navy", "IR_navy.pal")
            .register("rainbow", "IR_rainbow.pal")
            .register("enh4", "IR4.pal")
            .register("cimms", "IR_cimms2.pal")
            .register("alpha", "IR_alpha.pal");

        let mut vis = PaletteRepo::new("vis", dir);
        vis.register("default", "Visible-depth.pal")
            .register("optimized", "Visible-depth-modified.pal")
            .register("transparent", "Visible-trans.pal");

        let mut wv = PaletteRepo::new("wv", dir);
        wv.register("accuwx", "WV3_accuwx.pal").register("noaa", "WV_noaa.pal");

        let mut reflectivity = PaletteRepo::new("reflectivity", dir);
        reflectivity
            .register("avl", "refl_avl.pal")
            .register("nws_default", "NWS_Default.pal")
            .register("radarscope", "RadarScope.pal");

        let mut velocity = PaletteRepo::new("velocity", dir);
        velocity.register("default", "Enhanced-Velocity.pal");

        let mut diff_reflectivity = PaletteRepo::new("diff_reflectivity", dir);
        diff_reflectivity.register("default", "AWIPS-ZDR.pal");

        Self {
            ir,
            vis,
            wv,
            reflectivity,
            velocity,
            diff_reflectivity,
        }
    }

    pub fn group(&self, name: &str) -> Option<&PaletteRepo> {
        match name {
            "ir" => Some(&self.ir),
            "vis" => Some(&self.vis),
            "wv" => Some(&self.wv),
            "reflectivity" => Some(&self.reflectivity),
            "velocity" => Some(&self.velocity),
            "diff_reflectivity" => Some(&self.diff_reflectivity),
            _ => None,
        }
    }

    /// Resolve `group.label`, e.g. `ir.navy`.
    pub fn lookup(&self, qualified: &str) -> WxResult<Arc<Colortable>> {
        let (group, label) = qualified
            .split_once('.')
            .ok_or_else(|| WxError::invalid(format!("expected <group>.<label>, got '{}'", qualified)))?;
        self.group(group)
            .ok_or_else(|| WxError::invalid(format!("unknown palette group '{}'", group)))?
            .get(label)
    }
}
