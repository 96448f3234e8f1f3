//! Lazy palette repository tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use colortables::{PaletteRepo, PaletteRepos};
use wx_common::units;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

#[test]
fn test_registration_does_not_load() {
    let mut repo = PaletteRepo::new("test", "/nonexistent");
    repo.register("test", "test.pal");
    assert!(!repo.is_loaded("test"));
    assert!(repo.palette_path("test").unwrap().ends_with("test.pal"));
}

#[test]
fn test_first_access_loads_and_memoizes() {
    let repo = PaletteRepos::new(data_dir());
    assert!(!repo.ir.is_loaded("navy"));

    let first = repo.ir.get("navy").unwrap();
    assert!(repo.ir.is_loaded("navy"));
    assert_eq!(first.name(), "navy_C");

    let second = repo.lookup("ir.navy").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_memoized_table_survives_file_removal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("WV_noaa.pal");
    fs::write(&path, "Unit: C\nColor: 0 0 0 0\nColor: -80 255 255 255\n").unwrap();

    let repos = PaletteRepos::new(dir.path());
    let table = repos.wv.get("noaa").unwrap();
    assert_eq!(table.unit(), units::CELSIUS);

    fs::remove_file(&path).unwrap();
    assert!(repos.wv.get("noaa").is_ok());
    assert!(repos.wv.get("accuwx").is_err());
}

#[test]
fn test_standard_groups() {
    let repos = PaletteRepos::new(data_dir());
    let ir: Vec<&str> = repos.ir.labels().collect();
    assert_eq!(ir, vec!["alpha", "cimms", "enh4", "navy", "rainbow"]);
    assert!(repos.group("velocity").is_some());
    assert!(repos.group("diff_reflectivity").is_some());
    assert!(repos.group("lightning").is_none());
}

#[test]
fn test_unknown_label_and_group() {
    let repos = PaletteRepos::new(data_dir());
    assert!(repos.lookup("vis.sepia").is_err());
    assert!(repos.lookup("sepia").is_err());
    assert!(repos.lookup("nope.default").is_err());
}
