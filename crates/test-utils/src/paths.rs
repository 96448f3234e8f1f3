//! Locating optional test data.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// `crates/<crate_name>/testdata/`
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root().join("crates").join(crate_name).join("testdata")
}

/// Palette directory shipped with the workspace.
pub fn palettes_dir() -> PathBuf {
    workspace_root().join("resources").join("palettes")
}

/// Look for `name` in `TEST_DATA_DIR`, the decoder's testdata directory and
/// the workspace `testdata/` directory.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(dir).join(name));
    }
    let root = workspace_root();
    candidates.push(crate_testdata_dir("netcdf-parser").join(name));
    candidates.push(root.join("testdata").join(name));

    candidates.into_iter().find(|p| p.exists())
}

pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}
