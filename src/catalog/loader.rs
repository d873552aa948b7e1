// src/catalog/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::model::{Catalog, RawCatalog};
use crate::errors::Result;

/// Load a catalog file from a given path and return the raw `RawCatalog`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (orders, dependency direction, schemas). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawCatalog> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Deserialize a catalog from TOML text.
pub fn load_from_str(contents: &str) -> Result<RawCatalog> {
    let raw: RawCatalog = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a catalog file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks orders, references, dependency direction and every schema.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Catalog> {
    let raw = load_from_path(&path)?;
    let catalog = Catalog::try_from(raw)?;
    Ok(catalog)
}

/// Default catalog location: `Wayfinder.toml` in the current directory.
pub fn default_catalog_path() -> PathBuf {
    PathBuf::from("Wayfinder.toml")
}
