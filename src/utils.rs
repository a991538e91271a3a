//! Utility functions for destination paths and file naming

use crate::error::{Error, Result};
use crate::types::Asset;
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory
///
/// Paths that don't start with `~`, or a `~user` form, are returned unchanged.
/// If no home directory is known the path is also returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Resolve a destination directory to an absolute path
///
/// Expands `~` and joins relative paths onto the current directory. The path is not
/// required to exist.
///
/// # Examples
///
/// ```
/// use imagegen_dl::utils::resolve_destination;
/// use std::path::Path;
///
/// let dir = resolve_destination(Path::new("images")).unwrap();
/// assert!(dir.is_absolute());
/// assert!(dir.ends_with("images"));
/// ```
pub fn resolve_destination(dir: &Path) -> Result<PathBuf> {
    let expanded = expand_home(dir);
    std::path::absolute(&expanded).map_err(|e| Error::filesystem(expanded, e))
}

/// File stem for the asset at `index` (0-based)
///
/// With a prefix the stem is the prefix followed by the 1-based position, so
/// `Some("x")` names three assets `x1`, `x2`, `x3`. Without a prefix the asset id is
/// used.
///
/// # Examples
///
/// ```
/// use imagegen_dl::types::Asset;
/// use imagegen_dl::utils::asset_stem;
///
/// let asset = Asset { id: "generation-abc".into(), image_url: "https://cdn/a.webp".into() };
/// assert_eq!(asset_stem(&asset, 1, Some("pbj")), "pbj2");
/// assert_eq!(asset_stem(&asset, 1, None), "generation-abc");
/// ```
#[must_use]
pub fn asset_stem(asset: &Asset, index: usize, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}{}", prefix, index + 1),
        _ => asset.id.clone(),
    }
}

/// Whether `stem` can be used as a file name directly inside a destination directory
///
/// Rejects empty names and anything containing a path separator, `..` or NUL.
///
/// # Examples
///
/// ```
/// use imagegen_dl::utils::is_plain_stem;
///
/// assert!(is_plain_stem("generation-abc"));
/// assert!(!is_plain_stem("../escaped"));
/// assert!(!is_plain_stem(""));
/// ```
#[must_use]
pub fn is_plain_stem(stem: &str) -> bool {
    !stem.is_empty() && !stem.contains(['/', '\\', '\0']) && !stem.contains("..")
}
