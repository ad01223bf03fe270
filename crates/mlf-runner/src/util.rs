use std::path::{Path, PathBuf};

/// Expand `~` and anchor relative paths at `root`.
pub fn resolve_path(root: &Path, raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw).to_string();
    let p = PathBuf::from(expanded);
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

/// [`resolve_path`] for a path that came in as a `Path`, e.g. from the command line.
pub fn resolve_given(root: &Path, given: &Path) -> PathBuf {
    match given.to_str() {
        Some(raw) => resolve_path(root, raw),
        None if given.is_absolute() => given.to_path_buf(),
        None => root.join(given),
    }
}
