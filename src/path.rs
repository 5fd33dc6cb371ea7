//! Path normalization and mount-point resolution.
//!
//! The original implementation resolves a mount point by the longest
//! *string* prefix match against the registered roots, which lets
//! `/volumeext` wrongly resolve against a mount at `/volume`. This crate
//! adopts the REDESIGN FLAG from the specification: matching is done on
//! `/`-separated path *segments*, so a mount only ever claims paths that
//! share a full path component with it.

use std::path::{Path, PathBuf};

/// Splits `path` into its non-empty `/`-separated segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalizes a path to its canonical absolute form: `/`-rooted, no empty
/// segments, no trailing slash (except the root itself, `/`).
pub fn normalize(path: &str) -> PathBuf {
    let segs = segments(path);
    if segs.is_empty() {
        return PathBuf::from("/");
    }
    let mut out = String::from("/");
    out.push_str(&segs.join("/"));
    PathBuf::from(out)
}

/// Returns whether `root`'s segments are a prefix of `path`'s segments —
/// the per-segment test behind longest-prefix mount resolution.
pub fn is_segment_prefix(root: &str, path: &str) -> bool {
    let root_segs = segments(root);
    let path_segs = segments(path);
    if root_segs.len() > path_segs.len() {
        return false;
    }
    root_segs.iter().zip(path_segs.iter()).all(|(a, b)| a == b)
}

/// Picks the best-matching root out of `roots` for `path`: the candidate
/// whose segment prefix is longest, breaking ties by preferring the
/// lexicographically last root (stable, deterministic, and matches the
/// common convention that more specific strings sort after their prefixes).
pub fn best_mount_match<'a>(roots: impl IntoIterator<Item = &'a str>, path: &str) -> Option<&'a str> {
    roots
        .into_iter()
        .filter(|root| is_segment_prefix(root, path))
        .max_by_key(|root| (segments(root).len(), *root))
}

/// Returns the path portion relative to `root`, with no leading slash.
/// `root` must already have been confirmed to be a segment-prefix of `path`.
pub fn strip_root<'a>(root: &str, path: &'a str) -> &'a str {
    let root_segs = segments(root);
    let mut rest = path.trim_start_matches('/');
    for seg in root_segs {
        rest = rest
            .strip_prefix(seg)
            .map(|r| r.trim_start_matches('/'))
            .unwrap_or(rest);
    }
    rest
}

/// Joins a resolved root and its mount-relative remainder back into an
/// absolute path for the backend to consume.
pub fn join_abs(root: &str, relative: &str) -> PathBuf {
    if relative.is_empty() {
        return normalize(root);
    }
    let mut s = String::from(root.trim_end_matches('/'));
    s.push('/');
    s.push_str(relative);
    normalize(&s)
}

pub fn parent(path: &Path) -> Option<&Path> {
    path.parent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_prefix_rejects_partial_component_match() {
        assert!(!is_segment_prefix("/volume", "/volumeext/foo"));
        assert!(is_segment_prefix("/volume", "/volume/foo"));
        assert!(is_segment_prefix("/volume", "/volume"));
    }

    #[test]
    fn longest_match_wins_over_root() {
        let roots = ["/", "/volume", "/volume/nested"];
        assert_eq!(best_mount_match(roots, "/volume/nested/file.txt"), Some("/volume/nested"));
        assert_eq!(best_mount_match(roots, "/volume/file.txt"), Some("/volume"));
        assert_eq!(best_mount_match(roots, "/elsewhere"), Some("/"));
    }

    #[test]
    fn no_match_without_root_mount() {
        let roots = ["/volume"];
        assert_eq!(best_mount_match(roots, "/elsewhere"), None);
    }

    #[test]
    fn strip_root_removes_matched_segments() {
        assert_eq!(strip_root("/volume", "/volume/a/b"), "a/b");
        assert_eq!(strip_root("/", "/a/b"), "a/b");
    }

    #[test]
    fn normalize_collapses_empty_segments() {
        assert_eq!(normalize("//a//b/"), PathBuf::from("/a/b"));
        assert_eq!(normalize(""), PathBuf::from("/"));
    }
}
