//! Cross-platform entry-name sanitization.
//!
//! Archive entry names are attacker-controlled input. A hostile archive can
//! carry names like `../../etc/passwd` or `C:\Windows\x` in the hope that a
//! naive extractor writes outside the destination directory ("zip-slip").
//!
//! Unlike a validating path type that rejects such names outright, this
//! module *clamps* them: every name, however malformed, maps to a relative
//! path that stays inside the extraction root. Entries with hostile names
//! still extract, just to a safe location. Rejection would make whole
//! archives unextractable over one bad entry; clamping preserves the rest.

use std::path::{Path, PathBuf};

/// Windows reserved device names that cannot be used as filenames.
///
/// These refer to device drivers on Windows and can cause hangs or
/// unexpected behavior when created as files. They are neutralized on all
/// platforms so archives extracted on Unix remain portable to Windows.
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Checks if a filename is a Windows reserved device name.
///
/// Reserved names are case-insensitive and remain reserved when followed by
/// an extension (`CON.txt` is still reserved).
fn is_windows_reserved(name: &str) -> bool {
    let base = match name.find('.') {
        Some(pos) => &name[..pos],
        None => name,
    };
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| base.eq_ignore_ascii_case(reserved))
}

/// Clamps an archive entry name to a safe relative path.
///
/// The returned name:
/// - uses `/` separators (backslashes are treated as separators too),
/// - contains no `.` or `..` segments, no empty segments, no NUL bytes,
/// - has no leading slash or drive-letter prefix,
/// - has Windows reserved device names prefixed with `_`,
/// - preserves a trailing `/` (the directory marker).
///
/// An entirely hostile name (e.g. `"../.."`) clamps to the empty string,
/// which callers treat as the extraction root itself.
///
/// # Examples
///
/// ```rust
/// use zipedit::path::sanitize_entry_name;
///
/// assert_eq!(sanitize_entry_name("../../etc/passwd"), "etc/passwd");
/// assert_eq!(sanitize_entry_name("C:\\Windows\\x"), "Windows/x");
/// assert_eq!(sanitize_entry_name("/abs/file"), "abs/file");
/// assert_eq!(sanitize_entry_name("dir/sub/"), "dir/sub/");
/// ```
pub fn sanitize_entry_name(name: &str) -> String {
    let normalized: String = name.replace('\\', "/").replace('\0', "");
    let is_dir = normalized.ends_with('/');

    let mut segments: Vec<String> = Vec::new();
    for segment in normalized.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        // Drive-letter prefixes like "C:" collapse away entirely.
        if segment.len() == 2 && segment.ends_with(':') {
            continue;
        }
        if is_windows_reserved(segment) {
            segments.push(format!("_{}", segment));
        } else {
            segments.push(segment.to_string());
        }
    }

    let mut result = segments.join("/");
    if is_dir && !result.is_empty() {
        result.push('/');
    }
    result
}

/// Resolves an entry name to an on-disk path strictly inside `dest_root`.
///
/// The name is sanitized first, so the result is always a descendant of
/// `dest_root` (or `dest_root` itself for fully-clamped names).
pub fn safe_join(dest_root: &Path, name: &str) -> PathBuf {
    let clean = sanitize_entry_name(name);
    let mut path = dest_root.to_path_buf();
    for segment in clean.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

/// Iterates the ancestor directory names implied by an entry name.
///
/// For `"a/b/c.txt"` yields `"a/"` then `"a/b/"`. Directory names yield
/// their proper ancestors only.
pub fn ancestor_dirs(name: &str) -> impl Iterator<Item = String> + '_ {
    let trimmed = name.strip_suffix('/').unwrap_or(name);
    let bytes = trimmed.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'/')
        .map(move |(i, _)| format!("{}/", &trimmed[..i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(sanitize_entry_name("file.txt"), "file.txt");
        assert_eq!(sanitize_entry_name("dir/sub/file.txt"), "dir/sub/file.txt");
    }

    #[test]
    fn test_traversal_clamped() {
        assert_eq!(sanitize_entry_name("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_entry_name("a/../../b"), "a/b");
        assert_eq!(sanitize_entry_name("../.."), "");
    }

    #[test]
    fn test_absolute_and_drive_prefixes() {
        assert_eq!(sanitize_entry_name("/etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_entry_name("C:\\Windows\\x"), "Windows/x");
        assert_eq!(sanitize_entry_name("c:/temp/x"), "temp/x");
    }

    #[test]
    fn test_directory_marker_preserved() {
        assert_eq!(sanitize_entry_name("dir/sub/"), "dir/sub/");
        assert_eq!(sanitize_entry_name("../dir/"), "dir/");
    }

    #[test]
    fn test_empty_segments_and_nul() {
        assert_eq!(sanitize_entry_name("a//b"), "a/b");
        assert_eq!(sanitize_entry_name("a\0b.txt"), "ab.txt");
    }

    #[test]
    fn test_windows_reserved_neutralized() {
        assert_eq!(sanitize_entry_name("CON"), "_CON");
        assert_eq!(sanitize_entry_name("dir/aux.txt"), "dir/_aux.txt");
        assert_eq!(sanitize_entry_name("console.txt"), "console.txt");
    }

    #[test]
    fn test_safe_join_stays_inside() {
        let root = Path::new("/tmp/out");
        let joined = safe_join(root, "../../etc/passwd");
        assert!(joined.starts_with(root));
        assert_eq!(joined, Path::new("/tmp/out/etc/passwd"));
    }

    #[test]
    fn test_safe_join_fully_clamped_name() {
        let root = Path::new("/tmp/out");
        assert_eq!(safe_join(root, "../.."), root);
    }

    #[test]
    fn test_ancestor_dirs() {
        let dirs: Vec<_> = ancestor_dirs("a/b/c.txt").collect();
        assert_eq!(dirs, vec!["a/", "a/b/"]);

        let dirs: Vec<_> = ancestor_dirs("a/b/").collect();
        assert_eq!(dirs, vec!["a/"]);

        assert_eq!(ancestor_dirs("file.txt").count(), 0);
    }
}
