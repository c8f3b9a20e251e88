//! Backend path normalization.
//!
//! Backend paths are relative to the backend root, use `/` separators and
//! never contain `.` or `..` segments. Directory paths end with `/`; the
//! root directory is `/`.

use super::error::StorageError;

/// Normalize a client supplied path into backend form.
///
/// Empty segments are dropped. Returns an empty string for the root.
pub fn normalize(raw: &str) -> Result<String, StorageError> {
    let mut segments = Vec::new();
    for segment in raw.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment == "." || segment == ".." || segment.contains(['\\', '\0']) {
            return Err(StorageError::invalid_path(raw));
        }
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

/// Normalize a file path. The root is not a file.
pub fn file_path(raw: &str) -> Result<String, StorageError> {
    let path = normalize(raw)?;
    if path.is_empty() {
        return Err(StorageError::invalid_path(raw));
    }
    Ok(path)
}

/// Normalize a directory path, with trailing `/`.
pub fn dir_path(raw: &str) -> Result<String, StorageError> {
    let path = normalize(raw)?;
    if path.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("{path}/"))
    }
}

/// Whether a directory path returned by [`dir_path`] is the root.
pub fn is_root(dir: &str) -> bool {
    dir == "/"
}

/// Parent directory of a normalized file path, `None` at the root.
pub fn parent_dir(path: &str) -> Option<String> {
    path.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| format!("{parent}/"))
}

/// Join a folder and a file name into a normalized file path.
pub fn join(folder: &str, name: &str) -> Result<String, StorageError> {
    file_path(&format!("{folder}/{name}"))
}

/// Final component of a path, without trailing `/`.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("/", "")]
    #[case("photo.jpg", "photo.jpg")]
    #[case("/Holiday//beach.jpg", "Holiday/beach.jpg")]
    #[case("Holiday/2024/", "Holiday/2024")]
    fn test_normalize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize(raw).expect("valid path"), expected);
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("Holiday/../../secret")]
    #[case("./photo.jpg")]
    #[case("dir\\..\\photo.jpg")]
    fn test_normalize_rejects_traversal(#[case] raw: &str) {
        assert!(matches!(normalize(raw), Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn test_dir_and_file_paths() {
        assert_eq!(dir_path("").expect("root"), "/");
        assert!(is_root(&dir_path("//").expect("root")));
        assert_eq!(dir_path("Holiday").expect("dir"), "Holiday/");
        assert!(file_path("/").is_err());
        assert_eq!(join("Holiday", "a.jpg").expect("joined"), "Holiday/a.jpg");
        assert_eq!(join("", "a.jpg").expect("joined"), "a.jpg");
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent_dir("a/b/c.jpg").as_deref(), Some("a/b/"));
        assert_eq!(parent_dir("c.jpg"), None);
        assert_eq!(file_name("a/b/c.jpg"), "c.jpg");
        assert_eq!(file_name("a/b/"), "b");
    }
}
