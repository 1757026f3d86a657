use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::error::ResolveError;

/// A request target mapped onto the served directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Location on disk, always below the root.
    pub fs_path: PathBuf,
    /// Path component of the target exactly as the client sent it.
    pub raw_path: String,
    /// Percent-decoded path, used for listing titles. Bytes that are not
    /// UTF-8 show up as U+FFFD here but reach `fs_path` unchanged.
    pub url_path: String,
    pub query: Option<String>,
    pub trailing_slash: bool,
}

impl ResolvedPath {
    /// Target for redirecting a directory request to its slash form.
    pub fn with_trailing_slash(&self) -> String {
        match &self.query {
            Some(query) => format!("{}/?{}", self.raw_path, query),
            None => format!("{}/", self.raw_path),
        }
    }
}

pub fn resolve(root: &Path, target: &str) -> Result<ResolvedPath, ResolveError> {
    if !target.starts_with('/') {
        return Err(ResolveError::NotAbsolute);
    }

    let without_fragment = target.split('#').next().unwrap_or_default();
    let (raw_path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (without_fragment, None),
    };

    // File names need not be UTF-8, so decode to raw bytes.
    let decoded = urlencoding::decode_binary(raw_path.as_bytes());

    let mut fs_path = root.to_path_buf();
    for segment in decoded.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => continue,
            b".." => return Err(ResolveError::Traversal),
            s if s.contains(&b'\\') || s.contains(&0) => return Err(ResolveError::Traversal),
            s => fs_path.push(OsStr::from_bytes(s)),
        }
    }

    Ok(ResolvedPath {
        fs_path,
        trailing_slash: decoded.ends_with(b"/"),
        raw_path: raw_path.to_string(),
        url_path: String::from_utf8_lossy(&decoded).into_owned(),
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::http_status::HttpStatus;
    use pretty_assertions::assert_eq;

    fn root() -> PathBuf {
        PathBuf::from("/srv/site")
    }

    #[test]
    fn maps_plain_paths() {
        let resolved = resolve(&root(), "/css/site.css").unwrap();
        assert_eq!(resolved.fs_path, PathBuf::from("/srv/site/css/site.css"));
        assert!(!resolved.trailing_slash);
        assert_eq!(resolved.query, None);

        let resolved = resolve(&root(), "/").unwrap();
        assert_eq!(resolved.fs_path, root());
        assert!(resolved.trailing_slash);
    }

    #[test]
    fn strips_query_and_fragment() {
        let resolved = resolve(&root(), "/docs?page=2#top").unwrap();
        assert_eq!(resolved.fs_path, PathBuf::from("/srv/site/docs"));
        assert_eq!(resolved.query.as_deref(), Some("page=2"));
        assert_eq!(resolved.with_trailing_slash(), "/docs/?page=2");
    }

    #[test]
    fn decodes_percent_escapes() {
        let resolved = resolve(&root(), "/my%20notes/caf%C3%A9.txt").unwrap();
        assert_eq!(resolved.fs_path, PathBuf::from("/srv/site/my notes/café.txt"));
        assert_eq!(resolved.raw_path, "/my%20notes/caf%C3%A9.txt");
        assert_eq!(resolved.url_path, "/my notes/café.txt");
    }

    #[test]
    fn collapses_empty_and_dot_segments() {
        let resolved = resolve(&root(), "//a/./b//c").unwrap();
        assert_eq!(resolved.fs_path, PathBuf::from("/srv/site/a/b/c"));
    }

    #[test]
    fn rejects_traversal() {
        for target in [
            "/../etc/passwd",
            "/a/../../etc/passwd",
            "/%2e%2e/etc/passwd",
            "/a/%2E%2E/%2e%2e/secret",
            "/..%2fsecret",
            "/a\\..\\b",
            "/a%00b",
        ] {
            let err = resolve(&root(), target).unwrap_err();
            assert_eq!(err.status(), HttpStatus::Forbidden, "{target}");
        }
    }

    #[test]
    fn rejects_relative_targets() {
        assert!(matches!(
            resolve(&root(), "index.html"),
            Err(ResolveError::NotAbsolute)
        ));
    }

    #[test]
    fn keeps_non_utf8_bytes() {
        let resolved = resolve(&root(), "/caf%E9.txt").unwrap();
        let mut expected = root();
        expected.push(OsStr::from_bytes(b"caf\xe9.txt"));
        assert_eq!(resolved.fs_path, expected);
        assert_eq!(resolved.url_path, "/caf\u{fffd}.txt");
    }
}
