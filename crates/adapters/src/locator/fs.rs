//! Filesystem locator

use async_trait::async_trait;
use asset_watch_domain::{LocatorError, UriLocator};
use std::path::{Component, Path, PathBuf};

/// Reads resources from disk.
///
/// Relative and root-relative (`/css/a.css`) URIs are resolved against the
/// context root and may not climb above it with `..`; `file://` URIs are
/// taken as absolute paths.
pub struct FsUriLocator {
    root: PathBuf,
}

impl FsUriLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, LocatorError> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);

        if let Some(absolute) = path.strip_prefix("file://") {
            return Ok(PathBuf::from(absolute));
        }
        let path = path.strip_prefix("file:").unwrap_or(path);

        let relative = confine(Path::new(path.trim_start_matches('/')))
            .ok_or_else(|| LocatorError::OutsideRoot(uri.to_string()))?;
        Ok(self.root.join(relative))
    }
}

/// Lexically normalize `path`, or `None` if it climbs above its start
fn confine(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

#[async_trait]
impl UriLocator for FsUriLocator {
    fn accepts(&self, uri: &str) -> bool {
        uri.starts_with("file:") || !uri.contains("://")
    }

    async fn locate(&self, uri: &str) -> Result<Vec<u8>, LocatorError> {
        let path = self.resolve(uri)?;
        tracing::trace!(uri = %uri, path = %path.display(), "Reading resource");

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LocatorError::NotFound(uri.to_string()),
            _ => LocatorError::Io {
                uri: uri.to_string(),
                source: e,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsUriLocator) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/a.css"), "a { }").unwrap();
        let locator = FsUriLocator::new(dir.path());
        (dir, locator)
    }

    #[tokio::test]
    async fn test_locate_relative_uri() {
        let (_dir, locator) = setup();
        assert_eq!(locator.locate("css/a.css").await.unwrap(), b"a { }");
    }

    #[tokio::test]
    async fn test_locate_root_relative_uri() {
        let (_dir, locator) = setup();
        assert_eq!(locator.locate("/css/a.css?v=2").await.unwrap(), b"a { }");
    }

    #[tokio::test]
    async fn test_locate_file_uri() {
        let (dir, locator) = setup();
        let uri = format!("file://{}", dir.path().join("css/a.css").display());
        assert_eq!(locator.locate(&uri).await.unwrap(), b"a { }");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, locator) = setup();
        let result = locator.locate("css/missing.css").await;
        assert!(matches!(result, Err(LocatorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_parent_segments_inside_root() {
        let (_dir, locator) = setup();
        assert_eq!(locator.locate("css/../css/./a.css").await.unwrap(), b"a { }");
    }

    #[tokio::test]
    async fn test_uri_escaping_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("web");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.css"), "s { }").unwrap();
        let locator = FsUriLocator::new(&root);

        for uri in ["../secret.css", "/css/../../secret.css", "file:../secret.css"] {
            let result = locator.locate(uri).await;
            assert!(
                matches!(result, Err(LocatorError::OutsideRoot(_))),
                "{uri} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_accepts() {
        let locator = FsUriLocator::new(".");
        assert!(locator.accepts("css/a.css"));
        assert!(locator.accepts("/css/a.css"));
        assert!(locator.accepts("file:///tmp/a.css"));
        assert!(!locator.accepts("http://example.com/a.css"));
    }
}
