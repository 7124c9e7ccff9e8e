use crate::error::DocError;
use std::path::{Component, Path, PathBuf};

/// Keeps document ids inside the file store root.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical store root
    root: PathBuf,
}

impl RootGuard {
    /// The root is created if missing and canonicalized to handle symlinks.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DocError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a document id to a path under the root.
    ///
    /// Ids are relative paths made of normal components only. When the
    /// target (or its nearest existing ancestor) exists it is canonicalized
    /// and re-checked so symlinks cannot lead outside the root.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, DocError> {
        let relative = Path::new(id);
        let lexically_safe = !id.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !lexically_safe {
            return Err(DocError::InvalidDocumentId(relative.to_path_buf()));
        }

        let path = self.root.join(relative);
        let existing = path.ancestors().find(|ancestor| ancestor.exists());
        if let Some(existing) = existing {
            let canonical = existing.canonicalize()?;
            if !canonical.starts_with(&self.root) {
                return Err(DocError::InvalidDocumentId(relative.to_path_buf()));
            }
        }

        Ok(path)
    }

    /// Id of a path under the root, using `/` separators.
    pub fn id_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|component| match component {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .collect();
        Some(segments?.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_ids() {
        let dir = tempfile::tempdir().unwrap();
        let guard = RootGuard::new(dir.path()).unwrap();
        let path = guard.resolve("guides/intro.md").unwrap();
        assert!(path.starts_with(guard.root()));
        assert_eq!(guard.id_for(&path).as_deref(), Some("guides/intro.md"));
    }

    #[test]
    fn rejects_escaping_ids() {
        let dir = tempfile::tempdir().unwrap();
        let guard = RootGuard::new(dir.path()).unwrap();
        for id in ["../outside.md", "/etc/passwd", "a/../../b.md", ""] {
            assert!(
                matches!(guard.resolve(id), Err(DocError::InvalidDocumentId(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let guard = RootGuard::new(dir.path()).unwrap();
        assert!(matches!(
            guard.resolve("link/doc.md"),
            Err(DocError::InvalidDocumentId(_))
        ));
    }
}
