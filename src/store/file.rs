use crate::error::DocError;
use crate::store::{content_fingerprint, Commit, DiffProducer, DocumentStore, RootGuard, Snapshot};
use crate::types::Revision;
use async_trait::async_trait;
use filetime::FileTime;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

/// Documents stored as UTF-8 files under a root directory.
///
/// A revision is `<mtime>-<byte length>-<xxh3>`. Every commit moves the file's
/// modification time strictly forward, so a token names one commit even when
/// the text is rewritten unchanged or returns to an earlier state.
/// Compare-and-swap is serialized within this process; writes are atomic
/// (tempfile + fsync + rename).
#[derive(Debug)]
pub struct FileStore {
    guard: RootGuard,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DocError> {
        Ok(Self {
            guard: RootGuard::new(root)?,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    pub fn guard(&self) -> &RootGuard {
        &self.guard
    }

    pub fn revision_for(text: &str, modified: FileTime) -> Revision {
        Revision::new(format!(
            "{}.{:09}-{}-{}",
            modified.unix_seconds(),
            modified.nanoseconds(),
            text.len(),
            content_fingerprint(text)
        ))
    }

    /// Text and modification time read through one handle, so both describe
    /// the same file even if a commit renames over it meanwhile.
    async fn read(path: &Path) -> Result<Option<(String, FileTime)>, DocError> {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let modified = FileTime::from_last_modification_time(&file.metadata().await?);
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;
        let text = String::from_utf8(bytes)
            .map_err(|e| DocError::Io(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        Ok(Some((text, modified)))
    }
}

/// A modification time later than `previous`, preferring the clock.
fn next_mtime(previous: Option<FileTime>) -> FileTime {
    let now = FileTime::now();
    match previous {
        Some(previous) if now <= previous => {
            let nanos = previous.nanoseconds() + 1;
            if nanos >= 1_000_000_000 {
                FileTime::from_unix_time(previous.unix_seconds() + 1, 0)
            } else {
                FileTime::from_unix_time(previous.unix_seconds(), nanos)
            }
        }
        _ => now,
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, id: &str) -> Result<Snapshot, DocError> {
        let path = self.guard.resolve(id)?;
        let (text, modified) = Self::read(&path)
            .await?
            .ok_or_else(|| DocError::NotFound { id: id.to_string() })?;
        let revision = Self::revision_for(&text, modified);
        Ok(Snapshot { text, revision })
    }

    async fn save(
        &self,
        id: &str,
        new_text: String,
        expected: &Revision,
        diff: DiffProducer<'_>,
    ) -> Result<Commit, DocError> {
        let path = self.guard.resolve(id)?;
        let _lock = self.write_lock.lock().await;

        let (old_text, previous) = match Self::read(&path).await? {
            Some((current, modified)) => {
                let current_revision = Self::revision_for(&current, modified);
                if &current_revision != expected {
                    return Err(DocError::RevisionConflict {
                        current: current_revision,
                    });
                }
                (current, Some(modified))
            }
            None => (String::new(), None),
        };

        let patch = diff(&old_text, &new_text);

        let bytes = new_text.into_bytes();
        let target = path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, &bytes, next_mtime(previous)))
            .await
            .map_err(|e| DocError::Io(std::io::Error::other(e)))??;

        // The filesystem may round the requested time; report what it stored.
        let (text, modified) = Self::read(&path)
            .await?
            .ok_or_else(|| DocError::NotFound { id: id.to_string() })?;
        let revision = Self::revision_for(&text, modified);
        if previous == Some(modified) {
            log::warn!("{id}: filesystem kept the previous modification time, revision unchanged");
        }
        log::debug!("committed {id} at revision {revision}");

        Ok(Commit { revision, patch })
    }
}

/// Atomic file write: tempfile + fsync + rename, stamped with `modified`.
///
/// Either the full write succeeds or the old content stays in place.
fn atomic_write(path: &Path, content: &[u8], modified: FileTime) -> Result<(), DocError> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = path.parent().ok_or_else(|| {
        DocError::Io(std::io::Error::new(
            ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    filetime::set_file_handle_times(temp.as_file(), None, Some(modified))?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
