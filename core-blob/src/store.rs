//! Sharded on-disk blob store using Tokio

use bytes::Bytes;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, instrument, warn};

use crate::error::{BlobError, Result};

/// Separator between ID and checksum in blob file names
const NAME_SEPARATOR: &str = "==";

/// Permissions of newly created shard directories
#[cfg(unix)]
const SHARD_DIR_MODE: u32 = 0o750;

/// Which variant of an ID survives a cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retain<'a> {
    /// Keep the variant with this checksum, remove the others
    Checksum(&'a str),
    /// Remove every variant
    Nothing,
}

/// Content-addressed blob store rooted at a local directory
///
/// # Example
///
/// ```ignore
/// use core_blob::BlobStore;
///
/// let store = BlobStore::new("/var/lib/replica/blobs");
/// store.save("0B1234ab", "d41d8cd9", &b"hello"[..]).await?;
/// let head = store.read("0B1234ab", "d41d8cd9", 0, 4096).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store the content of `reader` as the current version of `id`
    ///
    /// Every other checksum variant of `id` is removed first. An existing
    /// file for the exact `(id, checksum)` pair is overwritten.
    ///
    /// Returns the number of bytes written.
    #[instrument(skip(self, reader))]
    pub async fn save<R>(&self, id: &str, checksum: &str, mut reader: R) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let path = self.blob_path(id, checksum)?;

        if let Err(e) = self.cleanup(id, Retain::Checksum(checksum)).await {
            warn!(id, error = %e, "Failed to clean up stale blobs before save");
        }

        let shard_dir = self.shard_dir(id)?;
        create_shard_dir(&shard_dir).await?;

        let mut file = fs::File::create(&path).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        debug!(path = ?path, size = written, "Saved blob");
        Ok(written)
    }

    /// Perform a single bounded read of up to `length` bytes at `offset`
    ///
    /// A short read is not an error: the returned buffer may hold fewer
    /// bytes than requested, and is empty at or past the end of the blob.
    /// Use [`read_full`](Self::read_full) to fill the whole range.
    pub async fn read(&self, id: &str, checksum: &str, offset: u64, length: usize) -> Result<Bytes> {
        let mut file = self.open(id, checksum).await?;
        let capacity = remaining_capacity(&file, offset, length).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buf = vec![0u8; capacity];
        let read = file.read(&mut buf).await?;
        buf.truncate(read);

        Ok(Bytes::from(buf))
    }

    /// Read up to `length` bytes at `offset`, looping over short reads
    ///
    /// Stops early only at the end of the blob.
    pub async fn read_full(
        &self,
        id: &str,
        checksum: &str,
        offset: u64,
        length: usize,
    ) -> Result<Bytes> {
        let mut file = self.open(id, checksum).await?;
        let capacity = remaining_capacity(&file, offset, length).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buf = vec![0u8; capacity];
        let mut filled = 0;
        while filled < capacity {
            let read = file.read(&mut buf[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        buf.truncate(filled);

        Ok(Bytes::from(buf))
    }

    /// Remove every stored variant of `id`
    ///
    /// Deleting an ID without blobs succeeds. Individual removal failures
    /// are logged and left for a later cleanup.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = self.cleanup(id, Retain::Nothing).await?;
        debug!(id, removed, "Deleted blobs");
        Ok(())
    }

    pub async fn exists(&self, id: &str, checksum: &str) -> Result<bool> {
        let path = self.blob_path(id, checksum)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Checksums currently stored for `id`, sorted
    pub async fn variants(&self, id: &str) -> Result<Vec<String>> {
        let shard_dir = self.shard_dir(id)?;
        let prefix = blob_prefix(id);

        let mut entries = match fs::read_dir(&shard_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut checksums = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(checksum) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_prefix(prefix.as_str()))
            {
                checksums.push(checksum.to_string());
            }
        }
        checksums.sort();

        Ok(checksums)
    }

    /// Remove variants of `id` according to `retain`
    ///
    /// Only listing the shard directory can fail; failures to remove single
    /// files cost disk space but are not reported. Returns how many files
    /// were removed.
    pub async fn cleanup(&self, id: &str, retain: Retain<'_>) -> Result<usize> {
        let shard_dir = self.shard_dir(id)?;
        let prefix = blob_prefix(id);
        let keep = match retain {
            Retain::Checksum(checksum) => Some(blob_name(id, checksum)),
            Retain::Nothing => None,
        };

        let mut entries = match fs::read_dir(&shard_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(prefix.as_str()) || keep.as_deref() == Some(name) {
                continue;
            }

            debug!(blob = name, "Deleting blob");
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(blob = name, error = %e, "Failed to delete blob"),
            }
        }

        Ok(removed)
    }

    async fn open(&self, id: &str, checksum: &str) -> Result<fs::File> {
        let path = self.blob_path(id, checksum)?;
        fs::File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BlobError::NotFound {
                    id: id.to_string(),
                    checksum: checksum.to_string(),
                }
            } else {
                BlobError::Io(e)
            }
        })
    }

    fn shard_dir(&self, id: &str) -> Result<PathBuf> {
        Ok(self.root.join(shard_name(id)?))
    }

    fn blob_path(&self, id: &str, checksum: &str) -> Result<PathBuf> {
        validate_checksum(checksum)?;
        Ok(self.shard_dir(id)?.join(blob_name(id, checksum)))
    }
}

/// Last two characters of the ID
fn shard_name(id: &str) -> Result<&str> {
    if id.contains(['/', '\\', '\0']) {
        return Err(BlobError::InvalidId {
            id: id.to_string(),
            reason: "contains a path separator".to_string(),
        });
    }

    let mut chars = id.char_indices().rev();
    let shard = match (chars.next(), chars.next()) {
        (Some(_), Some((start, _))) => &id[start..],
        _ => {
            return Err(BlobError::InvalidId {
                id: id.to_string(),
                reason: "must be at least two characters long".to_string(),
            })
        }
    };

    // ".." as a directory name would resolve outside the root
    if shard == ".." {
        return Err(BlobError::InvalidId {
            id: id.to_string(),
            reason: "must not end with \"..\"".to_string(),
        });
    }

    Ok(shard)
}

/// Buffer size for a read of `length` bytes at `offset`, bounded by the
/// bytes actually left in the file
async fn remaining_capacity(file: &fs::File, offset: u64, length: usize) -> Result<usize> {
    let remaining = file.metadata().await?.len().saturating_sub(offset);
    Ok(usize::try_from(remaining).map_or(length, |remaining| remaining.min(length)))
}

fn validate_checksum(checksum: &str) -> Result<()> {
    if checksum.contains(['/', '\\', '\0']) {
        return Err(BlobError::InvalidChecksum {
            checksum: checksum.to_string(),
            reason: "contains a path separator".to_string(),
        });
    }
    Ok(())
}

fn blob_prefix(id: &str) -> String {
    format!("{}{}", id, NAME_SEPARATOR)
}

fn blob_name(id: &str, checksum: &str) -> String {
    format!("{}{}{}", id, NAME_SEPARATOR, checksum)
}

async fn create_shard_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(SHARD_DIR_MODE);
    builder.create(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_shard_name() {
        assert_eq!(shard_name("0B1234ab").unwrap(), "ab");
        assert_eq!(shard_name("xy").unwrap(), "xy");
        assert_eq!(shard_name("fileé").unwrap(), "eé");
        assert!(matches!(shard_name("a"), Err(BlobError::InvalidId { .. })));
        assert!(matches!(shard_name(""), Err(BlobError::InvalidId { .. })));
        assert!(matches!(
            shard_name("../etc"),
            Err(BlobError::InvalidId { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_writes_sharded_layout() {
        let (dir, store) = store();

        let written = store.save("file01", "abc", &b"hello"[..]).await.unwrap();

        assert_eq!(written, 5);
        let expected = dir.path().join("01").join("file01==abc");
        assert_eq!(std::fs::read(expected).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_save_replaces_previous_version() {
        let (_dir, store) = store();

        store.save("file01", "c1", &b"first"[..]).await.unwrap();
        store.save("file01", "c2", &b"second"[..]).await.unwrap();

        assert_eq!(store.variants("file01").await.unwrap(), vec!["c2"]);
        let data = store.read("file01", "c2", 0, 64).await.unwrap();
        assert_eq!(&data[..], b"second");

        let err = store.read("file01", "c1", 0, 64).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_same_checksum_truncates() {
        let (_dir, store) = store();

        store.save("file01", "c1", &b"a longer payload"[..]).await.unwrap();
        store.save("file01", "c1", &b"short"[..]).await.unwrap();

        let data = store.read_full("file01", "c1", 0, 64).await.unwrap();
        assert_eq!(&data[..], b"short");
    }

    #[tokio::test]
    async fn test_read_short_and_past_end() {
        let (_dir, store) = store();
        store.save("file01", "c1", &b"0123456789"[..]).await.unwrap();

        let tail = store.read("file01", "c1", 7, 100).await.unwrap();
        assert_eq!(&tail[..], b"789");

        let window = store.read("file01", "c1", 2, 3).await.unwrap();
        assert_eq!(&window[..], b"234");

        let past_end = store.read("file01", "c1", 50, 10).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_read_full_range() {
        let (_dir, store) = store();
        let payload: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
        store.save("bigfile", "c1", payload.as_slice()).await.unwrap();

        let data = store.read_full("bigfile", "c1", 1_000, 90_000).await.unwrap();

        assert_eq!(data.len(), 90_000);
        assert_eq!(&data[..], &payload[1_000..91_000]);
    }

    #[tokio::test]
    async fn test_read_missing_blob() {
        let (_dir, store) = store();

        let err = store.read("nothere", "c1", 0, 10).await.unwrap_err();

        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_all_variants() {
        let (dir, store) = store();
        store.save("file01", "c1", &b"data"[..]).await.unwrap();
        // Leftover variants from failed cleanups
        std::fs::write(dir.path().join("01").join("file01==old1"), b"x").unwrap();
        std::fs::write(dir.path().join("01").join("file01==old2"), b"y").unwrap();

        store.delete("file01").await.unwrap();

        assert!(store.variants("file01").await.unwrap().is_empty());
        for checksum in ["c1", "old1", "old2"] {
            let err = store.read("file01", checksum, 0, 4).await.unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let (_dir, store) = store();

        store.delete("never-saved").await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_leaves_ids_sharing_a_shard() {
        let (_dir, store) = store();
        store.save("xab", "c1", &b"other"[..]).await.unwrap();
        store.save("ab", "c1", &b"mine"[..]).await.unwrap();
        store.save("ab", "c2", &b"mine v2"[..]).await.unwrap();

        store.delete("ab").await.unwrap();

        assert!(store.exists("xab", "c1").await.unwrap());
        assert!(!store.exists("ab", "c2").await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_reports_removed_count() {
        let (_dir, store) = store();
        store.save("file01", "c1", &b"data"[..]).await.unwrap();

        assert_eq!(store.cleanup("file01", Retain::Checksum("c1")).await.unwrap(), 0);
        assert_eq!(store.cleanup("file01", Retain::Nothing).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_short_id() {
        let (_dir, store) = store();

        let err = store.save("a", "c1", &b"data"[..]).await.unwrap_err();

        assert!(matches!(err, BlobError::InvalidId { .. }));
    }

    #[tokio::test]
    async fn test_rejects_ids_resolving_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("blobs"));

        for id in ["x..", ".."] {
            let err = store.save(id, "c1", &b"escaped"[..]).await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidId { .. }), "{id}");
            assert!(matches!(
                store.delete(id).await,
                Err(BlobError::InvalidId { .. })
            ));
        }

        let stray: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(stray.is_empty());
    }

    #[test]
    fn test_shard_name_allows_single_trailing_dot() {
        assert_eq!(shard_name("file.").unwrap(), "e.");
        assert_eq!(shard_name("x.y").unwrap(), ".y");
    }

    #[tokio::test]
    async fn test_oversized_read_length_is_bounded_by_blob() {
        let (_dir, store) = store();
        store.save("file01", "c1", &b"0123456789"[..]).await.unwrap();

        let data = store.read("file01", "c1", 4, usize::MAX).await.unwrap();
        assert_eq!(&data[..], b"456789");

        let data = store.read_full("file01", "c1", 0, usize::MAX).await.unwrap();
        assert_eq!(&data[..], b"0123456789");

        let past_end = store.read_full("file01", "c1", 20, usize::MAX).await.unwrap();
        assert!(past_end.is_empty());
    }
}
