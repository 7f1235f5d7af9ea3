//! File-backed counter store with cross-process locking
//!
//! Every counter lives in its own JSON file, `<type>-<segment>.json`, next to
//! a lock file `<type>-<segment>.lock`. The lock file is never replaced, so an
//! advisory lock on it is meaningful across threads and across processes that
//! share the directory. The counter file itself is replaced atomically
//! (write temp file, fsync, rename, fsync the directory) while the lock is
//! held, so a returned number survives power loss.

use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::traits::*;
use crate::types::*;

/// How long to wait for a counter lock before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(2);

/// Counters stored as one JSON file per (document type, segment) pair
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileCounterStore {
    /// Open (and create if needed) a counter directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AllocationError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| AllocationError::Io {
            counter: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the counter's JSON state
    pub fn counter_path(&self, key: &CounterKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.storage_name()))
    }

    /// File whose advisory lock guards the counter
    pub fn lock_path(&self, key: &CounterKey) -> PathBuf {
        self.dir.join(format!("{}.lock", key.storage_name()))
    }

    /// Run blocking file work off the async executor
    async fn blocking<T, F>(&self, work: F) -> Result<T, AllocationError>
    where
        T: Send + 'static,
        F: FnOnce(FileCounterStore) -> Result<T, AllocationError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || work(store))
            .await
            .map_err(|e| AllocationError::Unavailable(format!("counter task failed: {}", e)))?
    }

    fn lock(&self, key: &CounterKey) -> Result<CounterLock, AllocationError> {
        let path = self.lock_path(key);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| io_error(key, source))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(CounterLock { file }),
                Err(err) if is_contended(&err) => {
                    let waited = started.elapsed();
                    if waited >= self.lock_timeout {
                        return Err(AllocationError::LockTimeout {
                            counter: key.to_string(),
                            waited_ms: waited.as_millis() as u64,
                        });
                    }
                    tracing::trace!(counter = %key, "waiting for counter lock");
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(err) => return Err(io_error(key, err)),
            }
        }
    }

    fn read(&self, key: &CounterKey) -> Result<Option<DocumentNumberCounter>, AllocationError> {
        read_counter_file(&self.counter_path(key), key)
    }

    fn write(&self, counter: &DocumentNumberCounter) -> Result<(), AllocationError> {
        let key = counter.key();
        let path = self.counter_path(&key);
        let tmp_path = self
            .dir
            .join(format!("{}.{}.tmp", key.storage_name(), uuid::Uuid::new_v4()));

        let json = serde_json::to_vec_pretty(counter).map_err(|e| AllocationError::Corrupt {
            counter: key.to_string(),
            reason: e.to_string(),
        })?;

        let written = (|| -> io::Result<()> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&json)?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &path)
        })();

        if let Err(source) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error(&key, source));
        }
        sync_dir(&self.dir).map_err(|source| io_error(&key, source))
    }
}

/// Flush the directory entry so the rename itself is durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

// Directory handles cannot be fsynced on Windows; NTFS journals the rename
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Held for the whole read-increment-write cycle; unlocks on drop
struct CounterLock {
    file: File,
}

impl Drop for CounterLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn io_error(key: &CounterKey, source: io::Error) -> AllocationError {
    AllocationError::Io {
        counter: key.to_string(),
        source,
    }
}

fn read_counter_file(
    path: &Path,
    key: &CounterKey,
) -> Result<Option<DocumentNumberCounter>, AllocationError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(key, err)),
    };

    let counter: DocumentNumberCounter =
        serde_json::from_slice(&bytes).map_err(|e| AllocationError::Corrupt {
            counter: key.to_string(),
            reason: e.to_string(),
        })?;

    if counter.key() != *key {
        return Err(AllocationError::Corrupt {
            counter: key.to_string(),
            reason: format!("file belongs to counter {}", counter.key()),
        });
    }
    Ok(Some(counter))
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn last_sequence(&self, key: &CounterKey) -> Result<u64, AllocationError> {
        let key = key.clone();
        self.blocking(move |store| {
            let _lock = store.lock(&key)?;
            Ok(store.read(&key)?.map_or(0, |c| c.last_sequence))
        })
        .await
    }

    async fn advance(&self, key: &CounterKey) -> Result<DocumentNumberCounter, AllocationError> {
        let key = key.clone();
        self.blocking(move |store| {
            let _lock = store.lock(&key)?;
            let mut counter = store
                .read(&key)?
                .unwrap_or_else(|| DocumentNumberCounter::fresh(&key));
            counter.advance()?;
            store.write(&counter)?;
            Ok(counter)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<DocumentNumberCounter>, AllocationError> {
        self.blocking(|store| {
            let entries = fs::read_dir(&store.dir).map_err(|source| AllocationError::Io {
                counter: store.dir.display().to_string(),
                source,
            })?;

            let mut counters = Vec::new();
            for entry in entries {
                let path = entry
                    .map_err(|source| AllocationError::Io {
                        counter: store.dir.display().to_string(),
                        source,
                    })?
                    .path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let bytes = fs::read(&path).map_err(|source| AllocationError::Io {
                    counter: path.display().to_string(),
                    source,
                })?;
                let counter: DocumentNumberCounter = serde_json::from_slice(&bytes).map_err(
                    |e| AllocationError::Corrupt {
                        counter: path.display().to_string(),
                        reason: e.to_string(),
                    },
                )?;
                counters.push(counter);
            }

            counters.sort_by(|a, b| a.key().cmp(&b.key()));
            Ok(counters)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(document_type: DocumentType, code: &str) -> CounterKey {
        CounterKey::new(
            document_type,
            SegmentCatalog::default().resolve(code).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_advance_persists_counter_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open(dir.path()).unwrap();
        let challans = key(DocumentType::Challan, "RES");

        assert_eq!(store.last_sequence(&challans).await.unwrap(), 0);
        assert_eq!(store.advance(&challans).await.unwrap().last_sequence, 1);
        assert_eq!(store.advance(&challans).await.unwrap().last_sequence, 2);

        let saved = fs::read_to_string(store.counter_path(&challans)).unwrap();
        let counter: DocumentNumberCounter = serde_json::from_str(&saved).unwrap();
        assert_eq!(counter.last_sequence, 2);
        assert_eq!(counter.document_type, DocumentType::Challan);
        assert_eq!(counter.segment.code(), "RES");

        // a second handle on the same directory sees the same state
        let reopened = FileCounterStore::open(dir.path()).unwrap();
        assert_eq!(reopened.advance(&challans).await.unwrap().last_sequence, 3);
    }

    #[tokio::test]
    async fn test_durable_write_leaves_only_counter_and_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open(dir.path()).unwrap();
        let receipts = key(DocumentType::Receipt, "PROD");

        for expected in 1..=5 {
            assert_eq!(store.advance(&receipts).await.unwrap().last_sequence, expected);
        }
        sync_dir(dir.path()).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["receipt-PROD.json", "receipt-PROD.lock"]);
        assert_eq!(store.last_sequence(&receipts).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_lock_timeout_when_counter_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open(dir.path())
            .unwrap()
            .with_lock_timeout(Duration::from_millis(50));
        let quotations = key(DocumentType::Quotation, "COM");

        let held = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(store.lock_path(&quotations))
            .unwrap();
        held.lock_exclusive().unwrap();

        let result = store.advance(&quotations).await;
        assert!(matches!(result, Err(AllocationError::LockTimeout { .. })));

        // other counters are unaffected by the held lock
        assert_eq!(
            store
                .advance(&key(DocumentType::Quotation, "RES"))
                .await
                .unwrap()
                .last_sequence,
            1
        );

        FileExt::unlock(&held).unwrap();
        assert_eq!(store.advance(&quotations).await.unwrap().last_sequence, 1);
    }

    #[tokio::test]
    async fn test_corrupt_counter_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open(dir.path()).unwrap();
        let receipts = key(DocumentType::Receipt, "IND");

        fs::write(store.counter_path(&receipts), b"{ not json").unwrap();
        assert!(matches!(
            store.advance(&receipts).await,
            Err(AllocationError::Corrupt { .. })
        ));
        assert!(matches!(
            store.last_sequence(&receipts).await,
            Err(AllocationError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_counter_file_for_another_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open(dir.path()).unwrap();
        let proformas = key(DocumentType::Proforma, "RES");
        let agreements = key(DocumentType::Agreement, "RES");

        store.advance(&proformas).await.unwrap();
        fs::copy(store.counter_path(&proformas), store.counter_path(&agreements)).unwrap();

        assert!(matches!(
            store.advance(&agreements).await,
            Err(AllocationError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_reads_all_counters() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCounterStore::open(dir.path()).unwrap();

        store.advance(&key(DocumentType::Quotation, "RES")).await.unwrap();
        store.advance(&key(DocumentType::Quotation, "RES")).await.unwrap();
        store.advance(&key(DocumentType::Challan, "COM")).await.unwrap();

        let counters = store.list().await.unwrap();
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].document_type, DocumentType::Quotation);
        assert_eq!(counters[0].last_sequence, 2);
        assert_eq!(counters[1].document_type, DocumentType::Challan);
        assert_eq!(counters[1].last_sequence, 1);
    }
}
