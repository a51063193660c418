//! Append-only record files.
//!
//! [`RecordFile<T>`] stores any serializable type as length-prefixed bincode
//! records. [`FileEventLog`] wraps it as the durable [`EventRepository`].

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use combat_core::{Event, IdentityId};
use serde::{Serialize, de::DeserializeOwned};

use crate::repository::{EventRepository, RepositoryError, Result};

// ============================================================================
// Record file
// ============================================================================

/// Append-only file of `T` records.
///
/// Each record is a little-endian `u32` byte length followed by the bincode
/// payload. Records are never rewritten.
struct RecordFile<T> {
    path: PathBuf,
    writer: BufWriter<File>,
    _phantom: PhantomData<T>,
}

impl<T> RecordFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Opens `filename` for appending, creating it when missing.
    fn open_or_create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        std::fs::create_dir_all(base_dir.as_ref())?;
        let path = base_dir.as_ref().join(filename.as_ref());
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!(
            "Opened record file: {} ({} bytes)",
            path.display(),
            file.metadata()?.len()
        );

        Ok(Self {
            path,
            writer: BufWriter::with_capacity(64 * 1024, file),
            _phantom: PhantomData,
        })
    }

    /// Buffers one record; visible to readers after [`RecordFile::flush`].
    fn append(&mut self, item: &T) -> Result<()> {
        let bytes =
            bincode::serialize(item).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let len = u32::try_from(bytes.len())
            .map_err(|_| RepositoryError::Serialization("record exceeds u32 length".into()))?;

        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Reads every flushed record from the start of the file.
    fn read_all(&self) -> Result<Vec<T>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut items = Vec::new();
        while let Some(item) = read_record(&mut reader)? {
            items.push(item);
        }
        Ok(items)
    }
}

/// Reads one `[len][payload]` record. A clean end of file yields `None`.
fn read_record<T, R>(reader: &mut R) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(RepositoryError::Io(e)),
    }
    let len = u32::from_le_bytes(header) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let item =
        bincode::deserialize(&payload).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    Ok(Some(item))
}

impl<T> Drop for RecordFile<T> {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(
                "unflushed records in {} lost on drop: {}",
                self.path.display(),
                e
            );
        }
    }
}

// ============================================================================
// Event log
// ============================================================================

/// Durable event log; every append is flushed before it returns.
pub struct FileEventLog {
    inner: Mutex<RecordFile<Event>>,
}

impl FileEventLog {
    pub fn open_or_create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(RecordFile::open_or_create(base_dir, filename)?),
        })
    }

    fn write(&self, events: &[Event]) -> Result<()> {
        let mut log = self
            .inner
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        for event in events {
            log.append(event)?;
        }
        log.flush()
    }
}

#[async_trait]
impl EventRepository for FileEventLog {
    async fn append(&self, event: &Event) -> Result<()> {
        self.write(std::slice::from_ref(event))
    }

    async fn append_batch(&self, events: &[Event]) -> Result<()> {
        self.write(events)
    }

    async fn list_for(&self, identity: IdentityId) -> Result<Vec<Event>> {
        let log = self
            .inner
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(log
            .read_all()?
            .into_iter()
            .filter(|event| event.owner == identity)
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
