//! Last-value-wins exchange channel between the relay and breaker loops.
//!
//! A channel holds at most one record. Writers replace it atomically and
//! readers observe either the whole latest record or nothing.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_CHANNEL_PATH: &str = "/tmp/goose_data.txt";

static NEXT_STAGING_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("channel lock poisoned")]
    Poisoned,
}

pub trait ExchangeChannel: Send + Sync {
    /// Replace the held record. A concurrent reader never sees a partial write.
    fn write_atomic(&self, record: &[u8]) -> Result<(), ChannelError>;

    /// Latest record, or `None` when nothing has been written yet.
    fn read_latest(&self) -> Result<Option<Vec<u8>>, ChannelError>;

    /// Drop the held record and any backing resource.
    fn release(&self) -> Result<(), ChannelError>;

    fn describe(&self) -> String;
}

/// In-process channel. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExchangeChannel for MemoryChannel {
    fn write_atomic(&self, record: &[u8]) -> Result<(), ChannelError> {
        let mut slot = self.slot.lock().map_err(|_| ChannelError::Poisoned)?;
        *slot = Some(record.to_vec());
        Ok(())
    }

    fn read_latest(&self) -> Result<Option<Vec<u8>>, ChannelError> {
        let slot = self.slot.lock().map_err(|_| ChannelError::Poisoned)?;
        Ok(slot.clone())
    }

    fn release(&self) -> Result<(), ChannelError> {
        let mut slot = self.slot.lock().map_err(|_| ChannelError::Poisoned)?;
        *slot = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Path-backed channel. A missing file means the channel is empty.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so readers only ever see a complete record. Every write gets its own
/// temp file, so clones may write from several threads.
#[derive(Debug, Clone)]
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> ChannelError {
        ChannelError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| "channel".into(), std::ffi::OsStr::to_os_string);
        let id = NEXT_STAGING_ID.fetch_add(1, Ordering::Relaxed);
        name.push(format!(".{}.{}.tmp", std::process::id(), id));
        self.path.with_file_name(name)
    }

    fn write_staging(staging_path: &Path, record: &[u8]) -> io::Result<()> {
        let mut file = fs::File::create(staging_path)?;
        file.write_all(record)?;
        file.sync_all()?;

        // Readers may run unprivileged
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(staging_path, fs::Permissions::from_mode(0o644))?;
        }

        Ok(())
    }
}

impl Default for FileChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_PATH)
    }
}

impl ExchangeChannel for FileChannel {
    fn write_atomic(&self, record: &[u8]) -> Result<(), ChannelError> {
        let staging_path = self.staging_path();
        let staged = Self::write_staging(&staging_path, record)
            .and_then(|()| fs::rename(&staging_path, &self.path));

        staged.map_err(|e| {
            let _ = fs::remove_file(staging_path.as_path());
            self.io_error(e)
        })
    }

    fn read_latest(&self) -> Result<Option<Vec<u8>>, ChannelError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn release(&self) -> Result<(), ChannelError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Releases the channel when dropped, covering every exit path of its owner.
pub struct ChannelGuard<C: ExchangeChannel> {
    channel: C,
    armed: bool,
}

impl<C: ExchangeChannel> ChannelGuard<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            armed: true,
        }
    }

    /// Keep the resource on drop.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C: ExchangeChannel> Drop for ChannelGuard<C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.channel.release() {
            Ok(()) => debug!("Released channel {}", self.channel.describe()),
            Err(e) => warn!("Failed to release channel {}: {}", self.channel.describe(), e),
        }
    }
}
