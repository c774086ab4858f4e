// A ResultHandle is an id for bytes held by the BlobRegistry; the bytes stay
// alive until the handle is revoked.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::format::FileFormat;

/// Reference to one converted blob. Not `Clone`: there is a single owner.
#[derive(Debug, PartialEq, Eq)]
pub struct ResultHandle {
    id: u64,
    /// Format the blob was converted to
    pub format: FileFormat,
    /// Size of the blob in bytes
    pub size: usize,
}

impl ResultHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name a download of this result is saved under.
    pub fn download_name(&self) -> String {
        format!("converted.{}", self.format)
    }
}

#[derive(Default, Debug)]
pub struct BlobRegistry {
    blobs: HashMap<u64, Arc<[u8]>>,
    next_id: u64,
    created: usize,
    revoked: usize,
}

impl BlobRegistry {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` and returns the handle that owns them.
    pub fn create(&mut self, bytes: impl Into<Arc<[u8]>>, format: FileFormat) -> ResultHandle {
        let bytes = bytes.into();
        let id = self.next_id;
        self.next_id += 1;
        self.created += 1;
        let size = bytes.len();
        self.blobs.insert(id, bytes);
        debug!("Created result {} ({} bytes, {} created so far)", id, size, self.created);
        ResultHandle { id, format, size }
    }

    /// Releases the bytes behind `handle`. Consumes it so it can't be reused.
    pub fn revoke(&mut self, handle: ResultHandle) {
        if self.blobs.remove(&handle.id).is_some() {
            self.revoked += 1;
            debug!("Revoked result {} ({} revoked, {} live)", handle.id, self.revoked, self.blobs.len());
        }
    }

    pub fn get(&self, handle: &ResultHandle) -> Option<Arc<[u8]>> {
        self.blobs.get(&handle.id).cloned()
    }

    /// Handles currently alive.
    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.blobs.len()
    }

    #[cfg(test)]
    pub fn created(&self) -> usize {
        self.created
    }

    #[cfg(test)]
    pub fn revoked(&self) -> usize {
        self.revoked
    }
}
