use crate::index::VectorIndex;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};

/// Shared access point to the published index.
///
/// Readers take an `Arc` snapshot and keep it for the whole query; a rebuild
/// publishes a complete new index with [`IndexHandle::replace`]. Rebuilds are
/// serialized through [`IndexHandle::lock_rebuild`].
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<VectorIndex>>,
    rebuild: Mutex<()>,
}

impl IndexHandle {
    #[must_use]
    pub fn new(index: VectorIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
            rebuild: Mutex::new(()),
        }
    }

    /// The currently published index
    #[must_use]
    pub fn snapshot(&self) -> Arc<VectorIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish `index`, returning the one it replaced
    pub fn replace(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(index))
    }

    /// Exclusive right to build and publish a new index
    pub async fn lock_rebuild(&self) -> MutexGuard<'_, ()> {
        self.rebuild.lock().await
    }
}
