// Transient Input Store Port
// Materializes a request payload as a file the engine can read

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Input store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write transient input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request id: {0}")]
    InvalidRequestId(String),
}

/// Exclusive ownership of one transient input file
///
/// Created by `InputStore::acquire`, consumed by `InputStore::release`.
/// A handle dropped without release (e.g. the request future was cancelled)
/// removes its file synchronously.
#[derive(Debug)]
pub struct TransientInput {
    request_id: String,
    path: PathBuf,
    released: bool,
}

impl TransientInput {
    pub fn new(request_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            request_id: request_id.into(),
            path: path.into(),
            released: false,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Called by the store once removal was attempted
    pub fn mark_released(&mut self) {
        self.released = true;
    }
}

impl Drop for TransientInput {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(request_id = %self.request_id, path = %self.path.display(), "Removed unreleased transient input");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    request_id = %self.request_id,
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove unreleased transient input"
                );
            }
        }
    }
}

/// Input Store trait
#[async_trait]
pub trait InputStore: Send + Sync {
    /// Write `payload` verbatim to a location scoped by `request_id`
    ///
    /// # Errors
    /// - StoreError::InvalidRequestId if the id is not a safe file-name token
    /// - StoreError::Io if the file cannot be created or written
    async fn acquire(&self, request_id: &str, payload: &str) -> Result<TransientInput, StoreError>;

    /// Remove the input. Never fails; removal problems are only logged.
    async fn release(&self, input: TransientInput);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory store that records every acquire/release
    #[derive(Default)]
    pub struct MockInputStore {
        acquired: Arc<Mutex<Vec<(String, String)>>>,
        released: Arc<Mutex<Vec<String>>>,
        fail_acquire: bool,
    }

    impl MockInputStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store whose `acquire` always fails with an I/O error
        pub fn new_failing() -> Self {
            Self {
                fail_acquire: true,
                ..Self::default()
            }
        }

        /// `(request_id, payload)` pairs in acquisition order
        pub fn acquired(&self) -> Vec<(String, String)> {
            self.acquired.lock().unwrap().clone()
        }

        pub fn released(&self) -> Vec<String> {
            self.released.lock().unwrap().clone()
        }

        /// Ids acquired but not yet released
        pub fn outstanding(&self) -> Vec<String> {
            let released = self.released.lock().unwrap();
            self.acquired
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| id.clone())
                .filter(|id| !released.contains(id))
                .collect()
        }
    }

    #[async_trait]
    impl InputStore for MockInputStore {
        async fn acquire(
            &self,
            request_id: &str,
            payload: &str,
        ) -> Result<TransientInput, StoreError> {
            if self.fail_acquire {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "mock store is read-only",
                )));
            }

            self.acquired
                .lock()
                .unwrap()
                .push((request_id.to_string(), payload.to_string()));

            Ok(TransientInput::new(
                request_id,
                format!("/mock-input-store/input-{}.json", request_id),
            ))
        }

        async fn release(&self, mut input: TransientInput) {
            self.released
                .lock()
                .unwrap()
                .push(input.request_id().to_string());
            input.mark_released();
        }
    }
}
