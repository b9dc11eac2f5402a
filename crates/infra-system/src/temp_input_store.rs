// Temp-file input store
// reason: tokio::fs so writing/removing inputs never blocks the runtime
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use jqlite_core::port::{InputStore, StoreError, TransientInput};

/// Default directory name under the system temp dir
const DEFAULT_DIR_NAME: &str = "jqlite-gateway";

/// `<tmp>/jqlite-gateway`
pub fn default_input_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DIR_NAME)
}

/// Writes each request's payload to `<dir>/input-<request_id>.json`
///
/// Files are created exclusively, so two in-flight requests can never share
/// (or delete) each other's input.
pub struct TempFileInputStore {
    dir: PathBuf,
}

impl TempFileInputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, request_id: &str) -> PathBuf {
        self.dir.join(format!("input-{}.json", request_id))
    }
}

impl Default for TempFileInputStore {
    fn default() -> Self {
        Self::new(default_input_dir())
    }
}

/// Request ids become file names: allow only `[A-Za-z0-9_-]`
fn is_safe_request_id(request_id: &str) -> bool {
    !request_id.is_empty()
        && request_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl InputStore for TempFileInputStore {
    async fn acquire(&self, request_id: &str, payload: &str) -> Result<TransientInput, StoreError> {
        if !is_safe_request_id(request_id) {
            return Err(StoreError::InvalidRequestId(request_id.to_string()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(request_id);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        // From here on the handle owns the file: an early return drops it,
        // which removes the partial input.
        let input = TransientInput::new(request_id, &path);

        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        debug!(
            request_id = %request_id,
            path = %path.display(),
            bytes = payload.len(),
            "Transient input written"
        );

        Ok(input)
    }

    async fn release(&self, mut input: TransientInput) {
        match tokio::fs::remove_file(input.path()).await {
            Ok(()) => {
                debug!(request_id = %input.request_id(), "Transient input removed");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(request_id = %input.request_id(), "Transient input already gone");
            }
            Err(e) => {
                warn!(
                    request_id = %input.request_id(),
                    path = %input.path().display(),
                    error = %e,
                    "Failed to delete transient input"
                );
            }
        }
        input.mark_released();
    }
}
