// Panic isolation for request handling
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Run a future with panic isolation
///
/// A panic inside `future` is caught and returned as
/// `PanicGuardResult::Panicked`, so the caller can still run its cleanup.
///
/// # Example
/// ```text
/// let result = execute_guarded_async(async {
///     invoker.invoke(&spec).await
/// }).await;
/// ```
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: std::future::Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            error!(panic_msg = %panic_msg, "Request task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Extract the message from a panic payload
pub fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
