// Process Invoker Port
// Abstraction for running one external engine process under bounds

use crate::domain::{InvocationSpec, ProcessInvocationResult};
use async_trait::async_trait;
use std::path::Path;

/// Process Invoker trait
///
/// Implementations:
/// - BoundedProcessInvoker: spawns the engine with tokio::process
/// - MockProcessInvoker: canned results for tests
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    /// Run `spec.program` with `spec.args` and wait for it, bounded by `spec.limits`
    ///
    /// Never fails: spawn errors, timeouts and non-zero exits are all reported
    /// inside the returned `ProcessInvocationResult`.
    async fn invoke(&self, spec: &InvocationSpec) -> ProcessInvocationResult;

    /// Check whether an executable exists at `program`
    async fn is_available(&self, program: &Path) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Mock invoker behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this result for every invocation
        Respond(ProcessInvocationResult),
        /// Panic with message (for cleanup-on-panic testing)
        Panic(String),
    }

    /// Mock Process Invoker for testing
    pub struct MockProcessInvoker {
        behavior: Arc<Mutex<MockBehavior>>,
        calls: Arc<Mutex<Vec<InvocationSpec>>>,
        unavailable: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl MockProcessInvoker {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                calls: Arc::new(Mutex::new(Vec::new())),
                unavailable: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_responding(result: ProcessInvocationResult) -> Self {
            Self::new(MockBehavior::Respond(result))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        /// Report `program` as missing from `is_available`
        pub fn mark_unavailable(&self, program: impl Into<PathBuf>) {
            self.unavailable.lock().unwrap().push(program.into());
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<InvocationSpec> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessInvoker for MockProcessInvoker {
        async fn invoke(&self, spec: &InvocationSpec) -> ProcessInvocationResult {
            self.calls.lock().unwrap().push(spec.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Respond(result) => result,
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg);
                }
            }
        }

        async fn is_available(&self, program: &Path) -> bool {
            !self
                .unavailable
                .lock()
                .unwrap()
                .iter()
                .any(|p| p == program)
        }
    }
}
