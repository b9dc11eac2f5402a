// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod input_store;
pub mod process_invoker;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use input_store::{InputStore, StoreError, TransientInput};
pub use process_invoker::ProcessInvoker;
pub use time_provider::TimeProvider;
