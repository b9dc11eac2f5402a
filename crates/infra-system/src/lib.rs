// jqlite Infrastructure - System Adapters
// Implements: ProcessInvoker, InputStore

pub mod process_invoker;
pub mod temp_input_store;

pub use process_invoker::{BoundedProcessInvoker, DEFAULT_ENV_ALLOWLIST, DEFAULT_KILL_GRACE};
pub use temp_input_store::{default_input_dir, TempFileInputStore};
