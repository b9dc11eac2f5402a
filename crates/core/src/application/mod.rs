// Application Layer - Use Cases and Business Logic

pub mod bridge;
pub mod classifier;
pub mod panic_guard;
pub mod shutdown;
pub mod transcoder;

// Re-exports
pub use bridge::QueryBridge;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
