// Domain Layer - Pure business logic and entities

pub mod engine;
pub mod envelope;
pub mod error;
pub mod invocation;
pub mod request;

// Re-exports
pub use engine::{EngineKind, EngineSettings, HealthReport};
pub use envelope::ResponseEnvelope;
pub use error::DomainError;
pub use invocation::{
    ExitError, InvocationLimits, InvocationSpec, OverflowPolicy, ProcessInvocationResult,
};
pub use request::{QueryRequest, RawQueryRequest};
