// Query Bridge - one HTTP request -> one bounded engine invocation
//
// Lifecycle per request:
// Validating -> Preparing -> Invoking -> (Transcoding) -> Classified -> Cleanup -> Done
// Cleanup runs on every path, including a panic while invoking or transcoding.

use crate::application::classifier::{classify_query, classify_visualization};
use crate::application::panic_guard::{execute_guarded_async, PanicGuardResult};
use crate::domain::{
    EngineKind, EngineSettings, HealthReport, ProcessInvocationResult, QueryRequest,
    RawQueryRequest, ResponseEnvelope,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, InputStore, ProcessInvoker};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// Returned when the visualization executable does not exist
pub const VISUALIZATION_UNAVAILABLE: &str =
    "Visualization not available. Please build the visualization engine first.";

/// Query Bridge service (composition of the store, the invoker and the classifier)
pub struct QueryBridge {
    store: Arc<dyn InputStore>,
    invoker: Arc<dyn ProcessInvoker>,
    id_provider: Arc<dyn IdProvider>,
    settings: EngineSettings,
}

impl QueryBridge {
    pub fn new(
        store: Arc<dyn InputStore>,
        invoker: Arc<dyn ProcessInvoker>,
        id_provider: Arc<dyn IdProvider>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            invoker,
            id_provider,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// POST /api/query
    ///
    /// # Errors
    /// - AppError::Domain if a required field is missing (no process is started)
    /// - AppError::Store if the input cannot be written
    /// - AppError::Internal if the invocation panicked
    pub async fn query(&self, raw: RawQueryRequest) -> Result<ResponseEnvelope> {
        let request = raw.validate()?;
        let limits = self.settings.limits;

        self.run_scoped(EngineKind::Query, &request, move |result| {
            classify_query(result, &limits)
        })
        .await
    }

    /// POST /api/visualize
    ///
    /// A missing visualization executable is reported as a visualization
    /// failure, not a server fault.
    pub async fn visualize(&self, raw: RawQueryRequest) -> Result<ResponseEnvelope> {
        let request = raw.validate()?;

        if !self
            .invoker
            .is_available(&self.settings.visualization_engine)
            .await
        {
            warn!(
                path = %self.settings.visualization_engine.display(),
                "Visualization engine not found"
            );
            return Ok(ResponseEnvelope::visualization_failure(
                VISUALIZATION_UNAVAILABLE,
            ));
        }

        let limits = self.settings.limits;

        self.run_scoped(EngineKind::Visualization, &request, move |result| {
            classify_visualization(result, &limits)
        })
        .await
    }

    /// GET /api/health
    pub async fn health(&self) -> HealthReport {
        let query_engine = &self.settings.query_engine;
        let visualization_engine = &self.settings.visualization_engine;

        HealthReport {
            status: "ok".to_string(),
            jqlite_available: self.invoker.is_available(query_engine).await,
            jqlite_path: query_engine.display().to_string(),
            visualization_available: self.invoker.is_available(visualization_engine).await,
            visualization_path: visualization_engine.display().to_string(),
        }
    }

    /// Acquire the request's input, invoke, classify, release
    async fn run_scoped<C>(
        &self,
        kind: EngineKind,
        request: &QueryRequest,
        classify: C,
    ) -> Result<ResponseEnvelope>
    where
        C: FnOnce(&ProcessInvocationResult) -> ResponseEnvelope + Send,
    {
        let request_id = self.id_provider.generate_id();
        let span = info_span!("engine_request", request_id = %request_id, engine = %kind);

        async move {
            let input = match self.store.acquire(&request_id, &request.json_data).await {
                Ok(input) => input,
                Err(e) => return Err(AppError::from(e)),
            };
            let spec = self
                .settings
                .invocation(kind, &request.query_string, input.path());

            let outcome = execute_guarded_async(async {
                let result = self.invoker.invoke(&spec).await;
                classify(&result)
            })
            .await;

            self.store.release(input).await;

            match outcome {
                PanicGuardResult::Success(envelope) => {
                    info!(success = envelope.is_success(), "Request classified");
                    Ok(envelope)
                }
                PanicGuardResult::Panicked(msg) => Err(AppError::Internal(msg)),
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, ExitError};
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::input_store::mocks::MockInputStore;
    use crate::port::process_invoker::mocks::MockProcessInvoker;
    use serde_json::json;
    use std::path::PathBuf;

    struct Harness {
        bridge: QueryBridge,
        store: Arc<MockInputStore>,
        invoker: Arc<MockProcessInvoker>,
    }

    fn harness_with(store: MockInputStore, invoker: MockProcessInvoker) -> Harness {
        let store = Arc::new(store);
        let invoker = Arc::new(invoker);
        let bridge = QueryBridge::new(
            store.clone(),
            invoker.clone(),
            Arc::new(SequentialIdProvider::default()),
            EngineSettings::new("/opt/jqlite", "/opt/jqlite_viz"),
        );
        Harness {
            bridge,
            store,
            invoker,
        }
    }

    fn harness(result: ProcessInvocationResult) -> Harness {
        harness_with(
            MockInputStore::new(),
            MockProcessInvoker::new_responding(result),
        )
    }

    #[tokio::test]
    async fn test_query_success() {
        let h = harness(ProcessInvocationResult::exited("1\n", ""));

        let envelope = h
            .bridge
            .query(RawQueryRequest::new(r#"{"a":1}"#, ".a"))
            .await
            .unwrap();

        assert_eq!(envelope, ResponseEnvelope::success("1"));
        assert_eq!(
            h.store.acquired(),
            vec![("req-1".to_string(), r#"{"a":1}"#.to_string())]
        );
        assert!(h.store.outstanding().is_empty());
    }

    #[tokio::test]
    async fn test_query_passes_argv_contract() {
        let h = harness(ProcessInvocationResult::exited("", ""));

        h.bridge
            .query(RawQueryRequest::new("{}", ".a | keys"))
            .await
            .unwrap();

        let calls = h.invoker.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, PathBuf::from("/opt/jqlite"));
        assert_eq!(
            calls[0].args,
            vec![".a | keys", "/mock-input-store/input-req-1.json"]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_never_invokes() {
        let h = harness(ProcessInvocationResult::exited("1", ""));

        let err = h
            .bridge
            .query(RawQueryRequest {
                json_data: Some("{}".to_string()),
                query_string: None,
            })
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(matches!(
            err,
            AppError::Domain(DomainError::MissingRequiredFields)
        ));
        assert_eq!(h.invoker.call_count(), 0);
        assert!(h.store.acquired().is_empty());
    }

    #[tokio::test]
    async fn test_classified_failure_still_releases() {
        let h = harness(ProcessInvocationResult::failed(
            ExitError::NonZeroExit { code: 5 },
            "",
            "parse error\n",
        ));

        let envelope = h
            .bridge
            .query(RawQueryRequest::new("{}", ".["))
            .await
            .unwrap();

        assert_eq!(envelope, ResponseEnvelope::failure("parse error"));
        assert_eq!(h.store.released(), vec!["req-1".to_string()]);
    }

    #[tokio::test]
    async fn test_panicking_invoker_still_releases() {
        let h = harness_with(
            MockInputStore::new(),
            MockProcessInvoker::new_panic_inducing("invoker blew up"),
        );

        let err = h
            .bridge
            .query(RawQueryRequest::new("{}", ".a"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(ref msg) if msg == "invoker blew up"));
        assert_eq!(h.store.released(), vec!["req-1".to_string()]);
        assert!(h.store.outstanding().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_server_fault() {
        let h = harness_with(
            MockInputStore::new_failing(),
            MockProcessInvoker::new_responding(ProcessInvocationResult::exited("1", "")),
        );

        let err = h
            .bridge
            .query(RawQueryRequest::new("{}", ".a"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Store(_)));
        assert!(!err.is_validation());
        assert_eq!(h.invoker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_requests_are_independent() {
        let h = harness(ProcessInvocationResult::exited("1", ""));
        let raw = RawQueryRequest::new(r#"{"a":1}"#, ".a");

        h.bridge.query(raw.clone()).await.unwrap();
        h.bridge.query(raw).await.unwrap();

        assert_eq!(h.invoker.call_count(), 2);
        assert_eq!(
            h.store.released(),
            vec!["req-1".to_string(), "req-2".to_string()]
        );
        let calls = h.invoker.calls();
        assert_ne!(calls[0].args[1], calls[1].args[1]);
    }

    #[tokio::test]
    async fn test_visualize_success() {
        let h = harness(ProcessInvocationResult::exited(r#"{"steps":[1,2]}"#, ""));

        let envelope = h
            .bridge
            .visualize(RawQueryRequest::new("{}", ".a"))
            .await
            .unwrap();

        assert_eq!(
            envelope,
            ResponseEnvelope::VisualizationSuccess(json!({"steps": [1, 2]}))
        );
        assert_eq!(h.invoker.calls()[0].args[0], "--visualize");
        assert_eq!(
            h.invoker.calls()[0].program,
            PathBuf::from("/opt/jqlite_viz")
        );
    }

    #[tokio::test]
    async fn test_visualize_unavailable_engine() {
        let h = harness(ProcessInvocationResult::exited("{}", ""));
        h.invoker.mark_unavailable("/opt/jqlite_viz");

        let envelope = h
            .bridge
            .visualize(RawQueryRequest::new("{}", ".a"))
            .await
            .unwrap();

        assert_eq!(
            envelope,
            ResponseEnvelope::visualization_failure(VISUALIZATION_UNAVAILABLE)
        );
        assert_eq!(h.invoker.call_count(), 0);
        assert!(h.store.acquired().is_empty());
    }

    #[tokio::test]
    async fn test_visualize_validates_before_availability() {
        let h = harness(ProcessInvocationResult::exited("{}", ""));
        h.invoker.mark_unavailable("/opt/jqlite_viz");

        let err = h
            .bridge
            .visualize(RawQueryRequest::default())
            .await
            .unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_health_reports_availability() {
        let h = harness(ProcessInvocationResult::exited("", ""));
        h.invoker.mark_unavailable("/opt/jqlite");

        let report = h.bridge.health().await;

        assert_eq!(report.status, "ok");
        assert!(!report.jqlite_available);
        assert_eq!(report.jqlite_path, "/opt/jqlite");
        assert!(report.visualization_available);
        assert_eq!(report.visualization_path, "/opt/jqlite_viz");
    }
}
