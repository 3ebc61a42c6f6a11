//! Failure containment, rethrow mode and teardown tests.

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use http_body_util::Full;
    use hyper::service::service_fn;
    use rustack_lambda_proxy::{
        DispatchError, InvocationContext, InvocationDispatcher, ProcessorError, ProxyProcessor,
        ServiceProcessor,
    };

    use crate::{config, gateway_event, lambda_context};

    #[derive(Debug)]
    struct BackendDown;

    impl fmt::Display for BackendDown {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("backend connection refused")
        }
    }

    impl std::error::Error for BackendDown {}

    async fn failing(
        _req: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Full<Bytes>>, BackendDown> {
        Err(BackendDown)
    }

    /// Fails in a configurable way and counts teardowns.
    #[derive(Debug, Default)]
    struct Flaky {
        teardowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProxyProcessor for Flaky {
        async fn process(&self, ctx: &mut InvocationContext) -> Result<(), ProcessorError> {
            let teardowns = Arc::clone(&self.teardowns);
            ctx.on_teardown(move || {
                teardowns.fetch_add(1, Ordering::SeqCst);
            });

            match ctx.request.path.as_str() {
                "/fanout" => Err(ProcessorError::aggregate([
                    ProcessorError::unclassified(BackendDown),
                    ProcessorError::msg("Timeout", "shard 2 timed out"),
                ])),
                "/plugin" => Err(ProcessorError::load(
                    "image-resizer",
                    Some("libvips.so.42".to_owned()),
                )),
                "/degraded" => {
                    ctx.response.status_code = 503;
                    ctx.response.headers.insert("Retry-After", "30");
                    Err(anyhow::anyhow!("dependency degraded").into())
                }
                "/hang" => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
                _ => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn test_should_contain_service_failure() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(failing)), &config(false));

        let response = dispatcher
            .dispatch_json(gateway_event("GET", "orders"), lambda_context())
            .await
            .unwrap();

        assert_eq!(response["statusCode"], 500);
        assert_eq!(response["headers"]["ErrorType"], "BackendDown");
        assert!(response.get("body").is_none());
    }

    #[tokio::test]
    async fn test_should_rethrow_with_ready_response() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(failing)), &config(true));

        let err = dispatcher
            .dispatch_json(gateway_event("GET", "orders"), lambda_context())
            .await
            .unwrap_err();

        match err {
            DispatchError::Rethrown { failure, response } => {
                assert_eq!(failure.classification_name(), "BackendDown");
                assert_eq!(failure.to_string(), "backend connection refused");
                assert_eq!(response.status_code, 500);
                assert_eq!(response.header("ErrorType"), Some("BackendDown"));
            }
            other => panic!("expected rethrown failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_classify_aggregate_and_load_failures() {
        let dispatcher = InvocationDispatcher::new(Flaky::default(), &config(false));

        let aggregate = dispatcher
            .dispatch_json(gateway_event("GET", "fanout"), lambda_context())
            .await
            .unwrap();
        assert_eq!(aggregate["statusCode"], 500);
        assert_eq!(aggregate["headers"]["ErrorType"], "AggregateFailure");

        let load = dispatcher
            .dispatch_json(gateway_event("GET", "plugin"), lambda_context())
            .await
            .unwrap();
        assert_eq!(load["headers"]["ErrorType"], "LoadFailure");

        assert_eq!(dispatcher.processor().teardowns.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_should_keep_partial_response_on_failure() {
        let dispatcher = InvocationDispatcher::new(Flaky::default(), &config(false));

        let response = dispatcher
            .dispatch_json(gateway_event("GET", "degraded"), lambda_context())
            .await
            .unwrap();

        assert_eq!(response["statusCode"], 503);
        assert_eq!(response["headers"]["Retry-After"], "30");
        assert_eq!(response["headers"]["ErrorType"], "Error");
    }

    #[tokio::test]
    async fn test_should_tear_down_once_in_every_mode() {
        for rethrow in [false, true] {
            let dispatcher = InvocationDispatcher::new(Flaky::default(), &config(rethrow));
            for path in ["ok", "fanout", "plugin", "degraded"] {
                let _ = dispatcher
                    .dispatch_json(gateway_event("GET", path), lambda_context())
                    .await;
            }
            assert_eq!(dispatcher.processor().teardowns.load(Ordering::SeqCst), 4);
        }
    }

    #[tokio::test]
    async fn test_should_tear_down_when_dispatch_is_cancelled() {
        let dispatcher = InvocationDispatcher::new(Flaky::default(), &config(false));

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            dispatcher.dispatch_json(gateway_event("GET", "hang"), lambda_context()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(dispatcher.processor().teardowns.load(Ordering::SeqCst), 1);
    }
}
