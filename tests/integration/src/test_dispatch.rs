//! Request marshalling through the full dispatch path.

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use hyper::service::service_fn;
    use rustack_lambda_proxy::{
        DispatchError, InvocationDispatcher, ProxyConfig, RequestError, ServiceProcessor,
    };

    use crate::{config, echo, gateway_event, lambda_context};

    fn echo_body(response: &serde_json::Value) -> serde_json::Value {
        let body = response["body"].as_str().expect("text body");
        serde_json::from_str(body).expect("echo payload")
    }

    #[tokio::test]
    async fn test_should_echo_marshalled_request() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo)), &config(false));
        let mut event = gateway_event("GET", "users/42");
        event["queryStringParameters"] = serde_json::json!({ "q": "a b", "page": "2" });

        let lambda = lambda_context();
        let request_id = lambda.request_id.clone();
        let response = dispatcher.dispatch_json(event, lambda).await.unwrap();

        assert_eq!(response["statusCode"], 200);
        assert_eq!(response["isBase64Encoded"], false);
        assert_eq!(response["headers"]["content-type"], "application/json");

        let echoed = echo_body(&response);
        assert_eq!(echoed["method"], "GET");
        assert_eq!(echoed["path"], "/users/42");
        assert_eq!(echoed["query"], "q=a%20b&page=2");
        assert_eq!(echoed["headers"]["host"], "apigateway-r7x1bq-prod");
        assert_eq!(echoed["headers"]["user-agent"], "curl/8.5.0");
        assert_eq!(echoed["requestId"], request_id.as_str());
        assert_eq!(echoed["stage"], "prod");
    }

    #[tokio::test]
    async fn test_should_keep_host_header_from_event() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo)), &config(false));
        let mut event = gateway_event("GET", "health");
        event["headers"]["Host"] = "api.example.com".into();

        let response = dispatcher
            .dispatch_json(event, lambda_context())
            .await
            .unwrap();

        assert_eq!(echo_body(&response)["headers"]["host"], "api.example.com");
    }

    #[tokio::test]
    async fn test_should_decode_base64_request_body() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo)), &config(false));
        let mut event = gateway_event("POST", "widgets");
        event["body"] = BASE64.encode(br#"{"name":"widget"}"#).into();
        event["isBase64Encoded"] = true.into();

        let response = dispatcher
            .dispatch_json(event, lambda_context())
            .await
            .unwrap();

        let echoed = echo_body(&response);
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["body"], r#"{"name":"widget"}"#);
    }

    #[tokio::test]
    async fn test_should_decode_and_reencode_path() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo)), &config(false));
        let event = gateway_event("GET", "files/report%202024.txt");

        let response = dispatcher
            .dispatch_json(event, lambda_context())
            .await
            .unwrap();

        assert_eq!(echo_body(&response)["path"], "/files/report%202024.txt");
    }

    #[tokio::test]
    async fn test_should_reject_invalid_forwarded_port() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo)), &config(false));
        let mut event = gateway_event("GET", "users");
        event["headers"]["X-Forwarded-Port"] = "https".into();

        let err = dispatcher
            .dispatch_json(event, lambda_context())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Request(RequestError::InvalidForwardedPort { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_reject_undecodable_base64_body() {
        let dispatcher = InvocationDispatcher::new(
            ServiceProcessor::new(service_fn(echo)),
            &ProxyConfig::default(),
        );
        let mut event = gateway_event("POST", "widgets");
        event["body"] = "not*base64".into();
        event["isBase64Encoded"] = true.into();

        let err = dispatcher
            .dispatch_json(event, lambda_context())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Request(RequestError::InvalidBase64Body(_))
        ));
    }

    #[tokio::test]
    async fn test_should_reject_event_of_wrong_shape() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo)), &config(false));

        let err = dispatcher
            .dispatch_json(serde_json::json!("GET /users"), lambda_context())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidEvent(_)));
    }
}
