//! Response body encoding tests.

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use bytes::Bytes;
    use http_body_util::Full;
    use hyper::service::service_fn;
    use rustack_lambda_proxy::{
        InvocationDispatcher, ProxyConfig, ResponseContentEncoding, ServiceProcessor,
    };

    use crate::{PIXEL_PNG, assets, config, gateway_event, lambda_context};

    async fn typed(
        _req: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Full<Bytes>>, Infallible> {
        Ok(http::Response::builder()
            .header("Content-Type", "application/vnd.acme+cbor")
            .body(Full::new(Bytes::from_static(&[0xa1, 0x61, 0x61, 0x01])))
            .unwrap_or_default())
    }

    #[tokio::test]
    async fn test_should_base64_encode_png_response() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(assets)), &config(false));

        let response = dispatcher
            .dispatch(
                serde_json::from_value(gateway_event("GET", "pixel.png")).unwrap(),
                lambda_context(),
            )
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert!(response.is_base64_encoded);
        assert_eq!(response.header("Content-Type"), Some("image/png"));
        assert_eq!(response.header("Cache-Control"), Some("max-age=60"));
        let body = BASE64.decode(response.body.unwrap()).unwrap();
        assert_eq!(body, PIXEL_PNG);
    }

    #[tokio::test]
    async fn test_should_send_text_error_page_as_text() {
        let dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(assets)), &config(false));

        let response = dispatcher
            .dispatch_json(gateway_event("GET", "missing.png"), lambda_context())
            .await
            .unwrap();

        assert_eq!(response["statusCode"], 404);
        assert_eq!(response["isBase64Encoded"], false);
        assert_eq!(response["body"], "not found");
        assert!(response["headers"].get("ErrorType").is_none());
    }

    #[tokio::test]
    async fn test_should_fall_back_to_configured_default_mode() {
        let text = InvocationDispatcher::new(
            ServiceProcessor::new(service_fn(typed)),
            &ProxyConfig::default(),
        );
        let response = text
            .dispatch_json(gateway_event("GET", "doc"), lambda_context())
            .await
            .unwrap();
        assert_eq!(response["isBase64Encoded"], false);

        let binary = InvocationDispatcher::new(
            ServiceProcessor::new(service_fn(typed)),
            &ProxyConfig::builder()
                .default_response_encoding(ResponseContentEncoding::Base64)
                .build(),
        );
        let response = binary
            .dispatch_json(gateway_event("GET", "doc"), lambda_context())
            .await
            .unwrap();
        assert_eq!(response["isBase64Encoded"], true);
        assert_eq!(response["body"], BASE64.encode([0xa1, 0x61, 0x61, 0x01]));
    }

    #[tokio::test]
    async fn test_should_honor_registered_content_type() {
        let mut dispatcher =
            InvocationDispatcher::new(ServiceProcessor::new(service_fn(typed)), &config(false));
        dispatcher
            .encoding_mut()
            .register("application/vnd.acme+cbor", ResponseContentEncoding::Base64);

        let response = dispatcher
            .dispatch_json(gateway_event("GET", "doc"), lambda_context())
            .await
            .unwrap();

        assert_eq!(response["isBase64Encoded"], true);
        assert_eq!(
            dispatcher.encoding().resolve(Some("application/vnd.acme+cbor")),
            ResponseContentEncoding::Base64
        );
    }
}
