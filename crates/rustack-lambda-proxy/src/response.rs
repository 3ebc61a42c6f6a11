//! HTTP response features to proxy response.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use rustack_lambda_proxy_model::ProxyResponse;

use crate::encoding::{EncodingPolicy, ResponseContentEncoding};
use crate::features::HttpResponseFeatures;

/// Content type header name.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Builds [`ProxyResponse`] documents, choosing the body encoding through the
/// [`EncodingPolicy`] it owns.
#[derive(Debug, Clone, Default)]
pub struct ResponseMarshaller {
    encoding: EncodingPolicy,
}

impl ResponseMarshaller {
    /// Create a marshaller using the given encoding policy.
    #[must_use]
    pub fn new(encoding: EncodingPolicy) -> Self {
        Self { encoding }
    }

    /// The encoding policy.
    #[must_use]
    pub fn encoding(&self) -> &EncodingPolicy {
        &self.encoding
    }

    /// Mutable access to the encoding policy, for registration at startup.
    pub fn encoding_mut(&mut self) -> &mut EncodingPolicy {
        &mut self.encoding
    }

    /// Convert response features into a proxy response.
    ///
    /// The body is consumed from `features`. `status_code_if_unset` applies
    /// when the processor left the status at `0`.
    pub fn marshal(
        &self,
        features: &mut HttpResponseFeatures,
        status_code_if_unset: u16,
    ) -> ProxyResponse {
        let status_code = if features.status_code == 0 {
            status_code_if_unset
        } else {
            features.status_code
        };

        let mut response = ProxyResponse {
            status_code,
            ..ProxyResponse::default()
        };

        let mut content_type = None;
        for (name, values) in features.headers.iter() {
            let value = match values {
                [single] => single.clone(),
                many => many.join(","),
            };
            if name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
                content_type = values.first().cloned();
            }
            response.headers.insert(name.to_owned(), value);
        }

        if let Some(body) = features.take_body() {
            let mode = self.encoding.resolve(content_type.as_deref());
            match mode {
                ResponseContentEncoding::Base64 => {
                    response.body = Some(BASE64.encode(&body));
                    response.is_base64_encoded = true;
                }
                ResponseContentEncoding::Default => {
                    let text = String::from_utf8_lossy(&body);
                    if matches!(text, Cow::Owned(_)) {
                        tracing::warn!(
                            content_type = content_type.as_deref().unwrap_or_default(),
                            "response body is not valid UTF-8, invalid sequences replaced",
                        );
                    }
                    response.body = Some(text.into_owned());
                    response.is_base64_encoded = false;
                }
            }
            tracing::debug!(
                status_code,
                mode = %mode,
                body_len = body.len(),
                "marshalled proxy response",
            );
        }

        response
    }
}
