// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, http, HeaderMap, Response, StatusCode};
use serde_json::json;
use tracing::{error, info};

pub type HttpResponse = Response<Full<Bytes>>;

/// Does two things:
/// - Logs the given message. A success status code (within 200-299) will cause an info log to be
///   written, otherwise error will be written.
/// - Returns the given message in the body of JSON response with the given status code.
///
/// Response body format:
/// {
///     "message": message
/// }
pub fn log_and_create_http_response(
    message: &str,
    status: StatusCode,
) -> http::Result<HttpResponse> {
    if status.is_success() {
        info!("{message}");
    } else {
        error!("{message}");
    }
    let body = json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
}

/// Checks the declared `Content-Length` of a request against `max_content_length`.
///
/// Returns an error response when the header is not a number or exceeds the limit, `None` when
/// the request can proceed. A request without the header is let through, its body is still capped
/// while it is read.
pub fn verify_request_content_length(
    header_map: &HeaderMap,
    max_content_length: usize,
    error_message_prefix: &str,
) -> Option<http::Result<HttpResponse>> {
    let content_length_header = header_map.get(header::CONTENT_LENGTH)?;
    let content_length = match content_length_header
        .to_str()
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
    {
        Some(content_length) => content_length,
        None => {
            return Some(log_and_create_http_response(
                &format!("{error_message_prefix}: Invalid Content-Length header"),
                StatusCode::BAD_REQUEST,
            ));
        }
    };
    if content_length > max_content_length {
        return Some(log_and_create_http_response(
            &format!("{error_message_prefix}: Payload too large"),
            StatusCode::PAYLOAD_TOO_LARGE,
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::HeaderValue;

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn headers(content_length: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            header::CONTENT_LENGTH,
            HeaderValue::from_str(content_length).unwrap(),
        );
        map
    }

    #[tokio::test]
    async fn test_log_and_create_http_response() {
        let response = log_and_create_http_response("all good", StatusCode::OK).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_json(response).await,
            json!({ "message": "all good" })
        );

        let response =
            log_and_create_http_response("went wrong", StatusCode::BAD_GATEWAY).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_request_content_length_too_large() {
        let response = verify_request_content_length(&headers("2048"), 1024, "Error")
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Error: Payload too large" })
        );
    }

    #[test]
    fn test_request_content_length_invalid() {
        let response = verify_request_content_length(&headers("lots"), 1024, "Error")
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_content_length_accepted() {
        assert!(verify_request_content_length(&headers("1024"), 1024, "Error").is_none());
        assert!(verify_request_content_length(&HeaderMap::new(), 1024, "Error").is_none());
    }
}
