//! Shared HTTP plumbing for talking to a Lumen server.
//!
//! Every operation in the crate goes through [`request`]: one place that
//! attaches the API key header, serializes bodies, checks the expected
//! status, and decodes either the payload or the engine's error body.

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::errors::{EngineErrorBody, Error, Result};

/// Header carrying the API key on secured instances.
pub(crate) const API_KEY_HEADER: &str = "X-Lumen-API-Key";

/// HTTP method plus request body, where one is required.
pub(crate) enum Method<B: Serialize> {
    Get,
    Post(B),
    Put(B),
    Delete,
}

impl<B: Serialize> Method<B> {
    fn name(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post(_) => "POST",
            Self::Put(_) => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Send a request and decode the JSON response.
///
/// A response with `expected` status is decoded into `T` (an empty body is
/// treated as JSON `null`, so `T = ()` works for 204-style endpoints). Any
/// other status is decoded into the engine's error payload when possible.
pub(crate) async fn request<B: Serialize, T: DeserializeOwned>(
    http: &Client,
    url: &str,
    api_key: Option<&str>,
    method: Method<B>,
    expected: StatusCode,
) -> Result<T> {
    debug!(method = method.name(), %url, "sending request");

    let mut builder = match &method {
        Method::Get => http.get(url),
        Method::Post(_) => http.post(url),
        Method::Put(_) => http.put(url),
        Method::Delete => http.delete(url),
    };

    if let Some(key) = api_key {
        builder = builder.header(API_KEY_HEADER, key);
    }

    if let Method::Post(body) | Method::Put(body) = &method {
        builder = builder.json(body);
    }

    let response = builder.send().await?;
    parse_response(response, expected).await
}

/// Check the status and decode the body of a response.
async fn parse_response<T: DeserializeOwned>(
    response: Response,
    expected: StatusCode,
) -> Result<T> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await?;

    trace!(%url, status = status.as_u16(), body_len = body.len(), "response received");

    if status == expected {
        // Empty bodies decode as `null` so `T = ()` round-trips 204s.
        let payload = if body.is_empty() { "null" } else { body.as_str() };
        return serde_json::from_str(payload).map_err(|e| Error::decode(&url, e));
    }

    match serde_json::from_str::<EngineErrorBody>(&body) {
        Ok(engine) => Err(engine.into()),
        Err(_) => Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            url,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn decodes_expected_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/value"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"answer": 42}"#))
            .mount(&server)
            .await;

        #[derive(serde::Deserialize)]
        struct Payload {
            answer: u32,
        }

        let http = Client::new();
        let payload: Payload = request::<(), Payload>(
            &http,
            &format!("{}/value", server.uri()),
            None,
            Method::Get,
            StatusCode::OK,
        )
        .await
        .unwrap();

        assert_eq!(payload.answer, 42);
    }

    #[tokio::test]
    async fn empty_body_decodes_as_unit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let http = Client::new();
        request::<(), ()>(
            &http,
            &format!("{}/thing", server.uri()),
            None,
            Method::Delete,
            StatusCode::NO_CONTENT,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn engine_error_body_surfaces_as_engine_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"message": "not here", "errorCode": "document_not_found", "errorType": "invalid_request_error"}"#,
            ))
            .mount(&server)
            .await;

        let http = Client::new();
        let err = request::<(), serde_json::Value>(
            &http,
            &format!("{}/missing", server.uri()),
            None,
            Method::Get,
            StatusCode::OK,
        )
        .await
        .unwrap_err();

        assert!(err.is_code(ErrorCode::DocumentNotFound));
    }

    #[tokio::test]
    async fn undecodable_error_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oops"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let http = Client::new();
        let err = request::<(), serde_json::Value>(
            &http,
            &format!("{}/oops", server.uri()),
            None,
            Method::Get,
            StatusCode::OK,
        )
        .await
        .unwrap_err();

        match err {
            Error::UnexpectedStatus { status, .. } => assert_eq!(status, 502),
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_key_header_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secured"))
            .and(header(API_KEY_HEADER, "masterKey"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let http = Client::new();
        let result: serde_json::Value = request::<(), serde_json::Value>(
            &http,
            &format!("{}/secured", server.uri()),
            Some("masterKey"),
            Method::Get,
            StatusCode::OK,
        )
        .await
        .unwrap();

        assert!(result.as_object().is_some());
    }
}
