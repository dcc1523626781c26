use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use fanout_core::contract::Protocol;
use fanout_core::outcome::{ExecutionResult, ResponseRecord};
use fanout_core::template::RenderedRequest;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Url};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("invalid request URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("invalid request method '{0}'")]
    InvalidMethod(String),
    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },
    #[error("request to '{uri}' timed out")]
    Timeout { uri: String },
    #[error("request to '{uri}' failed: {message}")]
    Transport { uri: String, message: String },
}

/// Issues one rendered request and normalizes whatever happens into an
/// [`ExecutionResult`]. Exactly one attempt is made.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, protocol: Protocol, request: &RenderedRequest) -> ExecutionResult;
}

/// `reqwest`-backed executor. Any HTTP response counts as a success whatever
/// its status; only transport-level problems become failures.
///
/// Redirects are never followed, including for `GET`, unlike clients that
/// chase them by default. A `3xx` is stored as the response to the rendered
/// request, with its `location` header intact.
#[derive(Debug, Clone)]
pub struct HttpRequestExecutor {
    client: Client,
}

impl HttpRequestExecutor {
    pub fn new(timeout: Duration) -> Result<Self, ExecuteError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(ExecuteError::ClientBuild)?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        protocol: Protocol,
        request: &RenderedRequest,
    ) -> Result<ResponseRecord, ExecuteError> {
        let uri = request.uri(protocol);
        let url = Url::parse(&uri).map_err(|error| ExecuteError::InvalidUri {
            uri: uri.clone(),
            reason: error.to_string(),
        })?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ExecuteError::InvalidMethod(request.method.clone()))?;
        let headers = forwarded_headers(&request.headers)?;

        info!(
            component = "request_executor",
            event = "request_issued",
            method = %method,
            uri = %uri,
        );

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| transport_error(&uri, error))?;
        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|error| transport_error(&uri, error))?;

        Ok(ResponseRecord {
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
            status,
            hostname: request.host.clone(),
        })
    }
}

#[async_trait]
impl RequestExecutor for HttpRequestExecutor {
    async fn execute(&self, protocol: Protocol, request: &RenderedRequest) -> ExecutionResult {
        match self.send(protocol, request).await {
            Ok(response) => ExecutionResult::Success(response),
            Err(error) => ExecutionResult::failure(error),
        }
    }
}

/// Template headers to send as-is. Framing headers are left to the client
/// because substitution usually changes the body length.
fn forwarded_headers(headers: &[(String, String)]) -> Result<HeaderMap, ExecuteError> {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| ExecuteError::InvalidHeader {
                name: name.clone(),
            })?;
        if header_name == CONTENT_LENGTH || header_name == TRANSFER_ENCODING {
            continue;
        }
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ExecuteError::InvalidHeader {
                name: name.clone(),
            })?;
        forwarded.append(header_name, header_value);
    }
    Ok(forwarded)
}

fn response_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    collected
}

fn transport_error(uri: &str, error: reqwest::Error) -> ExecuteError {
    if error.is_timeout() {
        return ExecuteError::Timeout {
            uri: uri.to_string(),
        };
    }
    ExecuteError::Transport {
        uri: uri.to_string(),
        message: error_chain(&error),
    }
}

fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn framing_headers_are_not_forwarded() {
        let forwarded = forwarded_headers(&[
            header("Host", "x.com"),
            header("Content-Length", "3"),
            header("Transfer-Encoding", "chunked"),
            header("X-Trace", "abc"),
        ])
        .expect("headers should be valid");

        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded.get("host").map(HeaderValue::as_bytes), Some(&b"x.com"[..]));
        assert!(forwarded.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn repeated_template_headers_are_all_forwarded() {
        let forwarded =
            forwarded_headers(&[header("Cookie", "a=1"), header("Cookie", "b=2")]).expect("valid");
        assert_eq!(forwarded.get_all("cookie").iter().count(), 2);
    }

    #[test]
    fn rejects_invalid_header_name() {
        let error = forwarded_headers(&[header("Bad Header", "x")]).expect_err("should fail");
        assert!(matches!(error, ExecuteError::InvalidHeader { name } if name == "Bad Header"));
    }

    #[test]
    fn repeated_response_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.append("content-type", HeaderValue::from_static("text/html"));

        let collected = response_headers(&headers);
        assert_eq!(collected["set-cookie"], "a=1, b=2");
        assert_eq!(collected["content-type"], "text/html");
    }

    #[tokio::test]
    async fn invalid_method_is_a_failure_without_network() {
        let executor = HttpRequestExecutor::new(Duration::from_secs(1)).expect("client builds");
        let request = RenderedRequest {
            method: "G@T".to_string(),
            target: "/".to_string(),
            host: "x.com".to_string(),
            headers: vec![header("Host", "x.com")],
            body: None,
        };

        let outcome = executor.execute(Protocol::Https, &request).await;
        assert_eq!(
            outcome,
            ExecutionResult::failure("invalid request method 'G@T'")
        );
    }

    #[tokio::test]
    async fn unparsable_uri_is_a_failure() {
        let executor = HttpRequestExecutor::new(Duration::from_secs(1)).expect("client builds");
        let request = RenderedRequest {
            method: "GET".to_string(),
            target: "/".to_string(),
            host: "bad host".to_string(),
            headers: vec![header("Host", "bad host")],
            body: None,
        };

        let outcome = executor.execute(Protocol::Http, &request).await;
        match outcome {
            ExecutionResult::Failure { error } => {
                assert!(error.starts_with("invalid request URI 'http://bad host/'"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
