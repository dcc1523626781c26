//! Placeholder substitution and HTTP/1.x request-text parsing.
//!
//! Substitution is a literal, global replace per payload key, applied in the
//! payload's key order over the whole template (request line, headers and
//! body alike). A key processed later can match inside text inserted by an
//! earlier key; that order sensitivity is part of the rendering contract.

use thiserror::Error;

use crate::contract::{Payload, Protocol};

const HOST_HEADER: &str = "host";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("No valid host header found")]
    MissingHost,
    #[error("Malformed request line: '{0}'")]
    MalformedRequestLine(String),
    #[error("Malformed header line: '{0}'")]
    MalformedHeader(String),
}

/// A template rendered for one payload and parsed into request parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRequest {
    pub method: String,
    /// Request target exactly as written on the request line.
    pub target: String,
    /// Value of the `Host` header, used for the URI and record naming.
    pub host: String,
    /// Parsed headers in template order, `Host` included.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RenderedRequest {
    pub fn uri(&self, protocol: Protocol) -> String {
        format!("{protocol}://{}{}", self.host, self.target)
    }
}

pub fn render(raw_request: &str, payload: &Payload) -> Result<RenderedRequest, RenderError> {
    let substituted = substitute(raw_request, payload);
    parse_request(&substituted)
}

pub fn substitute(raw_request: &str, payload: &Payload) -> String {
    payload
        .substitutions()
        .fold(raw_request.to_string(), |text, (key, value)| {
            text.replace(key, &value)
        })
}

/// Parses request text: request line, header block up to the first blank
/// line, then the body. Lines may end in CRLF or LF.
pub fn parse_request(text: &str) -> Result<RenderedRequest, RenderError> {
    let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ').filter(|part| !part.is_empty());
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(RenderError::MalformedRequestLine(request_line.to_string()));
    };

    let mut headers = Vec::new();
    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(RenderError::MalformedHeader(line.to_string()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(RenderError::MalformedHeader(line.to_string()));
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }

    let body = lines.collect::<Vec<_>>().join("\r\n");

    // Last matching header wins when the template repeats Host.
    let host = headers
        .iter()
        .rev()
        .find(|(name, _)| name.eq_ignore_ascii_case(HOST_HEADER))
        .map(|(_, value)| value.clone())
        .filter(|value| !value.is_empty())
        .ok_or(RenderError::MissingHost)?;

    Ok(RenderedRequest {
        method: method.to_string(),
        target: target.to_string(),
        host,
        headers,
        body: (!body.is_empty()).then_some(body),
    })
}
