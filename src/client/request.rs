use crate::error::Error;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::Serialize;

/// Replayable description of an outbound request. The body is buffered so the
/// request can be reissued after a token refresh.
///
/// Authentication is owned by the client: any `Authorization` header supplied
/// here is dropped.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// `target` is either a path resolved against the base URL or an absolute URL.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Adds a header.
    ///
    /// # Errors
    /// Returns `Error::InvalidRequest` if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|err| Error::InvalidRequest(format!("Invalid header name {name}: {err}")))?;
        if name == AUTHORIZATION {
            return Ok(self);
        }
        let value = HeaderValue::from_str(value.trim())
            .map_err(|err| Error::InvalidRequest(format!("Invalid header value for {name}: {err}")))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Encodes `body` as JSON and sets the content type.
    ///
    /// # Errors
    /// Returns `Error::InvalidRequest` if the body cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| Error::InvalidRequest(format!("Failed to encode request: {err}")))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(payload);
        Ok(self)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Parses a curl-style `Name: value` header line.
///
/// # Errors
/// Returns `Error::InvalidRequest` if the line has no colon or an empty name.
pub fn parse_header_line(line: &str) -> Result<(String, String), Error> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::InvalidRequest(format!("Invalid header {line}: expected Name: value")))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidRequest(format!(
            "Invalid header {line}: empty name"
        )));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_caller_authorization_is_dropped() {
        let request = ApiRequest::get("/v1/me")
            .header("Authorization", "Bearer smuggled")
            .unwrap()
            .header("X-Request-Id", "abc")
            .unwrap();

        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.headers().get("x-request-id").unwrap(), "abc");
    }

    #[test]
    fn test_invalid_header_name() {
        let result = ApiRequest::get("/").header("bad header", "x");
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = ApiRequest::post("/v1/generations")
            .json(&json!({ "prompt": "a lighthouse" }))
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            request.body_bytes().unwrap(),
            br#"{"prompt":"a lighthouse"}"#
        );
    }

    #[test]
    fn test_parse_header_line() {
        assert_eq!(
            parse_header_line("Accept: application/json").unwrap(),
            ("Accept".to_string(), "application/json".to_string())
        );
        assert_eq!(
            parse_header_line("X-Empty:").unwrap(),
            ("X-Empty".to_string(), String::new())
        );
        assert!(parse_header_line("no-colon").is_err());
        assert!(parse_header_line(": value").is_err());
    }
}
