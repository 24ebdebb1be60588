//! # Interceptor
//!
//! The single interception point between a caller and its HTTP transport.
//! Spreadsheet requests are rewritten to the CSV export endpoint and their
//! response bodies are replaced with JSON; every other request passes through
//! untouched.
use crate::error::RetrosheetError;
use crate::resolver::options::RequestOptions;
use crate::resolver::ResolverError::MissingFieldError;
use crate::resolver::{is_spreadsheet_url, rewrite, SHEET_QUERY_PARAMETER};
use crate::transcoder::transcode;
use crate::transcoder::TranscoderError::CsvFormatError;
use std::fmt::Debug;
use std::io::{Cursor, Read};
use tracing::{debug, info, trace};
use url::Url;

#[cfg(feature = "reqwest")]
pub mod http;

/// Content type of a transcoded response.
pub const JSON_CONTENT_TYPE: &str = "application/json";

const CONTENT_TYPE: &str = "content-type";
const CONTENT_LENGTH: &str = "content-length";

/// Headers describing the transport's body, invalid once the body is replaced.
const BODY_HEADERS: [&str; 4] = [CONTENT_TYPE, CONTENT_LENGTH, "transfer-encoding", "content-encoding"];

/// A response or request body, read once as a byte stream.
pub struct Body {
    reader: Box<dyn Read + Send>,
}

impl Body {
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Body { reader: Box::new(reader) }
    }

    /// Reads the whole body as UTF-8 text.
    pub fn into_string(mut self) -> std::io::Result<String> {
        let mut text = String::new();
        self.reader.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::from_reader(Cursor::new(text.into_bytes()))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::from_reader(text.as_bytes())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::from_reader(Cursor::new(bytes))
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Body { .. }")
    }
}

/// An outgoing request as seen by the interceptor.
#[derive(Debug)]
pub struct Request {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    options: Option<RequestOptions>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Request {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            options: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attaches the per-endpoint spreadsheet options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Replaces the target URL, keeping everything else.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn options(&self) -> Option<&RequestOptions> {
        self.options.as_ref()
    }

    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Returns the first value of a query parameter, percent-decoded.
    pub fn query_parameter(&self, name: &str) -> Result<Option<String>, RetrosheetError> {
        let url = Url::parse(&self.url)?;
        let value = url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned());
        Ok(value)
    }
}

/// A response returned by the transport.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Option<Body>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Response {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the body with fully buffered content.
    ///
    /// Type, length and framing headers of the previous body are dropped, and
    /// `content-type` and `content-length` are set for the new one.
    pub fn with_content(mut self, content: String, content_type: &str) -> Self {
        self.headers.retain(|(name, _)| {
            !BODY_HEADERS.iter().any(|header| name.eq_ignore_ascii_case(header))
        });
        self.headers.push((CONTENT_TYPE.to_owned(), content_type.to_owned()));
        self.headers.push((CONTENT_LENGTH.to_owned(), content.len().to_string()));
        self.with_body(content)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    pub fn into_body(self) -> Option<Body> {
        self.body
    }
}

/// The HTTP pipeline the interceptor forwards requests to.
pub trait Transport {
    /// Executes a request and returns its response.
    fn execute(&self, request: Request) -> anyhow::Result<Response>;
}

impl<F> Transport for F
where
    F: Fn(Request) -> anyhow::Result<Response>,
{
    fn execute(&self, request: Request) -> anyhow::Result<Response> {
        self(request)
    }
}

/// Serves published Google Sheets pages as JSON.
///
/// Holds no per-request state, so one instance can be shared by any number of
/// concurrent callers.
#[derive(Clone, Debug, Default)]
pub struct RetrosheetInterceptor {
    /// Log rewritten URLs and produced documents at info instead of debug
    logging: bool,
}

impl RetrosheetInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.logging
    }

    /// Runs one request through the interceptor.
    ///
    /// Requests whose URL does not start with the spreadsheet prefix are
    /// forwarded as-is and their response is returned untouched. Spreadsheet
    /// requests are rewritten, forwarded, and answered with the JSON document
    /// built from the CSV body.
    ///
    /// # Errors
    ///
    /// * Resolver errors if a spreadsheet URL is malformed
    /// * Transcoder errors if the CSV body is absent or invalid
    /// * Transport errors from the underlying pipeline
    pub fn intercept<T: Transport + ?Sized>(&self, request: Request, transport: &T) -> Result<Response, RetrosheetError> {
        if !is_spreadsheet_url(request.url()) {
            trace!(url = request.url(), "Passing through");
            return Ok(transport.execute(request)?);
        }

        let source_url = request.url().to_owned();
        let target_url = rewrite(&source_url, request.options())?;
        if self.logging {
            info!(url = %target_url, "GET -->");
        } else {
            debug!(url = %target_url, "GET -->");
        }

        let request = request.with_url(target_url);
        let page_name = request
            .query_parameter(SHEET_QUERY_PARAMETER)?
            .ok_or_else(|| MissingFieldError { field: "pageName", url: source_url.clone() })?;

        let mut response = transport.execute(request)?;
        let body = response.take_body().ok_or_else(|| CsvFormatError {
            message: format!("Failed to get CSV data from '{source_url}'"),
        })?;
        let document = transcode(body, &page_name)?;
        if self.logging {
            info!(document = %document, "GET <---");
        } else {
            debug!(document = %document, "GET <---");
        }

        Ok(response.with_content(document, JSON_CONTENT_TYPE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverError;
    use crate::transcoder::TranscoderError;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/doc123/Sheet1";

    /// Transport that records every request it receives and answers with a fixed CSV body.
    struct RecordingTransport {
        csv: &'static str,
        seen: Mutex<Vec<(String, String, Vec<(String, String)>)>>,
    }

    impl RecordingTransport {
        fn new(csv: &'static str) -> Self {
            RecordingTransport { csv, seen: Mutex::new(Vec::new()) }
        }

        fn urls(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(_, url, _)| url.to_owned()).collect()
        }
    }

    impl Transport for RecordingTransport {
        fn execute(&self, request: Request) -> anyhow::Result<Response> {
            self.seen.lock().unwrap().push((
                request.method().to_owned(),
                request.url().to_owned(),
                request.headers().to_vec(),
            ));
            Ok(Response::new(200)
                .with_header("Content-Type", "text/csv; charset=utf-8")
                .with_header("X-Served-By", "test")
                .with_body(self.csv))
        }
    }

    #[test]
    fn intercept_passes_through_other_urls() {
        let transport = |mut request: Request| -> anyhow::Result<Response> {
            assert_eq!(request.url(), "https://example.com/api/items?page=2");
            assert_eq!(request.method(), "POST");
            let body = request.take_body().unwrap().into_string()?;
            Ok(Response::new(201).with_header("Content-Type", "text/plain").with_body(body))
        };
        let request = Request::new("POST", "https://example.com/api/items?page=2")
            .with_body("id,name\n1,Alice\n")
            .with_options(RequestOptions::default().with_range("A1:B2"));

        let response = RetrosheetInterceptor::new().intercept(request, &transport).unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.into_body().unwrap().into_string().unwrap(), "id,name\n1,Alice\n");
    }

    #[test]
    fn intercept_rewrites_and_transcodes() {
        let transport = RecordingTransport::new("\"id\",\"name\",\"active\"\n\"1\",\"Alice\",\"TRUE\"\n\"2\",\"Bob\",\"false\"\n");
        let request = Request::get(SHEET_URL).with_header("Accept", "application/json");

        let response = RetrosheetInterceptor::new().intercept(request, &transport).unwrap();

        assert_eq!(
            transport.urls(),
            ["https://docs.google.com/spreadsheets/d/doc123/gviz/tq?tqx=out:csv&sheet=Sheet1"]
        );
        let (method, _, headers) = transport.seen.lock().unwrap()[0].clone();
        assert_eq!(method, "GET");
        assert_eq!(headers, [("Accept".to_owned(), "application/json".to_owned())]);

        assert_eq!(response.status(), 200);
        assert_eq!(response.content_type(), Some(JSON_CONTENT_TYPE));
        assert_eq!(response.header("x-served-by"), Some("test"));
        assert_eq!(response.headers().iter().filter(|(name, _)| name.eq_ignore_ascii_case("content-type")).count(), 1);

        let text = response.into_body().unwrap().into_string().unwrap();
        let document: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            document,
            json!({"Sheet1": [
                {"id": 1, "name": "Alice", "active": true},
                {"id": 2, "name": "Bob", "active": false}
            ]})
        );
    }

    #[test]
    fn intercept_applies_options() {
        let transport = RecordingTransport::new("name\nAlice\n");
        let request = Request::get(SHEET_URL).with_options(
            RequestOptions::default()
                .with_query("SELECT B WHERE A > 1")
                .with_range("A1:B10")
                .with_header_row_offset(1),
        );

        RetrosheetInterceptor::new().intercept(request, &transport).unwrap();

        assert_eq!(
            transport.urls(),
            ["https://docs.google.com/spreadsheets/d/doc123/gviz/tq?tqx=out:csv&sheet=Sheet1&tq=SELECT%20B%20WHERE%20A%20%3E%201&range=A1:B10&headers=1"]
        );
    }

    #[test]
    fn intercept_keys_document_by_decoded_page_name() {
        let transport = RecordingTransport::new("a\n1\n");
        let request = Request::get("https://docs.google.com/spreadsheets/d/doc123/My%20Notes");

        let response = RetrosheetInterceptor::new().intercept(request, &transport).unwrap();

        let text = response.into_body().unwrap().into_string().unwrap();
        let document: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(document, json!({"My Notes": [{"a": 1}]}));
    }

    #[test]
    fn intercept_keys_document_by_page_name_with_reserved_characters() {
        let transport = RecordingTransport::new("a\n1\n");
        let request = Request::get("https://docs.google.com/spreadsheets/d/doc123/R&D");

        let response = RetrosheetInterceptor::new().intercept(request, &transport).unwrap();

        assert_eq!(
            transport.urls(),
            ["https://docs.google.com/spreadsheets/d/doc123/gviz/tq?tqx=out:csv&sheet=R%26D"]
        );
        let text = response.into_body().unwrap().into_string().unwrap();
        let document: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(document, json!({"R&D": [{"a": 1}]}));
    }

    #[test]
    fn intercept_rejects_malformed_sheet_url() {
        let transport = RecordingTransport::new("a\n1\n");
        let request = Request::get("https://docs.google.com/spreadsheets/d/doc123/Sheet1/extra");

        let result = RetrosheetInterceptor::new().intercept(request, &transport);

        assert!(matches!(
            result,
            Err(RetrosheetError::ResolverError(ResolverError::MalformedUrlError(_)))
        ));
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn intercept_rejects_missing_page_name() {
        let transport = RecordingTransport::new("a\n1\n");
        let request = Request::get("https://docs.google.com/spreadsheets/d/doc123");

        let result = RetrosheetInterceptor::new().intercept(request, &transport);

        assert!(matches!(
            result,
            Err(RetrosheetError::ResolverError(ResolverError::MissingFieldError { field: "pageName", .. }))
        ));
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn intercept_requires_body() {
        let transport = |_: Request| -> anyhow::Result<Response> { Ok(Response::new(200)) };

        let result = RetrosheetInterceptor::new().intercept(Request::get(SHEET_URL), &transport);

        match result {
            Err(RetrosheetError::TranscoderError(TranscoderError::CsvFormatError { message })) => {
                assert!(message.contains(SHEET_URL), "{message}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn intercept_fails_on_short_row() {
        let transport = RecordingTransport::new("id,name\n1\n");

        let result = RetrosheetInterceptor::new().intercept(Request::get(SHEET_URL), &transport);

        assert!(matches!(
            result,
            Err(RetrosheetError::TranscoderError(TranscoderError::RowShapeError { .. }))
        ));
    }

    #[test]
    fn intercept_replaces_body_framing_headers() {
        let transport = |_: Request| -> anyhow::Result<Response> {
            Ok(Response::new(200)
                .with_header("Content-Type", "text/csv")
                .with_header("Content-Length", "8")
                .with_header("Transfer-Encoding", "chunked")
                .with_header("Cache-Control", "no-cache")
                .with_body("a\n1\n2\n3\n"))
        };

        let response = RetrosheetInterceptor::new().intercept(Request::get(SHEET_URL), &transport).unwrap();

        assert_eq!(response.header("transfer-encoding"), None);
        assert_eq!(response.header("cache-control"), Some("no-cache"));
        let declared = response.header("content-length").map(str::to_owned);
        assert_eq!(response.headers().iter().filter(|(name, _)| name.eq_ignore_ascii_case("content-length")).count(), 1);
        let text = response.into_body().unwrap().into_string().unwrap();
        assert_eq!(declared, Some(text.len().to_string()));
    }

    #[test]
    fn interceptor_logging_toggle() {
        assert!(!RetrosheetInterceptor::new().is_logging_enabled());
        assert!(RetrosheetInterceptor::new().with_logging(true).is_logging_enabled());
    }

    #[test]
    fn intercept_surfaces_transport_errors() {
        let transport = |_: Request| -> anyhow::Result<Response> { Err(anyhow::anyhow!("connection refused")) };

        let interceptor = RetrosheetInterceptor::new().with_logging(true);
        let error = interceptor.intercept(Request::get(SHEET_URL), &transport).unwrap_err();
        assert!(error.is_transport());

        let error = interceptor.intercept(Request::get("https://example.com/"), &transport).unwrap_err();
        assert!(error.is_transport());
        assert_eq!(error.to_string(), "connection refused");
    }
}
