use crate::interceptor::{Body, Request, Response, Transport};
use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::Method;

/// Transport backed by a blocking reqwest client.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    /// Sends the request and hands back the response body as an unread stream.
    fn execute(&self, mut request: Request) -> anyhow::Result<Response> {
        let method = Method::from_bytes(request.method().as_bytes())
            .with_context(|| format!("Invalid HTTP method '{}'", request.method()))?;
        let mut builder = self.client.request(method, request.url());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.take_body() {
            builder = builder.body(reqwest::blocking::Body::new(body));
        }
        let response = builder
            .send()
            .with_context(|| format!("Request to '{}' failed", request.url()))?;

        let mut converted = Response::new(response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                converted = converted.with_header(name.as_str(), value);
            }
        }
        Ok(converted.with_body(Body::from_reader(response)))
    }
}
