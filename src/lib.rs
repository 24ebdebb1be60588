//! # Retrosheet
//!
//! An HTTP interceptor that lets a client read a published Google Sheets page
//! as a JSON data source.
//!
//! ## How it works
//!
//! - **URL resolving**: a request to
//!   `https://docs.google.com/spreadsheets/d/<documentId>/<pageName>` is
//!   rewritten to the sheet's CSV export endpoint, with optional query, range
//!   and header-row parameters taken from [`RequestOptions`]
//! - **Transcoding**: the CSV body is converted into
//!   `{ "<pageName>": [ { "<header>": value, ... }, ... ] }`, each field typed
//!   as integer, boolean, double or string on its own
//! - **Pass-through**: any other request reaches the transport unchanged
//!
//! ## Example
//!
//! ```no_run
//! use retrosheet::{Request, RequestOptions, Response, RetrosheetInterceptor};
//!
//! let transport = |_request: Request| -> anyhow::Result<Response> {
//!     // Hand the request to a real HTTP client here.
//!     Ok(Response::new(200).with_body("id,name\n1,Alice\n"))
//! };
//! let request = Request::get("https://docs.google.com/spreadsheets/d/1YTWKe7_mzuw/notes")
//!     .with_options(RequestOptions::default().with_range("A1:B10"));
//! let _response = RetrosheetInterceptor::new().intercept(request, &transport)?;
//! # Ok::<(), retrosheet::RetrosheetError>(())
//! ```
//!
//! With the `reqwest` feature, `interceptor::http::HttpTransport` sends requests
//! through a blocking reqwest client.
mod error;
pub mod interceptor;
pub mod resolver;
pub mod transcoder;

pub use crate::error::RetrosheetError;
pub use crate::interceptor::{Body, Request, Response, RetrosheetInterceptor, Transport};
pub use crate::resolver::options::RequestOptions;
pub use crate::resolver::{is_spreadsheet_url, rewrite, SheetReference};
pub use crate::transcoder::value::InferredValue;
pub use crate::transcoder::{to_document, transcode};
