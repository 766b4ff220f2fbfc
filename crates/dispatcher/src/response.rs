//! Response sink written by the dispatcher
//!
//! The dispatcher only sets headers and writes the body; the transport
//! layer owns status codes and connection handling.

use std::io::{self, Write};

pub const CACHE_CONTROL: &str = "Cache-Control";
pub const PRAGMA: &str = "Pragma";
pub const EXPIRES: &str = "Expires";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_ENCODING: &str = "Content-Encoding";

/// Outbound response as seen by the dispatcher
pub trait MonitoringResponse {
    /// Append a header (repeated names are kept)
    fn add_header(&mut self, name: &str, value: &str);

    fn set_content_type(&mut self, content_type: &str);

    fn set_content_length(&mut self, length: u64);

    /// Body stream
    fn output(&mut self) -> &mut dyn Write;

    /// Push everything written so far to the client
    ///
    /// # Errors
    /// Returns the transport's write error
    fn flush_buffer(&mut self) -> io::Result<()>;
}

/// Disable every downstream cache
pub fn no_cache(response: &mut dyn MonitoringResponse) {
    response.add_header(CACHE_CONTROL, "no-cache");
    response.add_header(PRAGMA, "no-cache");
    response.add_header(EXPIRES, "-1");
}

/// In-memory response, used by transport bridges and tests
#[derive(Debug, Default, Clone)]
pub struct BufferedResponse {
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    content_length: Option<u64>,
    body: Vec<u8>,
    flushes: usize,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers added through [`MonitoringResponse::add_header`], in order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, name matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// How many times the buffer was explicitly flushed
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// All headers including content type and length, ready for a transport
    pub fn all_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if let Some(content_type) = &self.content_type {
            headers.push((CONTENT_TYPE.to_string(), content_type.clone()));
        }
        if let Some(length) = self.content_length {
            headers.push((CONTENT_LENGTH.to_string(), length.to_string()));
        }
        headers
    }
}

impl MonitoringResponse for BufferedResponse {
    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_string());
    }

    fn set_content_length(&mut self, length: u64) {
        self.content_length = Some(length);
    }

    fn output(&mut self) -> &mut dyn Write {
        &mut self.body
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
