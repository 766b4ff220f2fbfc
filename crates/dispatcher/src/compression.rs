//! Streaming gzip adapter for the HTML path

use std::io::{self, BufWriter, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::request::MonitoringRequest;

/// Whether the client advertised gzip in any `Accept-Encoding` value
pub fn accepts_gzip(request: &MonitoringRequest) -> bool {
    request
        .header_values("accept-encoding")
        .any(|value| value.to_ascii_lowercase().contains("gzip"))
}

/// Buffered body writer, optionally gzip-compressed
///
/// [`HtmlWriter::finish`] must run on every exit path; it flushes the
/// buffer and writes the gzip trailer.
pub enum HtmlWriter<'a> {
    Plain(BufWriter<&'a mut dyn Write>),
    Gzip(BufWriter<GzEncoder<&'a mut dyn Write>>),
}

impl<'a> HtmlWriter<'a> {
    pub fn plain(out: &'a mut dyn Write, chunk_size: usize) -> Self {
        Self::Plain(BufWriter::with_capacity(chunk_size, out))
    }

    pub fn gzip(out: &'a mut dyn Write, chunk_size: usize) -> Self {
        Self::Gzip(BufWriter::with_capacity(
            chunk_size,
            GzEncoder::new(out, Compression::default()),
        ))
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Gzip(_))
    }

    /// Flush buffered bytes and complete the stream
    ///
    /// # Errors
    /// Returns the underlying write error
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush(),
            Self::Gzip(writer) => {
                let encoder = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
                let out = encoder.finish()?;
                out.flush()
            }
        }
    }
}

impl Write for HtmlWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Gzip(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_accepts_gzip_substring_any_case() {
        let request = MonitoringRequest::new().with_header("Accept-Encoding", "deflate, GZIP;q=0.8");
        assert!(accepts_gzip(&request));
        let request = MonitoringRequest::new().with_header("Accept-Encoding", "identity");
        assert!(!accepts_gzip(&request));
        assert!(!accepts_gzip(&MonitoringRequest::new()));
    }

    #[test]
    fn test_gzip_writer_produces_complete_stream() {
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut writer = HtmlWriter::gzip(&mut sink, 16);
            assert!(writer.is_compressed());
            for _ in 0..100 {
                writer.write_all(b"<tr><td>row</td></tr>").unwrap();
            }
            writer.finish().unwrap();
        }
        let mut decoded = String::new();
        GzDecoder::new(sink.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded.len(), 100 * "<tr><td>row</td></tr>".len());
    }

    #[test]
    fn test_plain_writer_flushes_on_finish() {
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut writer = HtmlWriter::plain(&mut sink, 4096);
            writer.write_all(b"<html/>").unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(sink, b"<html/>");
    }
}
