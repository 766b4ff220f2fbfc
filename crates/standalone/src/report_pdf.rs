//! Text-only PDF report
//!
//! Writes a PDF 1.4 document by hand: one Helvetica font, one text stream
//! per page, and a cross-reference table with exact byte offsets.

use std::io::Write;

use contracts::{ContractError, PdfReportRenderer, ReportContext};

use crate::locale::{translate, Message};

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const LINES_PER_PAGE: usize = 60;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 12;
const LEFT: u32 = 40;
const TOP: u32 = 800;

/// PDF renderer listing counters and host facts as plain text
#[derive(Debug, Default, Clone, Copy)]
pub struct TextPdfReport;

impl PdfReportRenderer for TextPdfReport {
    fn render(
        &self,
        context: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ContractError> {
        let lines = report_lines(context);
        let document = PdfDocument::from_lines(&lines);
        out.write_all(&document.into_bytes())?;
        Ok(())
    }
}

fn report_lines(context: &ReportContext<'_>) -> Vec<String> {
    let t = |message| translate(context.locale, message);
    let mut lines = vec![
        format!("{} - {}", t(Message::Title), context.application()),
        format!("{} ({})", t(Message::Statistics), context.period.token()),
        String::new(),
    ];

    for counter in context.collector.counters() {
        let snapshot = counter.snapshot();
        lines.push(format!(
            "{}: {} {}, {} {}",
            snapshot.name,
            snapshot.hits(),
            t(Message::Hits),
            snapshot.system_errors(),
            t(Message::Errors)
        ));
        for request in &snapshot.requests {
            lines.push(format!(
                "    {}  hits={} mean={}ms max={}ms errors={}",
                request.name,
                request.hits,
                request.mean_ms(),
                request.max_duration_ms,
                request.system_errors
            ));
        }
        lines.push(String::new());
    }

    for info in context.runtime {
        lines.push(format!(
            "{} pid={} os={} cpus={} memory={}/{}MB threads={} sessions={}",
            info.host,
            info.pid,
            info.os,
            info.available_processors,
            info.used_memory_bytes / (1024 * 1024),
            info.max_memory_bytes / (1024 * 1024),
            info.thread_count,
            info.session_count
        ));
    }
    lines
}

struct PdfDocument {
    bytes: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfDocument {
    fn from_lines(lines: &[String]) -> Self {
        let mut document = Self {
            bytes: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        };

        let pages: Vec<&[String]> = if lines.is_empty() {
            vec![lines]
        } else {
            lines.chunks(LINES_PER_PAGE).collect()
        };
        // 1 catalog, 2 page tree, 3 font, then (page, content) pairs
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();

        document.object("<< /Type /Catalog /Pages 2 0 R >>");
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        document.object(&format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ));
        document.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");

        for (page, id) in pages.iter().zip(&page_ids) {
            document.object(&format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                id + 1
            ));
            let stream = content_stream(page);
            document.object(&format!(
                "<< /Length {} >>\nstream\n{stream}\nendstream",
                stream.len()
            ));
        }
        document.trailer();
        document
    }

    fn object(&mut self, body: &str) {
        self.offsets.push(self.bytes.len());
        let id = self.offsets.len();
        self.bytes
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn trailer(&mut self) {
        let xref_at = self.bytes.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            self.offsets.len() + 1
        ));
        self.bytes.extend_from_slice(xref.as_bytes());
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn content_stream(lines: &[String]) -> String {
    let mut stream = format!("BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{LEFT} {TOP} Td\n");
    for line in lines {
        stream.push('(');
        stream.push_str(&escape_text(line));
        stream.push_str(") Tj T*\n");
    }
    stream.push_str("ET");
    stream
}

/// Escape a PDF literal string; non-ASCII becomes `?` under the base font
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}
