use chrono::{DateTime, Utc};
use log::debug;

use super::crlf::normalize_crlf;
use crate::error::SenderError;

/// RFC 2822 date layout, always rendered with a `+0000` offset.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Wire-ready message: header block, blank line, body. CRLF throughout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    bytes: Vec<u8>,
    body_start: usize,
}

impl ComposedMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Header lines plus the terminating blank line.
    pub fn header_block(&self) -> &[u8] {
        &self.bytes[..self.body_start]
    }

    pub fn body(&self) -> &[u8] {
        &self.bytes[self.body_start..]
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Builds the single-part HTML message sent by the CLI.
///
/// Subject and body are CRLF-normalized independently. A line break inside
/// the subject is turned into a folded continuation, so it can never start a
/// new header or end the header block.
pub fn compose(
    from: &str,
    to: &str,
    subject: &str,
    html_body: &[u8],
    date: DateTime<Utc>,
) -> Result<ComposedMessage, SenderError> {
    reject_nul("subject", subject.as_bytes())?;
    reject_nul("body", html_body)?;

    let subject = fold_header_value(&normalize_crlf(subject.as_bytes()));
    let body = normalize_crlf(html_body);

    let mut bytes = Vec::new();
    push_header(&mut bytes, "Date", format_date(&date).as_bytes());
    push_header(&mut bytes, "From", format!("<{}>", from).as_bytes());
    push_header(&mut bytes, "To", format!("<{}>", to).as_bytes());
    push_header(&mut bytes, "Subject", &subject);
    push_header(&mut bytes, "MIME-Version", b"1.0");
    push_header(&mut bytes, "Content-Type", b"text/html; charset=UTF-8");
    bytes.extend_from_slice(b"\r\n");

    let body_start = bytes.len();
    bytes.extend_from_slice(&body);

    debug!(
        "Composed message: {} header bytes, {} body bytes",
        body_start,
        body.len()
    );

    Ok(ComposedMessage { bytes, body_start })
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &[u8]) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value);
    buf.extend_from_slice(b"\r\n");
}

/// Rejoins the lines of a CRLF-normalized value as folded continuations.
///
/// Blank and whitespace-only lines are dropped, so the header never carries
/// an empty continuation line or a trailing break.
fn fold_header_value(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let lines = value
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(&b"\r"[..]).unwrap_or(line))
        .filter(|line| line.iter().any(|&b| b != b' ' && b != b'\t'));

    for line in lines {
        if !out.is_empty() {
            out.extend_from_slice(b"\r\n");
            if !matches!(line.first(), Some(b' ') | Some(b'\t')) {
                out.push(b' ');
            }
        }
        out.extend_from_slice(line);
    }
    out
}

fn reject_nul(part: &str, bytes: &[u8]) -> Result<(), SenderError> {
    match bytes.iter().position(|&b| b == 0) {
        Some(offset) => Err(SenderError::Compose(format!(
            "{} contains a NUL byte at offset {}",
            part, offset
        ))),
        None => Ok(()),
    }
}
