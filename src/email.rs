//! HTML summary body and raw MIME assembly for the report email.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write as _;

use crate::types::DailySummary;

pub const EMPTY_SUMMARY_TEXT: &str = "No hay respaldos en este rango.";

/// Base64 body lines are wrapped at this width (RFC 2045).
const BASE64_LINE_LENGTH: usize = 76;

const TABLE_OPEN: &str =
    "<table border='1' cellpadding='5' cellspacing='0' style='border-collapse: collapse;'>";
const TABLE_HEADER: &str = "<tr style='background-color: #0066CC; color: white;'>\
<th>AccountName</th><th>T. COMPLETED</th><th>T. FAILED</th></tr>";

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachment: Attachment,
}

impl EmailMessage {
    /// All envelope recipients, to first then cc.
    pub fn destinations(&self) -> Vec<String> {
        self.to.iter().chain(self.cc.iter()).cloned().collect()
    }

    /// Render as a `multipart/mixed` message: HTML part followed by the attachment.
    pub fn to_mime(&self, boundary: &str, date: DateTime<Utc>) -> Vec<u8> {
        let mut out = String::new();

        let _ = write!(out, "From: {}\r\n", self.from);
        let _ = write!(out, "To: {}\r\n", self.to.join(", "));
        if !self.cc.is_empty() {
            let _ = write!(out, "Cc: {}\r\n", self.cc.join(", "));
        }
        let _ = write!(out, "Subject: {}\r\n", encode_header(&self.subject));
        let _ = write!(out, "Date: {}\r\n", date.to_rfc2822());
        out.push_str("MIME-Version: 1.0\r\n");
        let _ = write!(
            out,
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            boundary
        );

        let _ = write!(out, "--{}\r\n", boundary);
        out.push_str("Content-Type: text/html; charset=\"utf-8\"\r\n");
        out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        out.push_str(&wrap_base64(self.html_body.as_bytes()));

        let _ = write!(out, "--{}\r\n", boundary);
        let _ = write!(out, "Content-Type: {}\r\n", self.attachment.content_type);
        out.push_str("Content-Transfer-Encoding: base64\r\n");
        let _ = write!(
            out,
            "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
            self.attachment.filename
        );
        out.push_str(&wrap_base64(&self.attachment.data));

        let _ = write!(out, "--{}--\r\n", boundary);
        out.into_bytes()
    }
}

pub fn subject(prefix: &str, today: NaiveDate) -> String {
    format!("{} – Resumen {}", prefix, today)
}

/// Full HTML body with one summary section per day.
pub fn render_body(
    yesterday_summary: &DailySummary,
    today_summary: &DailySummary,
    yesterday: NaiveDate,
    today: NaiveDate,
    signature: &[String],
) -> String {
    let mut body = String::new();
    body.push_str("<html>\n<body style=\"font-family: Arial, sans-serif;\">\n");

    let _ = writeln!(
        body,
        "<p><strong>Resumen del DÍA ANTERIOR ({}):</strong></p>",
        yesterday
    );
    body.push_str(&render_summary_table(yesterday_summary));
    body.push_str("\n<br/>\n");

    let _ = writeln!(
        body,
        "<p><strong>Resumen del DÍA ACTUAL ({}):</strong></p>",
        today
    );
    body.push_str(&render_summary_table(today_summary));
    body.push_str("\n<br/>\n");

    body.push_str("<p>Se adjunta el reporte detallado en Excel.</p>\n");

    if !signature.is_empty() {
        let lines: Vec<String> = signature.iter().map(|l| escape_html(l.trim())).collect();
        let _ = writeln!(body, "<br/>\n<p>{}</p>", lines.join("<br/>\n"));
    }

    body.push_str("</body>\n</html>\n");
    body
}

/// One table row per account, or the fixed placeholder when the day is empty.
pub fn render_summary_table(summary: &DailySummary) -> String {
    if summary.is_empty() {
        return EMPTY_SUMMARY_TEXT.to_string();
    }

    let mut html = String::from(TABLE_OPEN);
    html.push_str(TABLE_HEADER);
    for (account_name, counts) in summary.iter() {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(account_name),
            counts.completed,
            counts.failed
        );
    }
    html.push_str("</table>");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// RFC 2047 B-encoding for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

fn wrap_base64(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2 + 2);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        // base64 output is ASCII
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push_str("\r\n");
    }
    out
}
