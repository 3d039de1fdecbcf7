//! Terminal rendering of scan results

use crate::relay::{EXTRA_RESULT, ResultDisplay};
use serde_json::json;
use std::io::{self, Write};

/// Renders scan results to a writer, as plain text or one JSON object per line
pub struct TerminalDisplay<W = io::Stdout> {
    out: W,
    json: bool,
    text: Option<String>,
}

impl TerminalDisplay {
    /// Display writing to stdout
    pub fn stdout(json: bool) -> Self {
        Self::new(io::stdout(), json)
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Display writing to `out`
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            text: None,
        }
    }

    /// Last rendered text
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Underlying writer
    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> ResultDisplay for TerminalDisplay<W> {
    fn set_text(&mut self, text: &str) {
        let written = if self.json {
            writeln!(self.out, "{}", json!({ EXTRA_RESULT: text }))
        } else {
            writeln!(self.out, "{text}")
        };

        if let Err(err) = written.and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write scan result: {err}");
        }

        self.text = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_rendering() {
        let mut display = TerminalDisplay::new(Vec::new(), false);
        display.set_text("ABC123");
        assert_eq!(display.writer().as_slice(), b"ABC123\n");
        assert_eq!(display.text(), Some("ABC123"));
    }

    #[test]
    fn test_json_rendering() {
        let mut display = TerminalDisplay::new(Vec::new(), true);
        display.set_text("say \"hi\"");

        let line = String::from_utf8(display.writer().clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["result"], "say \"hi\"");
    }
}
