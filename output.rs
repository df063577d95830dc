//! Proof-text output (spec §6 "Output", §9 "Global output sink").
//!
//! `ProofSink` is an explicit, passed-around sink rather than a global;
//! `chrono` timestamps each proof header.

use crate::error::Answer;
use crate::framework::ProveResult;
use chrono::Utc;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Ansi,
    Utf,
    AnsiUtf,
    Html,
}

impl Style {
    pub fn parse(name: &str) -> Option<Style> {
        match name {
            "plain" => Some(Style::Plain),
            "ansi" => Some(Style::Ansi),
            "utf" => Some(Style::Utf),
            "ansiutf" => Some(Style::AnsiUtf),
            "html" => Some(Style::Html),
            _ => None,
        }
    }
}

/// Writes proof text for a [`ProveResult`] to an arbitrary sink, in one
/// of the four presentation styles (spec §6 "`--style`").
pub struct ProofSink<W: Write> {
    writer: W,
    style: Style,
    formal: bool,
}

impl<W: Write> ProofSink<W> {
    pub fn new(writer: W, style: Style, formal: bool) -> Self {
        ProofSink { writer, style, formal }
    }

    fn arrow(&self) -> &'static str {
        match self.style {
            Style::Utf | Style::AnsiUtf => "\u{2192}",
            _ => "->",
        }
    }

    fn answer_heading(&self, answer: &Answer) -> String {
        let text = answer.to_string();
        match self.style {
            Style::Ansi | Style::AnsiUtf => match answer {
                Answer::Yes => format!("\x1b[32m{text}\x1b[0m"),
                Answer::No => format!("\x1b[31m{text}\x1b[0m"),
                Answer::Maybe => format!("\x1b[33m{text}\x1b[0m"),
            },
            Style::Html => format!("<strong>{text}</strong>"),
            _ => text,
        }
    }

    /// Writes the driver's single-verdict line followed by the
    /// accumulated processor log as the proof body, unless `formal` asks
    /// for a certifier-friendly trimmed-down rendering instead (spec §6
    /// "`--formal`").
    pub fn write_result(&mut self, result: &ProveResult) -> io::Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        match self.style {
            Style::Html => {
                writeln!(self.writer, "<!-- generated {timestamp} -->")?;
                writeln!(self.writer, "<pre>{}</pre>", self.answer_heading(&result.answer))?;
            }
            _ => writeln!(self.writer, "{}", self.answer_heading(&result.answer))?,
        }
        if self.formal {
            writeln!(self.writer, "% certified answer, proof log omitted")?;
            return Ok(());
        }
        for line in &result.log {
            match self.style {
                Style::Html => writeln!(self.writer, "<p>{line}</p>")?,
                _ => writeln!(self.writer, "  {} {line}", self.arrow())?,
            }
        }
        Ok(())
    }
}

/// Convenience constructor writing straight to stdout, matching §6's
/// default (no `--output` given).
pub fn stdout_sink(style: Style, formal: bool) -> ProofSink<io::Stdout> {
    ProofSink::new(io::stdout(), style, formal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_writes_bare_answer() {
        let mut buf = Vec::new();
        let mut sink = ProofSink::new(&mut buf, Style::Plain, false);
        let result = ProveResult { answer: Answer::Yes, log: vec!["no rules".to_string()] };
        sink.write_result(&result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("YES\n"));
        assert!(text.contains("no rules"));
    }

    #[test]
    fn test_formal_style_omits_log() {
        let mut buf = Vec::new();
        let mut sink = ProofSink::new(&mut buf, Style::Plain, true);
        let result = ProveResult { answer: Answer::No, log: vec!["should not appear".to_string()] };
        sink.write_result(&result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("should not appear"));
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!(Style::parse("utf"), Some(Style::Utf));
        assert_eq!(Style::parse("bogus"), None);
    }
}
