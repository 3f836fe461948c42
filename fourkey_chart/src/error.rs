use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Format,
    Io,
    Missing,
    Invalid,
}

impl ParseErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Format
            "E1001" | "E1101" => Self::Format,

            // IO
            "E2001" => Self::Io,

            // Missing required content
            "E1102" | "E3001" | "E3002" => Self::Missing,

            _ => Self::Invalid,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct ParseError {
    pub code: &'static str,
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,

    pub file: Option<String>,
    pub section: Option<String>,
    pub context: Option<String>,
}

impl ParseError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: ParseErrorKind::from_code(code),
            message: message.into(),
            line,

            file: None,
            section: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A recoverable problem found while loading a chart. The chart still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub code: &'static str,
    pub message: String,
    pub line: Option<usize>,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Warnings(Vec<ParseWarning>);

impl Warnings {
    pub(crate) fn push(&mut self, code: &'static str, message: impl Into<String>, line: Option<usize>) {
        let warning = ParseWarning {
            code,
            message: message.into(),
            line,
        };
        log::warn!("{warning}");
        self.0.push(warning);
    }

    pub(crate) fn into_vec(self) -> Vec<ParseWarning> {
        self.0
    }
}
