//! The load step: the boundary between a document and its payload parser.
//!
//! The core only understands a binary outcome from the parser: it either accepted the payload
//! or it failed. Failures are logged with their full detail and collapsed into one generic
//! diagnostic; a parser that wants to report structured problems does so through
//! [`PayloadParser::diagnostics`] (or its own API) instead of through its error value.

use crate::diagnostics::Diagnostic;
use thiserror::Error;

/// Message of the diagnostic produced for an empty or whitespace-only payload.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload";

/// Message of the diagnostic produced when the parser fails.
pub const LOADING_FAILED_MESSAGE: &str = "Loading failed";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned by a [`PayloadParser`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ParseError {
    /// Create an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A strategy that turns a payload into the host's structured representation.
pub trait PayloadParser {
    /// Parse `payload`. Called with a payload that is neither empty nor whitespace-only.
    fn parse(&mut self, payload: &str) -> Result<(), ParseError>;

    /// Diagnostics describing the last successful parse.
    ///
    /// The default reports none, so a successful parse clears the document's diagnostics.
    fn diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

impl<P: PayloadParser + ?Sized> PayloadParser for Box<P> {
    fn parse(&mut self, payload: &str) -> Result<(), ParseError> {
        (**self).parse(payload)
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        (**self).diagnostics()
    }
}

/// Adapter turning a closure into a [`PayloadParser`].
pub struct FnParser<F> {
    f: F,
}

/// Wrap `f` as a [`PayloadParser`] that reports no structured diagnostics.
pub fn parser_fn<F>(f: F) -> FnParser<F>
where
    F: FnMut(&str) -> Result<(), ParseError>,
{
    FnParser { f }
}

impl<F> PayloadParser for FnParser<F>
where
    F: FnMut(&str) -> Result<(), ParseError>,
{
    fn parse(&mut self, payload: &str) -> Result<(), ParseError> {
        (self.f)(payload)
    }
}

/// Result of one run of the load step.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The parser accepted the payload.
    Loaded,
    /// The payload was empty or whitespace-only; the parser was not invoked.
    InvalidPayload,
    /// The parser failed.
    Failed(ParseError),
}

impl LoadOutcome {
    /// Returns `true` if the parser accepted the payload.
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded)
    }

    /// The diagnostics the document should show after this outcome.
    pub fn diagnostics<P: PayloadParser + ?Sized>(&self, parser: &P) -> Vec<Diagnostic> {
        match self {
            LoadOutcome::Loaded => parser.diagnostics(),
            LoadOutcome::InvalidPayload => vec![Diagnostic::error(INVALID_PAYLOAD_MESSAGE)],
            LoadOutcome::Failed(_) => vec![Diagnostic::error(LOADING_FAILED_MESSAGE)],
        }
    }
}

/// Run the load step for `payload`.
pub fn run_load<P: PayloadParser + ?Sized>(parser: &mut P, payload: &str) -> LoadOutcome {
    if payload.trim().is_empty() {
        tracing::debug!(len = payload.len(), "payload is blank, skipping parse");
        return LoadOutcome::InvalidPayload;
    }

    match parser.parse(payload) {
        Ok(()) => LoadOutcome::Loaded,
        Err(error) => {
            tracing::warn!(error = %error, source = ?std::error::Error::source(&error), "payload parse failed");
            LoadOutcome::Failed(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Spy {
        calls: Vec<String>,
        fail: bool,
        report: Vec<Diagnostic>,
    }

    impl PayloadParser for Spy {
        fn parse(&mut self, payload: &str) -> Result<(), ParseError> {
            self.calls.push(payload.to_string());
            if self.fail {
                Err(ParseError::with_source(
                    "unexpected token at 3:14",
                    std::io::Error::other("inner"),
                ))
            } else {
                Ok(())
            }
        }

        fn diagnostics(&self) -> Vec<Diagnostic> {
            self.report.clone()
        }
    }

    #[test]
    fn test_blank_payload_skips_parser() {
        let mut spy = Spy::default();
        for payload in ["", "   ", "\n\t \r\n", "\u{2003}"] {
            let outcome = run_load(&mut spy, payload);
            assert!(matches!(outcome, LoadOutcome::InvalidPayload));
            assert_eq!(
                outcome.diagnostics(&spy),
                vec![Diagnostic::error(INVALID_PAYLOAD_MESSAGE)]
            );
        }
        assert!(spy.calls.is_empty());
    }

    #[test]
    fn test_failure_is_collapsed() {
        let mut spy = Spy {
            fail: true,
            ..Spy::default()
        };
        let outcome = run_load(&mut spy, "{ broken");
        assert_eq!(spy.calls, vec!["{ broken".to_string()]);

        let LoadOutcome::Failed(error) = &outcome else {
            panic!("expected failure");
        };
        assert_eq!(error.message(), "unexpected token at 3:14");
        assert!(std::error::Error::source(error).is_some());

        let diagnostics = outcome.diagnostics(&spy);
        assert_eq!(diagnostics, vec![Diagnostic::error(LOADING_FAILED_MESSAGE)]);
        assert!(
            diagnostics
                .iter()
                .all(|d| !d.message.contains("unexpected token"))
        );
    }

    #[test]
    fn test_success_uses_parser_channel() {
        let mut spy = Spy::default();
        let outcome = run_load(&mut spy, "ok");
        assert!(outcome.is_loaded());
        assert!(outcome.diagnostics(&spy).is_empty());

        spy.report = vec![Diagnostic::warning("deprecated field")];
        assert_eq!(
            outcome.diagnostics(&spy),
            vec![Diagnostic::warning("deprecated field")]
        );
    }

    #[test]
    fn test_parser_fn_and_box() {
        let mut seen = Vec::new();
        {
            let mut parser = parser_fn(|payload: &str| {
                seen.push(payload.len());
                Err(ParseError::new("nope"))
            });
            assert!(matches!(run_load(&mut parser, "abc"), LoadOutcome::Failed(_)));
        }
        assert_eq!(seen, vec![3]);

        let mut boxed: Box<dyn PayloadParser> = Box::new(parser_fn(|_: &str| Ok(())));
        assert!(run_load(&mut boxed, "x").is_loaded());
    }
}
