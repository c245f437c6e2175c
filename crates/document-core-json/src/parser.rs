//! [`PayloadParser`] implementation backed by `serde_json`.

use crate::syntax::JsonSyntaxError;
use document_core::{Diagnostic, ParseError, PayloadParser};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Maps a parsed value to the diagnostics it should produce.
pub type Validator<T> = Box<dyn Fn(&T) -> Vec<Diagnostic>>;

/// Parses a document payload as JSON into `T`.
///
/// After every parse the parser holds either the new value or a [`JsonSyntaxError`] describing
/// where the payload went wrong; the last successfully parsed value is kept across failures so
/// a host can keep showing it while the user is mid-edit.
///
/// ```rust
/// use document_core::{Diagnostic, PayloadParser};
/// use document_core_json::JsonPayloadParser;
///
/// let mut parser = JsonPayloadParser::<serde_json::Value>::new().with_validator(|value| {
///     if value.get("title").is_none() {
///         vec![Diagnostic::warning("missing title")]
///     } else {
///         Vec::new()
///     }
/// });
///
/// parser.parse(r#"{ "body": "..." }"#).unwrap();
/// assert_eq!(parser.diagnostics(), vec![Diagnostic::warning("missing title")]);
///
/// assert!(parser.parse(r#"{ "body": "#).is_err());
/// assert_eq!(parser.last_error().unwrap().line, 1);
/// assert!(parser.value().is_some());
/// ```
pub struct JsonPayloadParser<T = Value> {
    value: Option<T>,
    last_error: Option<JsonSyntaxError>,
    validator: Option<Validator<T>>,
    report: Vec<Diagnostic>,
}

impl<T> Default for JsonPayloadParser<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_error: None,
            validator: None,
            report: Vec::new(),
        }
    }
}

impl<T> JsonPayloadParser<T> {
    /// Create a parser without a validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the diagnostics returned by `validator` after every successful parse.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> Vec<Diagnostic> + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// The last successfully parsed value.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Take the last successfully parsed value out of the parser.
    pub fn take_value(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Location of the most recent failure, cleared by the next successful parse.
    pub fn last_error(&self) -> Option<&JsonSyntaxError> {
        self.last_error.as_ref()
    }

    /// Returns `true` if the most recent parse succeeded.
    pub fn is_valid(&self) -> bool {
        self.last_error.is_none() && self.value.is_some()
    }
}

impl<T: DeserializeOwned> PayloadParser for JsonPayloadParser<T> {
    fn parse(&mut self, payload: &str) -> Result<(), ParseError> {
        self.report.clear();
        match serde_json::from_str::<T>(payload) {
            Ok(value) => {
                if let Some(validator) = &self.validator {
                    self.report = validator(&value);
                }
                tracing::trace!(len = payload.len(), reported = self.report.len(), "json payload parsed");
                self.value = Some(value);
                self.last_error = None;
                Ok(())
            }
            Err(error) => {
                let located = JsonSyntaxError::locate(payload, &error);
                let message = located.to_string();
                self.last_error = Some(located);
                Err(ParseError::with_source(message, error))
            }
        }
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        self.report.clone()
    }
}
