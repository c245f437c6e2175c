#![warn(missing_docs)]
//! `document-core-json` - JSON payloads for `document-core`.
//!
//! This crate provides a [`PayloadParser`](document_core::PayloadParser) that parses a document's
//! payload with `serde_json`, either into a [`serde_json::Value`] or into any
//! `DeserializeOwned` type. The document core only ever shows a generic "Loading failed" for a
//! parse error; this parser additionally keeps the failure's location as data
//! ([`JsonSyntaxError`], with a character offset computed through `ropey`) so a host can place a
//! caret or underline without parsing error strings.
//!
//! Structured problems in otherwise valid JSON are reported through an optional validator, whose
//! diagnostics flow into the document's diagnostics list on every successful reload.

pub mod parser;
pub mod syntax;

pub use parser::{JsonPayloadParser, Validator};
pub use syntax::{JsonErrorKind, JsonSyntaxError, char_offset};
