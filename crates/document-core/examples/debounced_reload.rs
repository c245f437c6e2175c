//! Debounced reload example
//!
//! Simulates a burst of keystrokes against a document and prints every state change.
//! Run with `RUST_LOG=document_core=debug` to see the reload cycle in the logs.

use document_core::{
    Document, DocumentChange, DocumentConfig, ListChange, MemoryStorage, ParseError, parser_fn,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let local = tokio::task::LocalSet::new();
    local.run_until(run()).await;
}

async fn run() {
    let config = DocumentConfig::default().with_quiescence(Duration::from_millis(300));
    let parser = parser_fn(|payload: &str| {
        // A toy format: balanced braces.
        let mut depth = 0i32;
        for c in payload.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(ParseError::new("unexpected `}`"));
            }
        }
        if depth != 0 {
            return Err(ParseError::new(format!("{depth} unclosed `{{`")));
        }
        Ok(())
    });
    let doc = Document::new(parser, MemoryStorage::new(), config);

    doc.subscribe(|change| {
        let what = match &change.change {
            DocumentChange::Diagnostics(ListChange::Inserted { index, item }) => {
                format!("+ [{index}] {item}")
            }
            DocumentChange::Diagnostics(ListChange::Removed { index, item }) => {
                format!("- [{index}] {item}")
            }
            other => format!("{other:?}"),
        };
        println!("v{:>3}  {what}", change.new_version);
    });

    println!("=== typing ===");
    let mut typed = String::new();
    for c in "{ \"a\": { \"b\": 1 }".chars() {
        typed.push(c);
        doc.set_payload(typed.clone());
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    doc.wait_idle().await;
    println!("diagnostics: {:?}", doc.diagnostics());

    println!("\n=== fix ===");
    typed.push_str(" }");
    doc.set_payload(typed);
    doc.wait_idle().await;
    println!("diagnostics: {:?}", doc.diagnostics());
}
