//! Preview command implementation.

use std::path::Path;

use anyhow::Result;

use docweave_core::{preview, Span};

use super::{load_document, offset_of, OutputFormat, Session};

/// Describe what documenting the declaration at a position would do.
pub fn execute(
    session: &Session,
    file: &Path,
    line: usize,
    column: usize,
    format: OutputFormat,
) -> Result<()> {
    let doc = load_document(file)?;
    let offset = offset_of(&doc, file, line, column)?;
    let settings = session.settings.snapshot();

    let Some(preview) = preview(&doc, Span::at(offset), &settings) else {
        println!("No declaration at {}:{}:{}", file.display(), line, column);
        return Ok(());
    };

    match format {
        OutputFormat::Text => {
            println!("Declaration:   {} '{}'", preview.kind, preview.name);
            println!("Category:      {}", preview.category);
            println!(
                "Calls service: {}",
                if preview.calls_service { "yes" } else { "no" }
            );
            println!("{}", preview.title);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&preview)?),
    }

    Ok(())
}
