//! Refactor command implementation.
//!
//! Documents the declaration under a cursor position, whether or not it is
//! already documented.

use std::path::Path;

use anyhow::{Context, Result};

use docweave_core::{refactor_at, FixOutcome};

use super::{load_document, offset_of, Session};

pub async fn execute(
    session: &Session,
    file: &Path,
    line: usize,
    column: usize,
    dry_run: bool,
) -> Result<()> {
    let doc = load_document(file)?;
    let offset = offset_of(&doc, file, line, column)?;
    let settings = session.settings.snapshot();

    let Some(action) = refactor_at(&doc, offset, &settings) else {
        println!("No documentation action available at {}:{}:{}", file.display(), line, column);
        return Ok(());
    };
    println!("{} {} '{}': {}", action.category, action.kind, action.name, action.title);

    let outcome = session
        .fixer
        .refactor(&doc, &action, &settings, &session.cancel)
        .await
        .with_context(|| format!("Failed to document '{}'", action.name))?;

    match outcome {
        FixOutcome::Applied(injection) => {
            let text = injection.apply(doc.text());
            if dry_run {
                print!("{}", text);
            } else {
                std::fs::write(file, text)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                println!("Updated {}", file.display());
            }
        }
        FixOutcome::NotApplicable => println!("Nothing to add"),
        FixOutcome::Cancelled => println!("Cancelled"),
    }

    Ok(())
}
