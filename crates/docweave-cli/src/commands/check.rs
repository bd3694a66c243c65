//! Check command implementation.
//!
//! Reports undocumented declarations without changing anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::json;
use tracing::info;

use docweave_core::{analyze, Diagnostic};

use super::{collect_sources, load_source, OutputFormat, Session};

/// Analyze every source file under `paths`.
///
/// Returns whether any diagnostic was reported.
pub async fn execute(session: &Session, paths: &[PathBuf], format: OutputFormat) -> Result<bool> {
    let sources = collect_sources(paths)?;
    let settings = session.settings.snapshot();
    info!(files = sources.len(), "Checking sources");

    let tasks = sources.into_iter().map(|path| {
        let settings = settings.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<(PathBuf, Vec<Diagnostic>)>> {
            let Some(doc) = load_source(&path)? else {
                return Ok(None);
            };
            let diagnostics = analyze(&doc, &settings);
            Ok(Some((path, diagnostics)))
        })
    });

    let mut reports = Vec::new();
    for joined in join_all(tasks).await {
        reports.extend(joined.context("Analysis task panicked")??);
    }

    let total: usize = reports.iter().map(|(_, diagnostics)| diagnostics.len()).sum();

    match format {
        OutputFormat::Text => {
            for (path, diagnostics) in &reports {
                for diagnostic in diagnostics {
                    println!("{}:{}", path.display(), diagnostic);
                }
            }
            if total > 0 {
                eprintln!(
                    "{} undocumented declaration(s) in {} file(s)",
                    total,
                    reports.iter().filter(|(_, d)| !d.is_empty()).count()
                );
            }
        }
        OutputFormat::Json => {
            let files: Vec<_> = reports
                .iter()
                .filter(|(_, diagnostics)| !diagnostics.is_empty())
                .map(|(path, diagnostics)| {
                    json!({
                        "path": path.display().to_string(),
                        "diagnostics": diagnostics,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "total": total, "files": files }))?);
        }
    }

    Ok(total > 0)
}
