//! Fix command implementation.
//!
//! Files are fixed concurrently; results are written one file at a time
//! once every file is done.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use docweave_core::{analyze, BatchOutcome, DocFixer, Settings};

use super::{collect_sources, load_source, Session};

/// Fix results for one file.
struct FileReport {
    path: PathBuf,
    original: String,
    outcome: BatchOutcome,
}

impl FileReport {
    fn changed(&self) -> bool {
        self.outcome.text != self.original
    }
}

/// Fix every diagnostic in the sources under `paths`.
///
/// Returns whether any fix failed.
pub async fn execute(session: &Session, paths: &[PathBuf], dry_run: bool) -> Result<bool> {
    let sources = collect_sources(paths)?;
    let settings = session.settings.snapshot();
    info!(files = sources.len(), dry_run, "Fixing sources");

    let tasks = sources.into_iter().map(|path| {
        let fixer = Arc::clone(&session.fixer);
        let settings = Arc::clone(&settings);
        let cancel = session.cancel.clone();
        tokio::spawn(async move { fix_file(path, &fixer, &settings, &cancel).await })
    });

    let mut reports = Vec::new();
    for joined in join_all(tasks).await {
        reports.extend(joined.context("Fix task panicked")??);
    }

    let mut written = 0;
    let mut failed = false;

    for report in &reports {
        let outcome = &report.outcome;
        if outcome.cancelled {
            println!("{}: cancelled", report.path.display());
            continue;
        }

        if report.changed() && !dry_run {
            std::fs::write(&report.path, &outcome.text)
                .with_context(|| format!("Failed to write {}", report.path.display()))?;
            written += 1;
        }

        if outcome.applied > 0 || !outcome.failures.is_empty() {
            println!(
                "{}: {} applied, {} failed",
                report.path.display(),
                outcome.applied,
                outcome.failures.len()
            );
        }
        for (diagnostic, message) in &outcome.failures {
            failed = true;
            println!(
                "  {}:{}:{}: {} '{}': {}",
                report.path.display(),
                diagnostic.start.line,
                diagnostic.start.column,
                diagnostic.kind,
                diagnostic.name,
                message
            );
        }
    }

    let applied: usize = reports.iter().map(|r| r.outcome.applied).sum();
    if dry_run {
        println!(
            "Dry run: {} fix(es) in {} file(s) would be applied",
            applied,
            reports.iter().filter(|r| r.changed()).count()
        );
    } else {
        println!("Applied {} fix(es), wrote {} file(s)", applied, written);
    }

    Ok(failed)
}

async fn fix_file(
    path: PathBuf,
    fixer: &DocFixer,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<Option<FileReport>> {
    let Some(doc) = load_source(&path)? else {
        return Ok(None);
    };
    let diagnostics = analyze(&doc, settings);
    debug!(path = %path.display(), diagnostics = diagnostics.len(), "fix_file_start");

    let outcome = fixer
        .fix_all(&doc, &diagnostics, settings, cancel)
        .await
        .with_context(|| format!("Failed to fix {}", path.display()))?;

    Ok(Some(FileReport {
        path,
        original: doc.into_text(),
        outcome,
    }))
}
