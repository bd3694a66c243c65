//! CLI command implementations.

pub mod check;
pub mod config;
pub mod fix;
pub mod preview;
pub mod refactor;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

use docweave_core::{DocFixer, Position, SharedSettings, SourceDocument};
use docweave_llm::RigGenerator;

use crate::config::Config;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// State shared by the commands of one invocation.
pub struct Session {
    pub settings: SharedSettings,
    pub fixer: Arc<DocFixer>,
    pub cancel: CancellationToken,
}

impl Session {
    /// Build a session; Ctrl-C cancels pending generation requests.
    pub fn new(config: &Config, concurrency: usize) -> Self {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling pending requests");
                on_interrupt.cancel();
            }
        });

        let fixer = DocFixer::new(Arc::new(RigGenerator::new())).with_concurrency(concurrency);

        Self {
            settings: SharedSettings::new(config.settings.clone()),
            fixer: Arc::new(fixer),
            cancel,
        }
    }
}

/// Collect `.cs` files under `paths`, sorted and without duplicates.
///
/// Files named explicitly are taken as they are; directories are walked,
/// skipping hidden and build output directories.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for path in paths {
        if path.is_file() {
            sources.push(path.clone());
            continue;
        }
        if !path.exists() {
            anyhow::bail!("Path not found: {}", path.display());
        }

        for entry in WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(is_hidden(e) || is_blacklisted(e)))
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && is_csharp(entry.path()) {
                sources.push(entry.into_path());
            }
        }
    }

    sources.sort();
    sources.dedup();
    debug!(count = sources.len(), "sources_collected");
    Ok(sources)
}

/// Read and parse one file.
pub fn load_document(path: &Path) -> Result<SourceDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    SourceDocument::parse(text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read and parse one file found by a directory walk.
///
/// Files that are not UTF-8 are skipped with a warning instead of failing
/// the whole run.
pub fn load_source(path: &Path) -> Result<Option<SourceDocument>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let Ok(text) = String::from_utf8(bytes) else {
        warn!(path = %path.display(), "skipping source that is not valid UTF-8");
        return Ok(None);
    };
    let doc = SourceDocument::parse(text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(doc))
}

/// Byte offset of a 1-based line and column.
pub fn offset_of(doc: &SourceDocument, path: &Path, line: usize, column: usize) -> Result<usize> {
    doc.offset(Position { line, column }).with_context(|| {
        format!("{}:{}:{} is outside the file", path.display(), line, column)
    })
}

fn is_csharp(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("cs"))
        .unwrap_or(false)
}

/// Check if entry is hidden (starts with .).
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Check if entry is a build output or dependency directory.
fn is_blacklisted(entry: &walkdir::DirEntry) -> bool {
    const BLACKLIST: &[&str] = &["bin", "obj", "packages", "node_modules", "TestResults"];

    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|s| BLACKLIST.contains(&s))
            .unwrap_or(false)
}
