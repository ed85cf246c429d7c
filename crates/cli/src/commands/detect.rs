//! Framework detection over files and directories

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use testbridge_core::{detect_framework, Framework};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::output::{print_list, OutputFormat, TableDisplay};

/// Extensions of files considered test sources when walking directories.
const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Files or directories to scan
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct Detection {
    pub path: String,
    pub framework: Option<Framework>,
}

impl TableDisplay for Detection {
    fn headers() -> Vec<&'static str> {
        vec!["Path", "Framework"]
    }

    fn row(&self) -> Vec<String> {
        let framework = self
            .framework
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        vec![self.path.clone(), framework]
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name == "node_modules" || name.starts_with('.'))
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Detect the framework of every source file under `paths`.
///
/// Paths named explicitly are always read; files found by walking a
/// directory must have a source extension. Non-UTF-8 files are skipped.
pub fn scan(paths: &[PathBuf]) -> Result<Vec<Detection>> {
    let mut found = Vec::new();
    for root in paths {
        if !root.exists() {
            anyhow::bail!("Path not found: {}", root.display());
        }
        for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| !is_skipped_dir(e)) {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() || (entry.depth() > 0 && !is_source_file(entry.path())) {
                continue;
            }
            let text = match std::fs::read_to_string(entry.path()) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let framework = detect_framework(&text);
            debug!(path = %entry.path().display(), ?framework, "detected");
            found.push(Detection {
                path: entry.path().display().to_string(),
                framework,
            });
        }
    }
    Ok(found)
}

pub fn execute(args: DetectArgs, format: OutputFormat) -> Result<()> {
    let detections = scan(&args.paths)?;
    print_list(&detections, format);
    Ok(())
}
