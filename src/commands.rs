//! CLI command implementations

use anyhow::{bail, Context};
use codemap_core::{clear_state, load_graph, Config, Language};
use codemap_indexer::{Coordinator, FileFailure, IndexReport, SkippedFile, UnresolvedImport};
use codemap_sync::{Status, SyncEngine, SyncOptions, SyncReport};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct IndexSummary<'a> {
    modules: usize,
    edges: usize,
    failures: &'a [FileFailure],
    skipped: &'a [SkippedFile],
    dangling: usize,
    unresolved: &'a [UnresolvedImport],
}

impl<'a> From<&'a IndexReport> for IndexSummary<'a> {
    fn from(report: &'a IndexReport) -> Self {
        IndexSummary {
            modules: report.graph.module_count(),
            edges: report.graph.edge_count(),
            failures: &report.failures,
            skipped: &report.skipped,
            dangling: report.dangling.len(),
            unresolved: &report.unresolved,
        }
    }
}

fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).with_context(|| format!("Failed to load config for {}", root.display()))
}

pub fn index(root: &Path, lang: Option<Language>, json: bool) -> anyhow::Result<()> {
    tracing::info!("Indexing project: {}", root.display());
    let config = load_config(root)?;

    let report = Coordinator::new(root)
        .with_languages(config.languages(lang))
        .run_full_index()
        .with_context(|| format!("Failed to index {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&IndexSummary::from(&report))?);
        return Ok(());
    }

    println!(
        "{} modules, {} edges",
        report.graph.module_count(),
        report.graph.edge_count()
    );
    for failure in &report.failures {
        match failure.line {
            Some(line) => println!("  failed  {}:{}: {}", failure.path, line, failure.reason),
            None => println!("  failed  {}: {}", failure.path, failure.reason),
        }
    }
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path, skipped.reason);
    }
    if !report.unresolved.is_empty() {
        println!("{} unresolved relative imports", report.unresolved.len());
    }
    Ok(())
}

pub fn sync(
    root: &Path,
    learn: bool,
    lang: Option<Language>,
    verbose: bool,
    json: bool,
) -> anyhow::Result<()> {
    tracing::info!("Syncing knowledge for: {}", root.display());
    let config = load_config(root)?;
    let options = SyncOptions {
        learn: learn || config.sync.learn,
        languages: config.languages(lang),
    };

    let report = SyncEngine::new(root)
        .run(&options)
        .with_context(|| format!("Failed to sync {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
        return Ok(());
    }
    print_sync_report(&report, verbose);
    Ok(())
}

fn print_sync_report(report: &SyncReport, verbose: bool) {
    if report.recovered_cache {
        println!("knowledge cache was unreadable and has been reset");
    }
    let counts = report.counts();
    println!(
        "{} known, {} stale, {} unknown, {} deleted",
        counts.known, counts.stale, counts.unknown, counts.deleted
    );

    if verbose {
        for status in Status::ALL {
            let paths = report.paths_with(status);
            if paths.is_empty() {
                continue;
            }
            println!("{status}:");
            for path in paths {
                println!("  {path}");
            }
        }
    }

    if !report.learned.is_empty() {
        println!("learned {} files", report.learned.len());
    }
    for error in &report.errors {
        println!("  error {}: {}", error.path, error.reason);
    }
}

pub fn deps(root: &Path, path: &str, transitive: bool) -> anyhow::Result<()> {
    let graph = load_graph(root)
        .with_context(|| format!("Failed to read graph for {}", root.display()))?
        .context("No graph found; run `codemap index` first")?;
    if graph.module(path).is_none() {
        bail!("{path} is not in the graph");
    }

    println!("{path}");
    println!("imports:");
    for dep in graph.dependencies(path) {
        println!("  {dep}");
    }
    println!("imported by:");
    for dependent in graph.dependents(path) {
        println!("  {dependent}");
    }
    if transitive {
        println!("affected transitively:");
        for dependent in graph.transitive_dependents(path) {
            println!("  {dependent}");
        }
    }
    Ok(())
}

pub fn clear(root: &Path, all: bool) -> anyhow::Result<()> {
    tracing::info!("Clearing state for: {}", root.display());

    let removed = clear_state(root, all)
        .with_context(|| format!("Failed to clear state for {}", root.display()))?;
    for path in &removed {
        tracing::debug!("Removed {}", path.display());
    }

    tracing::info!("Removed {} files", removed.len());
    Ok(())
}
