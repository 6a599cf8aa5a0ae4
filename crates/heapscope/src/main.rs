use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use heapscope_analysis::{analyze, spawn_statistics};
use heapscope_diff::diff;
use heapscope_graph::{GraphStore, RetainerIndex};
use heapscope_schemas::NodeId;
use heapscope_view::{
    RetainerTree, ViewConfig, comparison_rows, load_view_config, summary_rows,
};
use itertools::Itertools;
use mimalloc::MiMalloc;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Inspect heap snapshots: what is alive, what keeps it alive, and what
/// changed between two captures.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Output file path (writes to stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-class counts, shallow sizes, and retained sizes
    Summary {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Column to sort by
        #[arg(long, default_value = "retainedSize")]
        sort: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,

        /// Print at most this many classes
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Retainer tree of one object
    Retainers {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Id of the object to explain
        #[arg(long)]
        node: u64,

        /// View configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Shallow sizes by node category
    Stats {
        /// Snapshot JSON file
        snapshot: PathBuf,
    },

    /// Per-class changes from a base snapshot to a target snapshot
    Diff {
        /// Earlier snapshot
        base: PathBuf,

        /// Later snapshot
        target: PathBuf,

        /// Column to sort by
        #[arg(long, default_value = "sizeDelta")]
        sort: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays pipeable. Default to warn and
    // allowlist our crates.
    const CRATES: &[&str] = &[
        "heapscope",
        "heapscope_analysis",
        "heapscope_diff",
        "heapscope_graph",
        "heapscope_schemas",
        "heapscope_view",
    ];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES.iter().map(|c| format!("{c}={level}")).join(",");
    let filter = EnvFilter::new(format!("warn,{allowlist}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
        .init();

    // Stdout must outlive its lock, so bind it first.
    let stdout = std::io::stdout();
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout.lock()),
    };

    match cli.command {
        Commands::Summary {
            snapshot,
            sort,
            ascending,
            limit,
        } => run_summary(&snapshot, &sort, ascending, limit, &mut *writer),
        Commands::Retainers {
            snapshot,
            node,
            config,
        } => run_retainers(
            &snapshot,
            NodeId(node),
            config.as_deref(),
            &mut *writer,
        ),
        Commands::Stats { snapshot } => run_stats(&snapshot, &mut *writer),
        Commands::Diff {
            base,
            target,
            sort,
            ascending,
        } => run_diff(&base, &target, &sort, ascending, &mut *writer),
    }
}

fn load(path: &Path) -> Result<GraphStore> {
    let store = GraphStore::load_snapshot(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    info!(
        path = %path.display(),
        nodes = store.node_count(),
        edges = store.edge_count(),
        "Loaded snapshot"
    );
    Ok(store)
}

fn write_json(value: &impl Serialize, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn run_summary(
    snapshot: &Path,
    sort: &str,
    ascending: bool,
    limit: Option<usize>,
    writer: &mut dyn Write,
) -> Result<()> {
    let store = load(snapshot)?;
    let analysis = analyze(&store)?;
    let mut rows = summary_rows(&analysis.classes, sort, ascending)?;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    write_json(&rows, writer)
}

fn run_retainers(
    snapshot: &Path,
    node: NodeId,
    config: Option<&Path>,
    writer: &mut dyn Write,
) -> Result<()> {
    let config = match config {
        Some(path) => load_view_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ViewConfig::default(),
    };
    let store = load(snapshot)?;
    let tree = RetainerTree::build(RetainerIndex::new(&store), node, &config)?;
    write_json(&tree.rows(), writer)
}

fn run_stats(snapshot: &Path, writer: &mut dyn Write) -> Result<()> {
    let store = Arc::new(load(snapshot)?);
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    // The blocking task must be spawned from inside the runtime.
    let statistics =
        runtime.block_on(async { spawn_statistics(store).await })?;
    write_json(&statistics, writer)
}

fn run_diff(
    base: &Path,
    target: &Path,
    sort: &str,
    ascending: bool,
    writer: &mut dyn Write,
) -> Result<()> {
    let (base, target) = rayon::join(|| load(base), || load(target));
    let result = diff(&base?, &target?);
    let rows = comparison_rows(&result, sort, ascending)?;
    write_json(&rows, writer)
}

#[cfg(test)]
mod tests {
    use heapscope_schemas::{NodeType, SnapshotBuilder, SnapshotRecord};
    use serde_json::Value;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_snapshot(record: &SnapshotRecord) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        serde_json::to_writer(file.as_file(), record).unwrap();
        file
    }

    fn make_items(count: usize) -> SnapshotRecord {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let list = builder.add_node("", 16, NodeType::Array);
        builder.property(root, list, "items");
        for i in 0..count {
            let item = builder.add_object("Item", 10);
            builder.property(list, item, &format!("{i}"));
        }
        builder.build()
    }

    fn output(run: impl FnOnce(&mut dyn Write) -> Result<()>) -> Value {
        let mut buffer = Vec::new();
        run(&mut buffer).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn summary_is_limited_and_sorted() {
        let file = write_snapshot(&make_items(4));
        let rows = output(|w| {
            run_summary(file.path(), "retainedSize", false, Some(1), w)
        });
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["object"], "(array)");
        assert_eq!(rows[0]["retainedSize"], 56);
    }

    #[test]
    fn summary_rejects_unknown_column() {
        let file = write_snapshot(&make_items(1));
        let err =
            run_summary(file.path(), "bogus", false, None, &mut Vec::new())
                .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn stats_runs_on_blocking_pool() {
        let file = write_snapshot(&make_items(2));
        let stats = output(|w| run_stats(file.path(), w));
        assert_eq!(stats["total"], 36);
        assert_eq!(stats["js_arrays"], 16);
        assert_eq!(stats["js_objects"], 20);
    }

    #[test]
    fn retainers_follow_config() {
        let record = make_items(1);
        let item = record.nodes.last().unwrap().id;
        let file = write_snapshot(&record);
        let mut config = NamedTempFile::new().unwrap();
        write!(config, r#"{{"auto_expand_depth": 1}}"#).unwrap();

        let rows = output(|w| {
            run_retainers(file.path(), item, Some(config.path()), w)
        });
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "(array)");
        assert_eq!(rows[0]["edgeName"], "0");
        assert_eq!(rows[0]["expanded"], false);
    }

    #[test]
    fn diff_reports_growth() {
        let base = write_snapshot(&make_items(2));
        let target = write_snapshot(&make_items(5));
        let rows =
            output(|w| run_diff(base.path(), target.path(), "object", true, w));
        let item = rows
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["object"] == "Item")
            .unwrap();
        assert_eq!(item["countDelta"], 3);
        assert_eq!(item["sizeDelta"], 30);
    }
}
