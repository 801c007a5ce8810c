use std::path::PathBuf;

use clap::Parser;

use vault_tree::{error, EngineError, FsSource, NodeKind, Pane, PaneConfig};

/// Inspect a directory through the tree engine: build, expand, optionally
/// search, and print the flattened row list.
#[derive(Parser, Debug)]
#[command(name = "vtree", version, about)]
struct Cli {
    /// Root path to project (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Folders only, no file leaves
    #[arg(long)]
    no_files: bool,

    /// Maximum depth to expand
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Sort order: name, modified, size
    #[arg(long, default_value = "name")]
    sort: String,

    /// Filter the tree by a search query
    #[arg(long)]
    query: Option<String>,

    /// Focus on a sub-folder instead of the root
    #[arg(long)]
    focus: Option<PathBuf>,
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    let path = cli.path.canonicalize().map_err(|_| {
        EngineError::InvalidFocusTarget(cli.path.clone())
    })?;

    let config = PaneConfig {
        include_files: Some(!cli.no_files),
        max_depth: Some(cli.depth),
        sort_by: Some(cli.sort.clone()),
        ..PaneConfig::default()
    };

    let source = FsSource::new(&path)?;
    let mut pane = Pane::new(source, config);
    pane.expand_all();

    if let Some(focus) = &cli.focus {
        pane.focus_on(&path.join(focus))?;
        pane.expand_all();
    }
    if let Some(query) = &cli.query {
        pane.apply_search_query(query.clone());
    }

    if !pane.breadcrumb().is_empty() {
        let trail: Vec<&str> = pane.breadcrumb().iter().map(|c| c.name.as_str()).collect();
        println!("{}", trail.join(" > "));
    }

    let rows = pane.rows();
    for row in rows {
        let indent = "  ".repeat(row.level);
        let marker = match row.kind {
            NodeKind::Folder if row.is_expanded => "▾ ",
            NodeKind::Folder => "▸ ",
            NodeKind::File => "  ",
        };
        let count = match row.kind {
            NodeKind::Folder => pane
                .counts()
                .get(&row.path)
                .map(|c| format!("  ({})", c.recursive_file_count))
                .unwrap_or_default(),
            NodeKind::File => String::new(),
        };
        let score = row
            .search_score
            .map(|s| format!("  [{s:.2}]"))
            .unwrap_or_default();
        println!("{indent}{marker}{}{count}{score}", row.name);
        if row.depth_limited {
            println!("{indent}  …");
        }
    }

    if let Some(query) = &cli.query {
        let hits = rows.iter().filter(|r| r.search_score.is_some()).count();
        println!("\n{hits} match(es) for {query:?}");
    }
    Ok(())
}
