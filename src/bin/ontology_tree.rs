//! Ontology Tree Command Line Interface
//!
//! Loads the configured ontology and model, prepares the category tree, and
//! prints the tree a picker widget would show.
//!
//! # Usage
//!
//! ```bash
//! # Whole prepared tree
//! ontology_tree show
//!
//! # Download attribute picker, narrowed by a search, with a selection
//! ontology_tree show --picker download_attributes --search "gene" --selected gene_name,exon_count
//!
//! # Leaf ids a picker offers
//! ontology_tree ids --picker download_attributes
//!
//! # Configured picker presets
//! ontology_tree pickers
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ontology_tree::{
    add_search_specific_subtree, get_all_leaf_ids, CategoryTreeNode, CheckState, ConfigLoader,
    NodeView, OntologyCache, PickerPreset, SelectionMode, SelectionSeed, TreeState,
};

#[derive(Parser)]
#[command(name = "ontology_tree")]
#[command(version = "0.1.0")]
#[command(about = "Prune, search and inspect ontology category trees")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory (defaults to ONTOLOGY_TREE_CONFIG_DIR, then "config")
    #[arg(long, global = true, env = "ONTOLOGY_TREE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Override the ontology JSON path from the config
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    /// Override the model JSON path from the config
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tree with check states
    Show {
        /// Picker preset to prune with
        #[arg(short, long)]
        picker: Option<String>,

        /// Search query
        #[arg(short, long)]
        search: Option<String>,

        /// Selected leaf ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        selected: Option<Vec<String>>,

        /// Prepend the search-specific subtree of this question
        #[arg(long)]
        question: Option<String>,

        /// Expand the path to this node id
        #[arg(long)]
        reveal: Option<String>,

        /// Expand every branch
        #[arg(long)]
        expand_all: bool,
    },

    /// Print the leaf ids offered by the tree
    Ids {
        /// Picker preset to prune with
        #[arg(short, long)]
        picker: Option<String>,
    },

    /// List configured picker presets
    Pickers,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::new(dir.clone()),
        None => ConfigLoader::from_env(),
    };
    let mut config = loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.config_path().display()))?;
    if let Some(path) = cli.ontology {
        config.ontology_path = path;
    }
    if let Some(path) = cli.model {
        config.model_path = path;
    }

    if let Commands::Pickers = cli.command {
        for (name, preset) in &config.pickers {
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&(name, preset))?),
                OutputFormat::Text => println!("{}: {}", name, describe_preset(preset)),
            }
        }
        return Ok(());
    }

    let cache = OntologyCache::new(config.file_source());
    let loaded = cache.get().await.with_context(|| {
        format!(
            "Failed to load ontology {} with model {}",
            config.ontology_path.display(),
            config.model_path.display()
        )
    })?;

    match cli.command {
        Commands::Show {
            picker,
            search,
            selected,
            question,
            reveal,
            expand_all,
        } => {
            let mut tree = loaded.ontology.tree.clone();
            if let Some(name) = question {
                let question = loaded
                    .model
                    .question(&name)
                    .ok_or_else(|| anyhow!("Unknown question '{}'", name))?;
                tree = add_search_specific_subtree(question, tree);
            }

            let preset = picker.map(|name| config.picker(&name).cloned()).transpose()?;
            if let Some(preset) = &preset {
                tree = preset.prune(&tree);
            }
            let mode = preset
                .as_ref()
                .map_or(SelectionMode::MultiPick, PickerPreset::selection_mode);
            let seed = selected.map(SelectionSeed::current).unwrap_or_default();

            let mut state = TreeState::new(mode, seed);
            let searching = search.as_deref().is_some_and(|s| !s.trim().is_empty());
            if let Some(term) = search {
                state.set_search_term(term);
            }

            let is_visible =
                |node: &CategoryTreeNode| preset.as_ref().map_or(true, |p| p.is_visible(node));
            let visible = state.visible_tree(&tree, &is_visible);
            if searching || expand_all {
                state.expand_all(&visible);
            }
            if let Some(id) = reveal {
                state.expand_path_to(&visible, &id);
            }

            let view = state.node_view(&visible);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Text => print_view(&view, 0),
            }
        }

        Commands::Ids { picker } => {
            let tree = match picker {
                Some(name) => config.picker(&name)?.prune(&loaded.ontology.tree),
                None => loaded.ontology.tree.clone(),
            };
            let ids = get_all_leaf_ids(&tree);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&ids)?),
                OutputFormat::Text => ids.iter().for_each(|id| println!("{}", id)),
            }
        }

        Commands::Pickers => {}
    }

    Ok(())
}

/// Filter from RUST_LOG directives, falling back to warn when unset or invalid
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

// =============================================================================
// OUTPUT
// =============================================================================

fn describe_preset(preset: &PickerPreset) -> String {
    let mut parts = Vec::new();
    if let Some(target_type) = preset.target_type {
        parts.push(format!("targetType={}", target_type));
    }
    if let Some(scope) = preset.scope {
        parts.push(format!("scope={}", scope));
    }
    if let Some(record_class) = &preset.record_class_name {
        parts.push(format!("recordClassName={}", record_class));
    }
    parts.push(if preset.multi_pick { "multi-pick" } else { "single-pick" }.to_string());
    if preset.hide_internal {
        parts.push("hide-internal".to_string());
    }
    parts.join(", ")
}

fn print_view(view: &NodeView, depth: usize) {
    let check = match view.check_state {
        CheckState::Checked => "[x]",
        CheckState::Indeterminate => "[-]",
        CheckState::Unchecked => "[ ]",
    };
    let fold = if view.is_leaf() {
        " "
    } else if view.expanded {
        "v"
    } else {
        ">"
    };
    println!(
        "{}{} {} {} ({})",
        "  ".repeat(depth),
        fold,
        check,
        view.display_name,
        view.id
    );
    if view.expanded || depth == 0 {
        for child in &view.children {
            print_view(child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(Some("ontology_tree=loud")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_log_filter_honours_rust_log() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("ontology_tree=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }
}
