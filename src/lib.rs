//! ontology-tree: Ontology tree pruning, search, sorting and selection state
//!
//! This crate turns a large shared ontology into the small, ordered trees
//! shown by checkbox-tree widgets:
//! - Generic tree model with lazy preorder/postorder walks
//! - Reference resolution against record classes and searches
//! - Three-tier sibling sort (branches, display order, name)
//! - Pruning by leaf predicate, visibility filters, search with hidden nodes
//! - Single-pick / multi-pick selection and expansion state
//! - Fetch-once ontology cache and YAML picker presets
//!
//! Rendering and the service layer that serves the raw ontology are not part
//! of this crate.

pub mod cache;
pub mod category;
pub mod config;
pub mod error;
pub mod model;
pub mod prune;
pub mod resolve;
pub mod search;
pub mod selection;
pub mod sort;
pub mod tree;
pub mod wire;

// Re-export commonly used types
pub use cache::{FileOntologySource, LoadedOntology, OntologyCache, OntologySource};
pub use category::{
    create_node, find_first_leaf_id, find_node, find_path, get_all_branch_ids, get_all_leaf_ids,
    is_category_id, is_qualifying, CategoryOntology, CategoryTreeNode, NodeKind, QualifyingSpec,
    Scope, TargetType, WdkReference,
};
pub use config::{ConfigLoader, EngineConfig, PickerPreset};
pub use error::{OntologyError, Result};
pub use model::{ModelEntity, ModelIndex};
pub use prune::{
    apply_visibility, filtered_node_children, get_tree, node_search_predicate,
    node_search_predicate_with_hidden_nodes, prune_descendant_nodes, prune_nodes, prune_tree,
    search_tree,
};
pub use resolve::{add_search_specific_subtree, prepare_ontology, prune_unknown_paths, resolve_references};
pub use search::{are_terms_in_string, is_term_in_string, parse_search_query_string, SearchQuery};
pub use selection::{
    CheckState, NodeView, SelectionMode, SelectionSeed, TreeAction, TreeEvent, TreeState,
    TreeStateSnapshot,
};
pub use sort::sort_ontology;
pub use tree::{Ontology, OntologyNode, Properties};
pub use wire::{parse_ontology_json, read_ontology_file, RawNode, RawOntology};
