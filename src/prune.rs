//! Tree reducer: pruning, visibility and search
//!
//! Pruning derives a minimal sub-tree from the large shared ontology. A node
//! that fails the predicate is *spliced out*: its own (already pruned)
//! children take its place in the parent. With the predicate
//! `has children || leaf predicate` ([`prune_tree`]) this keeps exactly the
//! nodes that pass the leaf predicate or still have a surviving descendant.
//!
//! ```text
//!   prune_tree(R, is_attribute)
//!
//!        R                      R
//!       / \                     |
//!      A   B        ==>         A
//!     / \   \                   |
//!    x   t   t                  x
//!
//!   x = attribute, t = table; B loses every leaf and is dropped
//! ```
//!
//! The root itself is always retained, so the result is a tree even when
//! nothing qualifies.
//!
//! Visibility filters hide children from display without removing them from
//! search: [`node_search_predicate_with_hidden_nodes`] still matches a node
//! when one of its hidden children would have matched.

use crate::category::CategoryTreeNode;
use crate::search::SearchQuery;
use crate::tree::{Ontology, OntologyNode};

// =============================================================================
// PRUNING
// =============================================================================

/// Prune a list of sibling nodes.
///
/// Each node's descendants are pruned first. A node that then passes
/// `predicate` is kept; one that fails is replaced by its pruned children.
pub fn prune_nodes<T, P>(nodes: &[OntologyNode<T>], predicate: &P) -> Vec<OntologyNode<T>>
where
    T: Clone,
    P: Fn(&OntologyNode<T>) -> bool,
{
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes {
        let pruned = prune_descendant_nodes(node, predicate);
        if predicate(&pruned) {
            kept.push(pruned);
        } else {
            kept.extend(pruned.children);
        }
    }
    kept
}

/// Copy of `node` whose descendants are pruned by `predicate`; `node` itself
/// is kept regardless
pub fn prune_descendant_nodes<T, P>(node: &OntologyNode<T>, predicate: &P) -> OntologyNode<T>
where
    T: Clone,
    P: Fn(&OntologyNode<T>) -> bool,
{
    shallow_copy(node).with_children(prune_nodes(&node.children, predicate))
}

/// Minimal sub-tree whose nodes pass `leaf_predicate` or lead to one that does
pub fn prune_tree<T, P>(root: &OntologyNode<T>, leaf_predicate: P) -> OntologyNode<T>
where
    T: Clone,
    P: Fn(&OntologyNode<T>) -> bool,
{
    prune_descendant_nodes(root, &|node: &OntologyNode<T>| {
        node.is_branch() || leaf_predicate(node)
    })
}

/// [`prune_tree`] over an ontology's tree
pub fn get_tree<T, P>(ontology: &Ontology<T>, leaf_predicate: P) -> OntologyNode<T>
where
    T: Clone,
    P: Fn(&OntologyNode<T>) -> bool,
{
    prune_tree(&ontology.tree, leaf_predicate)
}

fn shallow_copy<T: Clone>(node: &OntologyNode<T>) -> OntologyNode<T> {
    OntologyNode::new(node.properties.clone(), node.payload.clone())
}

// =============================================================================
// VISIBILITY
// =============================================================================

/// Visibility filter that hides nothing
pub fn all_visible<T>(_node: &OntologyNode<T>) -> bool {
    true
}

/// Children getter that skips children rejected by `visibility_filter`.
///
/// Pair it with [`crate::tree::preorder_by`] to walk the visible view of a
/// tree without copying it.
pub fn filtered_node_children<'a, T, V>(
    visibility_filter: V,
) -> impl Fn(&'a OntologyNode<T>) -> Vec<&'a OntologyNode<T>>
where
    T: 'a,
    V: Fn(&OntologyNode<T>) -> bool,
{
    move |node: &'a OntologyNode<T>| {
        node.children
            .iter()
            .filter(|child| visibility_filter(child))
            .collect()
    }
}

/// Copy of the tree with every child rejected by `visibility_filter` removed,
/// along with its subtree. The root is kept.
///
/// A branch whose children are all hidden is removed too, so it never shows
/// up as a selectable leaf.
pub fn apply_visibility<T, V>(root: &OntologyNode<T>, visibility_filter: &V) -> OntologyNode<T>
where
    T: Clone,
    V: Fn(&OntologyNode<T>) -> bool,
{
    shallow_copy(root).with_children(visible_children(root, visibility_filter))
}

fn visible_children<T, V>(node: &OntologyNode<T>, visibility_filter: &V) -> Vec<OntologyNode<T>>
where
    T: Clone,
    V: Fn(&OntologyNode<T>) -> bool,
{
    node.children
        .iter()
        .filter(|child| visibility_filter(child))
        .filter_map(|child| {
            let children = visible_children(child, visibility_filter);
            if child.is_branch() && children.is_empty() {
                return None;
            }
            Some(shallow_copy(child).with_children(children))
        })
        .collect()
}

// =============================================================================
// SEARCH
// =============================================================================

/// Does the node's own text match? Matches against the display name and the
/// tooltip text; missing text counts as empty.
pub fn node_search_predicate(node: &CategoryTreeNode, query: &SearchQuery) -> bool {
    if query.is_empty() {
        return true;
    }
    let text = format!(
        "{} {}",
        node.display_name().unwrap_or_default(),
        node.tooltip().unwrap_or_default()
    );
    query.matches(&text)
}

/// Does the node match directly, or would any of its hidden children (or
/// their descendants) have matched?
pub fn node_search_predicate_with_hidden_nodes<V>(
    node: &CategoryTreeNode,
    query: &SearchQuery,
    visibility_filter: &V,
) -> bool
where
    V: Fn(&CategoryTreeNode) -> bool,
{
    node_search_predicate(node, query)
        || node
            .children
            .iter()
            .filter(|child| !visibility_filter(child))
            .any(|hidden| hidden.preorder().any(|n| node_search_predicate(n, query)))
}

/// Visible view of the tree narrowed to a search.
///
/// A matching node is kept with its whole visible subtree; a non-matching
/// node is kept only when a visible descendant survives. A matching branch
/// with no visible children left is dropped. Matching accounts
/// for hidden children. The root is always kept, and a blank query returns
/// the full visible view.
pub fn search_tree<V>(
    root: &CategoryTreeNode,
    query: &SearchQuery,
    visibility_filter: &V,
) -> CategoryTreeNode
where
    V: Fn(&CategoryTreeNode) -> bool,
{
    if query.is_empty() {
        return apply_visibility(root, visibility_filter);
    }
    shallow_copy(root).with_children(search_children(root, query, visibility_filter))
}

fn search_children<V>(
    node: &CategoryTreeNode,
    query: &SearchQuery,
    visibility_filter: &V,
) -> Vec<CategoryTreeNode>
where
    V: Fn(&CategoryTreeNode) -> bool,
{
    node.children
        .iter()
        .filter(|child| visibility_filter(child))
        .filter_map(|child| {
            if node_search_predicate_with_hidden_nodes(child, query, visibility_filter) {
                let shown = apply_visibility(child, visibility_filter);
                // matched only through hidden children and nothing left to show
                return (child.is_leaf() || shown.is_branch()).then_some(shown);
            }
            let children = search_children(child, query, visibility_filter);
            (!children.is_empty()).then(|| shallow_copy(child).with_children(children))
        })
        .collect()
}
