//! Tree traversal primitives
//!
//! Preorder and postorder walks are lazy iterators driven by a children
//! getter, so the same walk works over the full tree or over a filtered view
//! (see [`crate::prune::filtered_node_children`]). Each call starts a fresh
//! walk; there is no shared cursor.
//!
//! ```text
//!              1
//!             / \
//!            2   3
//!           / \   \
//!          4   5   6
//!
//!     preorder:    1 2 4 5 3 6
//!     postorder:   4 5 2 6 3 1
//! ```

use super::OntologyNode;

pub type ChildIter<'a, T> = std::slice::Iter<'a, OntologyNode<T>>;

pub(crate) fn child_iter<T>(node: &OntologyNode<T>) -> ChildIter<'_, T> {
    node.children.iter()
}

/// Preorder walk over an [`OntologyNode`] tree
pub type NodePreorder<'a, T> =
    Preorder<'a, OntologyNode<T>, fn(&'a OntologyNode<T>) -> ChildIter<'a, T>>;

/// Postorder walk over an [`OntologyNode`] tree
pub type NodePostorder<'a, T> =
    Postorder<'a, OntologyNode<T>, fn(&'a OntologyNode<T>) -> ChildIter<'a, T>>;

// =============================================================================
// PREORDER
// =============================================================================

/// Top-down iterator: parent before children, depth-first, left to right
#[derive(Clone)]
pub struct Preorder<'a, N, F> {
    stack: Vec<&'a N>,
    children: F,
}

impl<'a, N, F, I> Iterator for Preorder<'a, N, F>
where
    F: FnMut(&'a N) -> I,
    I: IntoIterator<Item = &'a N>,
    I::IntoIter: DoubleEndedIterator,
{
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        let node = self.stack.pop()?;
        self.stack.extend((self.children)(node).into_iter().rev());
        Some(node)
    }
}

/// Walk `root` in preorder using `children` to enumerate each node's children
pub fn preorder_by<'a, N, F>(root: &'a N, children: F) -> Preorder<'a, N, F> {
    Preorder {
        stack: vec![root],
        children,
    }
}

// =============================================================================
// POSTORDER
// =============================================================================

/// Bottom-up iterator: children before parent, depth-first, left to right
#[derive(Clone)]
pub struct Postorder<'a, N, F> {
    /// (node, children already scheduled)
    stack: Vec<(&'a N, bool)>,
    children: F,
}

impl<'a, N, F, I> Iterator for Postorder<'a, N, F>
where
    F: FnMut(&'a N) -> I,
    I: IntoIterator<Item = &'a N>,
    I::IntoIter: DoubleEndedIterator,
{
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        loop {
            let (node, scheduled) = self.stack.pop()?;
            if scheduled {
                return Some(node);
            }
            self.stack.push((node, true));
            self.stack
                .extend((self.children)(node).into_iter().rev().map(|c| (c, false)));
        }
    }
}

/// Walk `root` in postorder using `children` to enumerate each node's children
pub fn postorder_by<'a, N, F>(root: &'a N, children: F) -> Postorder<'a, N, F> {
    Postorder {
        stack: vec![(root, false)],
        children,
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Path from the root to the first node (in preorder) satisfying `is_target`.
///
/// The returned path starts at `root` and ends at the target itself. It is
/// empty when no node matches.
pub fn find_ancestors<'a, T, P>(root: &'a OntologyNode<T>, is_target: P) -> Vec<&'a OntologyNode<T>>
where
    P: Fn(&OntologyNode<T>) -> bool,
{
    fn walk<'a, T, P>(
        node: &'a OntologyNode<T>,
        is_target: &P,
        path: &mut Vec<&'a OntologyNode<T>>,
    ) -> bool
    where
        P: Fn(&OntologyNode<T>) -> bool,
    {
        path.push(node);
        if is_target(node) {
            return true;
        }
        for child in &node.children {
            if walk(child, is_target, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    walk(root, &is_target, &mut path);
    path
}

/// All leaf nodes under `root`, in preorder
pub fn leaves<T>(root: &OntologyNode<T>) -> Vec<&OntologyNode<T>> {
    root.preorder().filter(|n| n.is_leaf()).collect()
}

/// All branch nodes under `root` (including `root` itself), in preorder
pub fn branches<T>(root: &OntologyNode<T>) -> Vec<&OntologyNode<T>> {
    root.preorder().filter(|n| n.is_branch()).collect()
}

/// All nodes satisfying `predicate`, in preorder
pub fn filter_nodes<T, P>(root: &OntologyNode<T>, predicate: P) -> Vec<&OntologyNode<T>>
where
    P: Fn(&OntologyNode<T>) -> bool,
{
    root.preorder().filter(|n| predicate(n)).collect()
}

/// Convert a tree into a new structure bottom-up.
///
/// Each node is passed to `map_fn` together with the already-mapped values of
/// its children, so the mapping decides how to integrate them.
pub fn map_structure<T, U, F>(root: &OntologyNode<T>, map_fn: &mut F) -> U
where
    F: FnMut(&OntologyNode<T>, Vec<U>) -> U,
{
    let mapped_children = root
        .children
        .iter()
        .map(|child| map_structure(child, map_fn))
        .collect();
    map_fn(root, mapped_children)
}

/// Reduce a tree to a single value, visiting nodes bottom-up
pub fn fold_structure<T, U, F>(root: &OntologyNode<T>, seed: U, reducer: F) -> U
where
    F: FnMut(U, &OntologyNode<T>) -> U,
{
    root.postorder().fold(seed, reducer)
}

/// While the root has exactly one child, descend into that child
pub fn compact_root_nodes<T>(root: &OntologyNode<T>) -> &OntologyNode<T> {
    let mut current = root;
    while current.children.len() == 1 {
        current = &current.children[0];
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Properties;

    fn node(label: &str, children: Vec<OntologyNode<()>>) -> OntologyNode<()> {
        OntologyNode::new(Properties::new().with("label", label), ()).with_children(children)
    }

    fn label<T>(n: &OntologyNode<T>) -> &str {
        n.property("label").unwrap_or_default()
    }

    //              1
    //             / \
    //            2   3
    //           / \   \
    //          4   5   6
    //         /       / \
    //        7       8   9
    fn build_test_tree() -> OntologyNode<()> {
        node(
            "1",
            vec![
                node("2", vec![node("4", vec![node("7", vec![])]), node("5", vec![])]),
                node("3", vec![node("6", vec![node("8", vec![]), node("9", vec![])])]),
            ],
        )
    }

    #[test]
    fn test_preorder() {
        let tree = build_test_tree();
        let order: Vec<&str> = tree.preorder().map(label).collect();
        assert_eq!(order, vec!["1", "2", "4", "7", "5", "3", "6", "8", "9"]);
    }

    #[test]
    fn test_postorder() {
        let tree = build_test_tree();
        let order: Vec<&str> = tree.postorder().map(label).collect();
        assert_eq!(order, vec!["7", "4", "5", "2", "8", "9", "6", "3", "1"]);
    }

    #[test]
    fn test_walks_are_restartable() {
        let tree = build_test_tree();
        let first: Vec<&str> = tree.preorder().map(label).collect();
        let partial: Vec<&str> = tree.preorder().take(3).map(label).collect();
        let second: Vec<&str> = tree.preorder().map(label).collect();
        assert_eq!(first, second);
        assert_eq!(partial, vec!["1", "2", "4"]);
    }

    #[test]
    fn test_preorder_by_filtered_children() {
        let tree = build_test_tree();
        // Hide node "2" and everything below it
        fn visible(n: &OntologyNode<()>) -> Vec<&OntologyNode<()>> {
            n.children.iter().filter(|c| label(c) != "2").collect()
        }
        let order: Vec<&str> = preorder_by(&tree, visible).map(label).collect();
        assert_eq!(order, vec!["1", "3", "6", "8", "9"]);
    }

    #[test]
    fn test_find_ancestors() {
        let tree = build_test_tree();
        let path: Vec<&str> = find_ancestors(&tree, |n| label(n) == "8")
            .into_iter()
            .map(label)
            .collect();
        assert_eq!(path, vec!["1", "3", "6", "8"]);

        assert!(find_ancestors(&tree, |n| label(n) == "42").is_empty());
    }

    #[test]
    fn test_leaves_and_branches() {
        let tree = build_test_tree();
        let leaf_labels: Vec<&str> = leaves(&tree).into_iter().map(label).collect();
        assert_eq!(leaf_labels, vec!["7", "5", "8", "9"]);

        let branch_labels: Vec<&str> = branches(&tree).into_iter().map(label).collect();
        assert_eq!(branch_labels, vec!["1", "2", "4", "3", "6"]);
    }

    #[test]
    fn test_map_structure_counts_leaves() {
        let tree = build_test_tree();
        let leaf_count = map_structure(&tree, &mut |_n: &OntologyNode<()>, kids: Vec<usize>| {
            if kids.is_empty() {
                1
            } else {
                kids.into_iter().sum()
            }
        });
        assert_eq!(leaf_count, 4);
    }

    #[test]
    fn test_fold_structure_is_bottom_up() {
        let tree = build_test_tree();
        let joined = fold_structure(&tree, String::new(), |mut acc, n| {
            acc.push_str(label(n));
            acc
        });
        assert_eq!(joined, "745289631");
    }

    #[test]
    fn test_compact_root_nodes() {
        let tree = node("root", vec![node("only", vec![node("a", vec![]), node("b", vec![])])]);
        assert_eq!(label(compact_root_nodes(&tree)), "only");

        let chain = node("x", vec![node("y", vec![node("z", vec![])])]);
        assert_eq!(label(compact_root_nodes(&chain)), "z");
    }

    #[test]
    fn test_filter_nodes() {
        let tree = build_test_tree();
        let even: Vec<&str> = filter_nodes(&tree, |n| {
            label(n).parse::<u32>().map(|v| v % 2 == 0).unwrap_or(false)
        })
        .into_iter()
        .map(label)
        .collect();
        assert_eq!(even, vec!["2", "4", "6", "8"]);
    }
}
