//! Sibling ordering
//!
//! Every sibling list is ordered by three comparators, first non-equal wins:
//!
//! 1. branches before leaves (sections precede loose fields)
//! 2. numeric `display order`, where a node carrying one outranks a node
//!    that doesn't
//! 3. case-insensitive display name
//!
//! Ties keep their original relative order. Record page section numbering
//! depends on this order being stable across reloads.

use std::cmp::Ordering;

use crate::category::{CategoryOntology, CategoryTreeNode, DISPLAY_ORDER};
use crate::tree::OntologyNode;

/// Comparator over sibling nodes
pub type NodeComparator = fn(&CategoryTreeNode, &CategoryTreeNode) -> Ordering;

/// Comparators applied by [`sort_ontology`], in precedence order
pub const DEFAULT_COMPARATORS: [NodeComparator; 3] =
    [compare_by_children, compare_by_sort_number, compare_by_sort_name];

/// Nodes with children sort before leaves
pub fn compare_by_children<T>(a: &OntologyNode<T>, b: &OntologyNode<T>) -> Ordering {
    b.is_branch().cmp(&a.is_branch())
}

/// Numeric `display order`; present sorts before absent.
/// A value that does not parse as a finite number counts as absent.
pub fn compare_by_sort_number<T>(a: &OntologyNode<T>, b: &OntologyNode<T>) -> Ordering {
    match (sort_number(a), sort_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_number<T>(node: &OntologyNode<T>) -> Option<f64> {
    node.property(DISPLAY_ORDER)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Case-insensitive display name, falling back to the label
pub fn compare_by_sort_name(a: &CategoryTreeNode, b: &CategoryTreeNode) -> Ordering {
    sort_name(a).cmp(&sort_name(b))
}

fn sort_name(node: &CategoryTreeNode) -> String {
    node.display_name()
        .or_else(|| node.label())
        .unwrap_or_default()
        .to_lowercase()
}

/// Chain comparators: the first non-equal result wins
pub fn compose_comparators(
    comparators: &[NodeComparator],
) -> impl Fn(&CategoryTreeNode, &CategoryTreeNode) -> Ordering + '_ {
    move |a: &CategoryTreeNode, b: &CategoryTreeNode| {
        comparators
            .iter()
            .map(|compare| compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Order every sibling list in the tree
pub fn sort_ontology(ontology: CategoryOntology) -> CategoryOntology {
    let comparators = DEFAULT_COMPARATORS;
    let compare = compose_comparators(&comparators);
    let mut ontology = ontology;
    sort_children(&mut ontology.tree, &compare);
    ontology
}

fn sort_children<F>(node: &mut CategoryTreeNode, compare: &F)
where
    F: Fn(&CategoryTreeNode, &CategoryTreeNode) -> Ordering,
{
    node.children.sort_by(|a, b| compare(a, b));
    for child in &mut node.children {
        sort_children(child, compare);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::create_node;
    use crate::tree::Ontology;
    use proptest::prelude::*;

    fn leaf(name: &str, display: &str) -> CategoryTreeNode {
        create_node(name, display, None, vec![])
    }

    fn ordered(mut node: CategoryTreeNode, order: &str) -> CategoryTreeNode {
        node.properties.push(DISPLAY_ORDER, order);
        node
    }

    fn sorted_ids(children: Vec<CategoryTreeNode>) -> Vec<String> {
        let ontology = Ontology::new("Categories", create_node("root", "Root", None, children));
        sort_ontology(ontology)
            .tree
            .children
            .iter()
            .map(|n| n.id())
            .collect()
    }

    #[test]
    fn test_branches_before_leaves() {
        let ids = sorted_ids(vec![
            leaf("alpha", "Alpha"),
            create_node("Zeta", "Zeta", None, vec![leaf("z1", "Z1")]),
        ]);
        assert_eq!(ids, vec!["category:zeta", "alpha"]);
    }

    #[test]
    fn test_display_order_outranks_name() {
        let ids = sorted_ids(vec![
            leaf("apple", "Apple"),
            ordered(leaf("zebra", "Zebra"), "2"),
            ordered(leaf("mango", "Mango"), "10"),
            ordered(leaf("kiwi", "Kiwi"), "not a number"),
        ]);
        // numeric, not lexical: 2 before 10
        assert_eq!(ids, vec!["zebra", "mango", "apple", "kiwi"]);
    }

    #[test]
    fn test_name_is_case_insensitive_and_stable() {
        let ids = sorted_ids(vec![
            leaf("b", "beta"),
            leaf("a2", "Alpha"),
            leaf("a1", "alpha"),
        ]);
        assert_eq!(ids, vec!["a2", "a1", "b"]);
    }

    #[test]
    fn test_sorts_nested_levels() {
        let ontology = Ontology::new(
            "Categories",
            create_node(
                "root",
                "Root",
                None,
                vec![create_node(
                    "Inner",
                    "Inner",
                    None,
                    vec![leaf("y", "Y"), leaf("x", "X")],
                )],
            ),
        );
        let sorted = sort_ontology(ontology);
        let inner: Vec<String> = sorted.tree.children[0].children.iter().map(|n| n.id()).collect();
        assert_eq!(inner, vec!["x", "y"]);
    }

    #[test]
    fn test_compose_comparators() {
        let name_only: [NodeComparator; 1] = [compare_by_sort_name];
        let by_name_only = compose_comparators(&name_only);
        assert_eq!(by_name_only(&leaf("a", "A"), &leaf("b", "b")), Ordering::Less);
        assert_eq!(by_name_only(&leaf("a", "Same"), &leaf("b", "same")), Ordering::Equal);

        let empty: [NodeComparator; 0] = [];
        let none = compose_comparators(&empty);
        assert_eq!(none(&leaf("a", "A"), &leaf("b", "B")), Ordering::Equal);
    }

    fn arb_tree() -> impl Strategy<Value = CategoryTreeNode> {
        let leaf = ("[a-d]{1,2}", prop::option::of(0u8..4)).prop_map(|(name, order)| {
            let node = create_node(&name, &name, None, vec![]);
            match order {
                Some(o) => ordered(node, &o.to_string()),
                None => node,
            }
        });
        leaf.prop_recursive(3, 32, 4, |inner| {
            ("[A-D]{1,2}", prop::option::of(0u8..4), prop::collection::vec(inner, 1..4)).prop_map(
                |(label, order, children)| {
                    let node = create_node(&label, &label, None, children);
                    match order {
                        Some(o) => ordered(node, &o.to_string()),
                        None => node,
                    }
                },
            )
        })
    }

    proptest! {
        #[test]
        fn test_sort_is_deterministic_and_idempotent(tree in arb_tree()) {
            let once = sort_ontology(Ontology::new("Categories", tree.clone()));
            let again = sort_ontology(Ontology::new("Categories", tree));
            prop_assert_eq!(&once, &again);

            let twice = sort_ontology(once.clone());
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn test_no_branch_after_leaf(tree in arb_tree()) {
            let sorted = sort_ontology(Ontology::new("Categories", tree));
            for node in sorted.tree.preorder() {
                let first_leaf = node.children.iter().position(|c| c.is_leaf());
                let last_branch = node.children.iter().rposition(|c| c.is_branch());
                if let (Some(leaf), Some(branch)) = (first_leaf, last_branch) {
                    prop_assert!(branch < leaf);
                }
            }
        }
    }
}
