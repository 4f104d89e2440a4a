//! Generic ontology tree model
//!
//! An ontology is a named root wrapping a single tree of [`OntologyNode`]s.
//! Every node carries ordered children, a schemaless multi-valued property
//! bag, and an opaque payload `T`. The raw tree from the service layer uses
//! `T = ()`; the resolved category tree uses [`crate::category::NodeKind`].
//!
//! Nodes own their children, so a tree can never contain itself. Grafted
//! subtrees are copies, and every traversal in [`traversal`] terminates.

pub mod traversal;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use traversal::{
    branches, compact_root_nodes, filter_nodes, find_ancestors, fold_structure, leaves,
    map_structure, postorder_by, preorder_by, NodePostorder, NodePreorder, Postorder, Preorder,
};

// =============================================================================
// PROPERTIES - Multi-valued property bag
// =============================================================================

/// Multi-valued named properties of a node.
///
/// Absence of a key is equivalent to an empty list. Call sites read through
/// the accessors below rather than the underlying map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Vec<String>>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of a property, if any
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    /// All values of a property (empty when absent)
    pub fn values(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Does the property carry at least one value?
    pub fn has(&self, key: &str) -> bool {
        !self.values(key).is_empty()
    }

    /// Does the property carry exactly this value among its values?
    pub fn has_value(&self, key: &str, value: &str) -> bool {
        self.values(key).iter().any(|v| v == value)
    }

    /// Replace all values of a property
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.insert(key.into(), values);
    }

    /// Append a value to a property
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Builder-style append
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Properties(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Vec<String>>> for Properties {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Properties(map)
    }
}

// =============================================================================
// NODES
// =============================================================================

/// A node of an ontology tree
#[derive(Debug, Clone, PartialEq)]
pub struct OntologyNode<T> {
    /// Named multi-valued properties from the upstream ontology
    pub properties: Properties,

    /// Ordered child nodes
    pub children: Vec<OntologyNode<T>>,

    /// Payload attached after resolution
    pub payload: T,
}

impl<T> OntologyNode<T> {
    /// Create a childless node
    pub fn new(properties: Properties, payload: T) -> Self {
        Self {
            properties,
            children: Vec::new(),
            payload,
        }
    }

    /// Builder-style children replacement
    pub fn with_children(mut self, children: Vec<OntologyNode<T>>) -> Self {
        self.children = children;
        self
    }

    /// Add a child node
    pub fn add_child(&mut self, child: OntologyNode<T>) {
        self.children.push(child);
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.value(key)
    }

    pub fn property_values(&self, key: &str) -> &[String] {
        self.properties.values(key)
    }

    pub fn has_property(&self, key: &str, value: &str) -> bool {
        self.properties.has_value(key, value)
    }

    /// Is this a leaf node?
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Is this a branch node?
    pub fn is_branch(&self) -> bool {
        !self.children.is_empty()
    }

    /// Lazily walk the subtree parent-first, left to right
    pub fn preorder<'a>(&'a self) -> NodePreorder<'a, T> {
        preorder_by(
            self,
            traversal::child_iter::<T> as fn(&'a OntologyNode<T>) -> traversal::ChildIter<'a, T>,
        )
    }

    /// Lazily walk the subtree children-first, left to right
    pub fn postorder<'a>(&'a self) -> NodePostorder<'a, T> {
        postorder_by(
            self,
            traversal::child_iter::<T> as fn(&'a OntologyNode<T>) -> traversal::ChildIter<'a, T>,
        )
    }

    /// Total number of nodes in the subtree (including self)
    pub fn node_count(&self) -> usize {
        self.preorder().count()
    }

    /// Rebuild the tree with a new payload type, keeping shape and properties
    pub fn map_payload<U, F>(self, f: &mut F) -> OntologyNode<U>
    where
        F: FnMut(&Properties, T) -> U,
    {
        let payload = f(&self.properties, self.payload);
        OntologyNode {
            children: self
                .children
                .into_iter()
                .map(|child| child.map_payload(f))
                .collect(),
            properties: self.properties,
            payload,
        }
    }
}

/// A named ontology root
#[derive(Debug, Clone, PartialEq)]
pub struct Ontology<T> {
    pub name: String,
    pub tree: OntologyNode<T>,
}

impl<T> Ontology<T> {
    pub fn new(name: impl Into<String>, tree: OntologyNode<T>) -> Self {
        Self {
            name: name.into(),
            tree,
        }
    }

    /// Replace the tree, keeping the name
    pub fn with_tree<U>(self, tree: OntologyNode<U>) -> Ontology<U> {
        Ontology {
            name: self.name,
            tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(label: &str, children: Vec<OntologyNode<()>>) -> OntologyNode<()> {
        OntologyNode::new(Properties::new().with("label", label), ()).with_children(children)
    }

    #[test]
    fn test_properties_absent_is_empty() {
        let props = Properties::new().with("scope", "record").with("scope", "download");

        assert_eq!(props.value("scope"), Some("record"));
        assert_eq!(props.values("scope").len(), 2);
        assert!(props.has_value("scope", "download"));
        assert!(!props.has_value("scope", "results"));
        assert!(props.values("missing").is_empty());
        assert_eq!(props.value("missing"), None);
        assert!(!props.has("missing"));
    }

    #[test]
    fn test_properties_serde_transparent() {
        let props: Properties =
            serde_json::from_str(r#"{"label":["Gene"],"scope":["record","download"]}"#).unwrap();
        assert_eq!(props.value("label"), Some("Gene"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_leaf_and_branch() {
        let tree = node("root", vec![node("a", vec![])]);
        assert!(tree.is_branch());
        assert!(tree.children[0].is_leaf());
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_map_payload_keeps_shape() {
        let tree = node("root", vec![node("a", vec![node("b", vec![])]), node("c", vec![])]);
        let mapped = tree.map_payload(&mut |props: &Properties, _| {
            props.value("label").unwrap_or_default().len()
        });

        assert_eq!(mapped.payload, 4);
        assert_eq!(mapped.children[0].children[0].payload, 1);
        assert_eq!(mapped.node_count(), 4);
    }
}
