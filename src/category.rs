//! Category tree nodes
//!
//! A category tree is an ontology tree whose payload says what each node is:
//!
//! - [`NodeKind::Category`] - a pure grouping node, identified by its label
//! - [`NodeKind::Individual`] - a node referring to a concrete attribute,
//!   table, or search, carrying a snapshot of that entity ([`WdkReference`])
//!
//! Every node has a derived id ([`CategoryTreeNode::id`]) which keys the
//! selection and expansion sets of checkbox trees.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::tree::{find_ancestors, Ontology, OntologyNode, Properties};

// =============================================================================
// PROPERTY KEYS
// =============================================================================

pub const LABEL: &str = "label";
pub const NAME: &str = "name";
pub const TARGET_TYPE: &str = "targetType";
pub const SCOPE: &str = "scope";
pub const RECORD_CLASS_NAME: &str = "recordClassName";
pub const RECORD_CLASS_URL_SEGMENT: &str = "recordClassUrlSegment";
pub const ALTERNATIVE_TERM: &str = "EuPathDB alternative term";
pub const HAS_DEFINITION: &str = "hasDefinition";
pub const HAS_NARROW_SYNONYM: &str = "hasNarrowSynonym";
pub const HAS_EXACT_SYNONYM: &str = "hasExactSynonym";
pub const DISPLAY_ORDER: &str = "display order";

/// Prefix of every category node id
pub const CATEGORY_ID_PREFIX: &str = "category:";

// =============================================================================
// TARGET TYPES & SCOPES
// =============================================================================

/// Kind of domain entity an individual refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Search,
    Attribute,
    Table,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Search => "search",
            TargetType::Attribute => "attribute",
            TargetType::Table => "table",
        }
    }

    /// Target type declared by a node's properties, if it names one
    pub fn from_properties(properties: &Properties) -> Option<Self> {
        properties.value(TARGET_TYPE)?.parse().ok()
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(TargetType::Search),
            "attribute" => Ok(TargetType::Attribute),
            "table" => Ok(TargetType::Table),
            other => Err(format!("unknown target type '{}'", other)),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context in which a field is offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Record,
    RecordInternal,
    Results,
    ResultsInternal,
    Download,
    DownloadInternal,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Record => "record",
            Scope::RecordInternal => "record-internal",
            Scope::Results => "results",
            Scope::ResultsInternal => "results-internal",
            Scope::Download => "download",
            Scope::DownloadInternal => "download-internal",
        }
    }

    /// Internal scopes hold fields that are searchable but not displayed
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Scope::RecordInternal | Scope::ResultsInternal | Scope::DownloadInternal
        )
    }

    /// Internal counterpart of this scope
    pub fn internal(&self) -> Scope {
        match self {
            Scope::Record | Scope::RecordInternal => Scope::RecordInternal,
            Scope::Results | Scope::ResultsInternal => Scope::ResultsInternal,
            Scope::Download | Scope::DownloadInternal => Scope::DownloadInternal,
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(Scope::Record),
            "record-internal" => Ok(Scope::RecordInternal),
            "results" => Ok(Scope::Results),
            "results-internal" => Ok(Scope::ResultsInternal),
            "download" => Ok(Scope::Download),
            "download-internal" => Ok(Scope::DownloadInternal),
            other => Err(format!("unknown scope '{}'", other)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// NODE KINDS
// =============================================================================

/// Snapshot of the domain entity an individual refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WdkReference {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What a category tree node is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    /// Grouping node
    #[default]
    Category,
    /// Node referring to an attribute, table, or search
    Individual(WdkReference),
}

pub type CategoryTreeNode = OntologyNode<NodeKind>;
pub type CategoryOntology = Ontology<NodeKind>;

impl OntologyNode<NodeKind> {
    /// Create a grouping node
    pub fn category(properties: Properties) -> Self {
        OntologyNode::new(properties, NodeKind::Category)
    }

    /// Create an individual node
    pub fn individual(properties: Properties, reference: WdkReference) -> Self {
        OntologyNode::new(properties, NodeKind::Individual(reference))
    }

    pub fn reference(&self) -> Option<&WdkReference> {
        match &self.payload {
            NodeKind::Individual(reference) => Some(reference),
            NodeKind::Category => None,
        }
    }

    pub fn is_individual(&self) -> bool {
        matches!(self.payload, NodeKind::Individual(_))
    }

    /// Selection/expansion key: the entity name for individuals,
    /// `category:<kebab-label>` for categories
    pub fn id(&self) -> String {
        match &self.payload {
            NodeKind::Individual(reference) => reference.name.clone(),
            NodeKind::Category => format!(
                "{}{}",
                CATEGORY_ID_PREFIX,
                kebab_case(self.label().unwrap_or(""))
            ),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.property(LABEL)
    }

    pub fn target_type(&self) -> Option<TargetType> {
        TargetType::from_properties(&self.properties)
    }

    /// Parsed scopes; unrecognized values are skipped
    pub fn scopes(&self) -> Vec<Scope> {
        self.property_values(SCOPE)
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    pub fn ref_name(&self) -> Option<&str> {
        self.property(NAME)
    }

    pub fn record_class_name(&self) -> Option<&str> {
        self.property(RECORD_CLASS_NAME)
    }

    pub fn record_class_url_segment(&self) -> Option<&str> {
        self.property(RECORD_CLASS_URL_SEGMENT)
    }

    pub fn display_name(&self) -> Option<&str> {
        match &self.payload {
            NodeKind::Individual(reference) => Some(reference.display_name.as_str()),
            NodeKind::Category => self.property(ALTERNATIVE_TERM),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match &self.payload {
            NodeKind::Individual(reference) => reference.help.as_deref(),
            NodeKind::Category => self.property(HAS_DEFINITION),
        }
    }

    /// Tooltip text: a search's summary, a table's description, otherwise
    /// the node description
    pub fn tooltip(&self) -> Option<&str> {
        match (&self.payload, self.target_type()) {
            (NodeKind::Individual(reference), Some(TargetType::Search)) => {
                reference.summary.as_deref()
            }
            (NodeKind::Individual(reference), Some(TargetType::Table)) => {
                reference.description.as_deref()
            }
            _ => self.description(),
        }
    }

    pub fn synonyms(&self) -> Vec<&str> {
        self.property_values(HAS_NARROW_SYNONYM)
            .iter()
            .chain(self.property_values(HAS_EXACT_SYNONYM))
            .map(String::as_str)
            .collect()
    }
}

/// Create a simplified node.
///
/// With children this is a category labelled `id`; without children it is an
/// attribute individual named `id`.
pub fn create_node(
    id: &str,
    display_name: &str,
    description: Option<&str>,
    children: Vec<CategoryTreeNode>,
) -> CategoryTreeNode {
    if children.is_empty() {
        let properties = Properties::new()
            .with(TARGET_TYPE, TargetType::Attribute.as_str())
            .with(NAME, id);
        CategoryTreeNode::individual(
            properties,
            WdkReference {
                name: id.to_string(),
                display_name: display_name.to_string(),
                help: description.map(str::to_string),
                summary: None,
                description: None,
            },
        )
    } else {
        let mut properties = Properties::new()
            .with(LABEL, id)
            .with(ALTERNATIVE_TERM, display_name);
        properties.insert(
            HAS_DEFINITION,
            description.map(|d| vec![d.to_string()]).unwrap_or_default(),
        );
        CategoryTreeNode::category(properties).with_children(children)
    }
}

// =============================================================================
// QUALIFYING PREDICATES
// =============================================================================

/// Required property values a node must carry to qualify, e.g.
/// "attributes of record class X usable in download context"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingSpec(BTreeMap<String, String>);

impl QualifyingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(property.into(), value.into());
        self
    }

    pub fn target_type(self, target_type: TargetType) -> Self {
        self.with(TARGET_TYPE, target_type.as_str())
    }

    pub fn scope(self, scope: Scope) -> Self {
        self.with(SCOPE, scope.as_str())
    }

    pub fn record_class_name(self, name: impl Into<String>) -> Self {
        self.with(RECORD_CLASS_NAME, name)
    }

    /// Does the node carry every required property value?
    pub fn matches<T>(&self, node: &OntologyNode<T>) -> bool {
        self.0
            .iter()
            .all(|(property, value)| node.has_property(property, value))
    }
}

/// Predicate over nodes built from a qualifying spec
pub fn is_qualifying<T>(spec: QualifyingSpec) -> impl Fn(&OntologyNode<T>) -> bool {
    move |node: &OntologyNode<T>| spec.matches(node)
}

// =============================================================================
// ID HELPERS
// =============================================================================

/// Is `id` the id of a category node?
pub fn is_category_id(id: &str) -> bool {
    id.starts_with(CATEGORY_ID_PREFIX)
}

/// Find a node by id
pub fn find_node<'a>(root: &'a CategoryTreeNode, id: &str) -> Option<&'a CategoryTreeNode> {
    root.preorder().find(|n| n.id() == id)
}

/// Path of nodes from `root` to the node with `id` (inclusive); empty if absent
pub fn find_path<'a>(root: &'a CategoryTreeNode, id: &str) -> Vec<&'a CategoryTreeNode> {
    find_ancestors(root, |n| n.id() == id)
}

/// Id of the left-most leaf
pub fn find_first_leaf_id(root: &CategoryTreeNode) -> String {
    let mut current = root;
    while let Some(first) = current.children.first() {
        current = first;
    }
    current.id()
}

/// Ids of all leaves. A root without children is treated as an empty tree.
pub fn get_all_leaf_ids(root: &CategoryTreeNode) -> Vec<String> {
    if root.is_leaf() {
        return Vec::new();
    }
    root.preorder()
        .filter(|n| n.is_leaf())
        .map(CategoryTreeNode::id)
        .collect()
}

/// Ids of all branches, root included
pub fn get_all_branch_ids(root: &CategoryTreeNode) -> Vec<String> {
    root.preorder()
        .filter(|n| n.is_branch())
        .map(CategoryTreeNode::id)
        .collect()
}

// =============================================================================
// KEBAB CASE
// =============================================================================

/// Slug a label into lowercase words joined by `-`.
///
/// Diacritics and apostrophes are dropped, words split on any non-alphanumeric
/// character, on lower-to-upper case changes, at the end of an acronym
/// (`HTMLParser` -> `html-parser`), and between letters and digits.
pub fn kebab_case(input: &str) -> String {
    let chars: Vec<char> = input
        .nfkd()
        .filter(|c| !is_combining_mark(*c) && *c != '\'' && *c != '\u{2019}')
        .collect();

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }

        if let Some(p) = prev {
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (p.is_lowercase() && c.is_uppercase())
                || (p.is_uppercase() && c.is_uppercase() && next_is_lower)
                || (p.is_alphabetic() && c.is_numeric())
                || (p.is_numeric() && c.is_alphabetic());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}
