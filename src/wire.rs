//! Wire format of the raw ontology
//!
//! The service layer delivers the ontology as JSON where every node is just a
//! property bag plus children:
//!
//! ```json
//! {
//!   "name": "Categories",
//!   "tree": {
//!     "properties": { "label": ["TranscriptRecordClasses"] },
//!     "children": [
//!       { "properties": { "targetType": ["attribute"], "name": ["gene_name"] }, "children": [] }
//!     ]
//!   }
//! }
//! ```
//!
//! Nothing beyond `properties` and `children` is required of a node.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::tree::{Ontology, OntologyNode, Properties};

/// Raw ontology root as delivered by the service layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOntology {
    pub name: String,
    pub tree: RawNode,
}

/// Raw ontology node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

impl From<RawNode> for OntologyNode<()> {
    fn from(raw: RawNode) -> Self {
        OntologyNode {
            properties: raw.properties,
            children: raw.children.into_iter().map(OntologyNode::from).collect(),
            payload: (),
        }
    }
}

impl From<OntologyNode<()>> for RawNode {
    fn from(node: OntologyNode<()>) -> Self {
        RawNode {
            properties: node.properties,
            children: node.children.into_iter().map(RawNode::from).collect(),
        }
    }
}

impl From<RawOntology> for Ontology<()> {
    fn from(raw: RawOntology) -> Self {
        Ontology::new(raw.name, raw.tree.into())
    }
}

/// Parse a raw ontology from a JSON string
pub fn parse_ontology_json(json: &str) -> Result<Ontology<()>> {
    let raw: RawOntology = serde_json::from_str(json)?;
    Ok(raw.into())
}

/// Read and parse a raw ontology from a JSON file
pub fn read_ontology_file<P: AsRef<Path>>(path: P) -> Result<Ontology<()>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_ontology_json(&content)
}
