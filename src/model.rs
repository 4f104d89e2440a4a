//! Domain entity dictionaries
//!
//! Record classes and searches (questions) are consumed purely as lookup
//! tables keyed by name. An ontology individual refers to one of them through
//! its `recordClassName`, `targetType` and `name` properties.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::category::{TargetType, WdkReference};
use crate::error::Result;
use crate::tree::Properties;

fn default_true() -> bool {
    true
}

/// A displayable column of a record class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeField {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default = "default_true")]
    pub is_displayable: bool,
}

/// A nested table of a record class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableField {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A record class with its attributes and tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordClass {
    pub full_name: String,
    pub url_segment: String,
    pub display_name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeField>,
    #[serde(default)]
    pub tables: Vec<TableField>,
}

/// A search definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub full_name: String,
    pub url_segment: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default)]
    pub dynamic_attributes: Vec<AttributeField>,
}

/// Model document as loaded from disk or the service layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDocument {
    #[serde(default)]
    pub record_classes: Vec<RecordClass>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

// =============================================================================
// ENTITY LOOKUP
// =============================================================================

/// A domain entity an individual node refers to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelEntity<'a> {
    Attribute(&'a AttributeField),
    Table(&'a TableField),
    Search(&'a Question),
}

impl<'a> ModelEntity<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            ModelEntity::Attribute(a) => &a.name,
            ModelEntity::Table(t) => &t.name,
            ModelEntity::Search(q) => &q.full_name,
        }
    }

    pub fn display_name(&self) -> &'a str {
        match self {
            ModelEntity::Attribute(a) => &a.display_name,
            ModelEntity::Table(t) => &t.display_name,
            ModelEntity::Search(q) => &q.display_name,
        }
    }

    /// Snapshot of the entity fields a tree node carries after resolution
    pub fn to_reference(&self) -> WdkReference {
        match self {
            ModelEntity::Attribute(a) => WdkReference {
                name: a.name.clone(),
                display_name: a.display_name.clone(),
                help: a.help.clone(),
                summary: None,
                description: None,
            },
            ModelEntity::Table(t) => WdkReference {
                name: t.name.clone(),
                display_name: t.display_name.clone(),
                help: t.help.clone(),
                summary: None,
                description: t.description.clone(),
            },
            ModelEntity::Search(q) => WdkReference {
                name: q.full_name.clone(),
                display_name: q.display_name.clone(),
                help: q.help.clone(),
                summary: q.summary.clone(),
                description: q.description.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct RecordClassEntry {
    record_class: RecordClass,
    attributes: HashMap<String, usize>,
    tables: HashMap<String, usize>,
}

impl RecordClassEntry {
    fn new(record_class: RecordClass) -> Self {
        let attributes = record_class
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        let tables = record_class
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Self {
            record_class,
            attributes,
            tables,
        }
    }
}

/// Name-keyed lookup over record classes and questions
#[derive(Debug, Clone, Default)]
pub struct ModelIndex {
    record_classes: HashMap<String, RecordClassEntry>,
    questions: HashMap<String, Question>,
}

impl ModelIndex {
    pub fn new(record_classes: Vec<RecordClass>, questions: Vec<Question>) -> Self {
        Self {
            record_classes: record_classes
                .into_iter()
                .map(|rc| (rc.full_name.clone(), RecordClassEntry::new(rc)))
                .collect(),
            questions: questions
                .into_iter()
                .map(|q| (q.full_name.clone(), q))
                .collect(),
        }
    }

    /// Parse a model document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: ModelDocument = serde_json::from_str(json)?;
        Ok(doc.into())
    }

    /// Read a model document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn record_class(&self, name: &str) -> Option<&RecordClass> {
        self.record_classes.get(name).map(|e| &e.record_class)
    }

    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.get(name)
    }

    /// Resolve the entity referenced by a node's properties.
    ///
    /// The node's record class must exist, even for searches. Anything
    /// missing resolves to `None`.
    pub fn entity_for(&self, properties: &Properties) -> Option<ModelEntity<'_>> {
        let entry = self.record_classes.get(properties.value("recordClassName")?)?;
        let name = properties.value("name")?;
        match TargetType::from_properties(properties)? {
            TargetType::Attribute => entry
                .attributes
                .get(name)
                .map(|&i| ModelEntity::Attribute(&entry.record_class.attributes[i])),
            TargetType::Table => entry
                .tables
                .get(name)
                .map(|&i| ModelEntity::Table(&entry.record_class.tables[i])),
            TargetType::Search => self.questions.get(name).map(ModelEntity::Search),
        }
    }

    /// URL segment of the node's record class
    pub fn record_class_url_segment(&self, properties: &Properties) -> Option<&str> {
        self.record_class(properties.value("recordClassName")?)
            .map(|rc| rc.url_segment.as_str())
    }
}

impl From<ModelDocument> for ModelIndex {
    fn from(doc: ModelDocument) -> Self {
        ModelIndex::new(doc.record_classes, doc.questions)
    }
}
