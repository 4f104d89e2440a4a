//! Reference resolution and ontology preparation
//!
//! A freshly fetched raw ontology goes through one pure pipeline before it is
//! cached:
//!
//! ```text
//!   Ontology<()> -> prune_unknown_paths -> resolve_references -> sort_ontology
//!                                                                   |
//!                                                         CategoryOntology
//! ```
//!
//! Each step takes its input and returns a new tree; nothing is mutated after
//! the result is cached.

use crate::category::{
    create_node, CategoryOntology, CategoryTreeNode, NodeKind, TargetType, LABEL, NAME,
    RECORD_CLASS_URL_SEGMENT,
};
use crate::model::{ModelIndex, Question};
use crate::prune::get_tree;
use crate::sort::sort_ontology;
use crate::tree::{Ontology, OntologyNode};

pub const SEARCH_SPECIFIC_SUBTREE: &str = "search_specific_subtree";
const SEARCH_SPECIFIC_DISPLAY_NAME: &str = "Search Specific";
const SEARCH_SPECIFIC_DESCRIPTION: &str = "Information about the records returned that is specific to the search you ran, and the parameters you specified";

/// Predicate: does the node refer to an entity the model knows?
pub fn is_individual_known(model: &ModelIndex) -> impl Fn(&OntologyNode<()>) -> bool + '_ {
    move |node: &OntologyNode<()>| model.entity_for(&node.properties).is_some()
}

/// Drop every path that does not end in a known entity
pub fn prune_unknown_paths(model: &ModelIndex, ontology: &Ontology<()>) -> Ontology<()> {
    Ontology::new(ontology.name.clone(), get_tree(ontology, is_individual_known(model)))
}

/// Attach the referenced entity to every individual node.
///
/// Individuals also receive a `recordClassUrlSegment` property. A node that
/// declares a target type but cannot be resolved degrades to a category node.
pub fn resolve_references(model: &ModelIndex, ontology: Ontology<()>) -> CategoryOntology {
    let tree = resolve_node(model, ontology.tree);
    Ontology::new(ontology.name, tree)
}

fn resolve_node(model: &ModelIndex, node: OntologyNode<()>) -> CategoryTreeNode {
    let OntologyNode {
        mut properties,
        children,
        ..
    } = node;

    let payload = match TargetType::from_properties(&properties) {
        Some(target_type) => match model.entity_for(&properties) {
            Some(entity) => {
                if let Some(segment) = model.record_class_url_segment(&properties) {
                    properties.insert(RECORD_CLASS_URL_SEGMENT, vec![segment.to_string()]);
                }
                NodeKind::Individual(entity.to_reference())
            }
            None => {
                tracing::warn!(
                    "Unresolved {} individual '{}'; treating as category",
                    target_type,
                    properties.value(NAME).unwrap_or_default()
                );
                NodeKind::Category
            }
        },
        None => NodeKind::Category,
    };

    OntologyNode {
        properties,
        children: children
            .into_iter()
            .map(|child| resolve_node(model, child))
            .collect(),
        payload,
    }
}

/// Prune unknown paths, resolve references, and sort: the form an ontology
/// takes in the cache
pub fn prepare_ontology(model: &ModelIndex, raw: &Ontology<()>) -> CategoryOntology {
    let known = prune_unknown_paths(model, raw);
    sort_ontology(resolve_references(model, known))
}

/// Prepend a "Search Specific" category holding the question's displayable
/// dynamic attributes.
///
/// Returns the tree unchanged when the question has no displayable dynamic
/// attributes, or when the tree already starts with such a subtree.
pub fn add_search_specific_subtree(
    question: &Question,
    category_tree: CategoryTreeNode,
) -> CategoryTreeNode {
    if has_search_specific_subtree(&category_tree) {
        tracing::debug!(
            "Search specific subtree already present for '{}'",
            question.full_name
        );
        return category_tree;
    }

    let question_nodes: Vec<CategoryTreeNode> = question
        .dynamic_attributes
        .iter()
        .filter(|attribute| attribute.is_displayable)
        .map(|attribute| {
            create_node(
                &attribute.name,
                &attribute.display_name,
                attribute.help.as_deref(),
                vec![],
            )
        })
        .collect();
    if question_nodes.is_empty() {
        return category_tree;
    }

    let subtree = create_node(
        SEARCH_SPECIFIC_SUBTREE,
        SEARCH_SPECIFIC_DISPLAY_NAME,
        Some(SEARCH_SPECIFIC_DESCRIPTION),
        question_nodes,
    );
    let mut category_tree = category_tree;
    category_tree.children.insert(0, subtree);
    category_tree
}

fn has_search_specific_subtree(tree: &CategoryTreeNode) -> bool {
    tree.children
        .first()
        .is_some_and(|first| first.property(LABEL) == Some(SEARCH_SPECIFIC_SUBTREE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::get_all_leaf_ids;
    use crate::model::AttributeField;
    use crate::tree::Properties;
    use crate::wire::parse_ontology_json;
    use pretty_assertions::assert_eq;

    const GENE: &str = "GeneRecordClasses.GeneRecordClass";

    fn model() -> ModelIndex {
        ModelIndex::from_json(
            r#"{
                "recordClasses": [{
                    "fullName": "GeneRecordClasses.GeneRecordClass",
                    "urlSegment": "gene",
                    "displayName": "Gene",
                    "attributes": [
                        { "name": "gene_name", "displayName": "Gene Name" },
                        { "name": "exon_count", "displayName": "Exon Count" }
                    ],
                    "tables": [{ "name": "GoTerms", "displayName": "GO Terms" }]
                }]
            }"#,
        )
        .unwrap()
    }

    fn individual(target: &str, name: &str) -> OntologyNode<()> {
        OntologyNode::new(
            Properties::new()
                .with("recordClassName", GENE)
                .with("targetType", target)
                .with("name", name),
            (),
        )
    }

    fn category(label: &str, children: Vec<OntologyNode<()>>) -> OntologyNode<()> {
        OntologyNode::new(Properties::new().with("label", label), ()).with_children(children)
    }

    fn raw_ontology() -> Ontology<()> {
        Ontology::new(
            "Categories",
            category(
                "root",
                vec![
                    category(
                        "Gene models",
                        vec![individual("attribute", "exon_count"), individual("attribute", "gone")],
                    ),
                    category("Stale", vec![individual("table", "RemovedTable")]),
                    individual("attribute", "gene_name"),
                    individual("table", "GoTerms"),
                ],
            ),
        )
    }

    #[test]
    fn test_prune_unknown_paths() {
        let pruned = prune_unknown_paths(&model(), &raw_ontology());
        let names: Vec<&str> = pruned
            .tree
            .preorder()
            .filter_map(|n| n.property("name").or(n.property("label")))
            .collect();
        assert_eq!(names, vec!["root", "Gene models", "exon_count", "gene_name", "GoTerms"]);
    }

    #[test]
    fn test_resolve_references() {
        let model = model();
        let resolved = resolve_references(&model, prune_unknown_paths(&model, &raw_ontology()));

        let gene_name = resolved
            .tree
            .preorder()
            .find(|n| n.ref_name() == Some("gene_name"))
            .unwrap();
        assert!(gene_name.is_individual());
        assert_eq!(gene_name.display_name(), Some("Gene Name"));
        assert_eq!(gene_name.record_class_url_segment(), Some("gene"));
        assert!(!resolved.tree.is_individual());
    }

    #[test]
    fn test_unresolved_individual_degrades_to_category() {
        let resolved = resolve_references(
            &model(),
            Ontology::new("Categories", category("root", vec![individual("attribute", "gone")])),
        );
        let gone = &resolved.tree.children[0];
        assert!(!gone.is_individual());
        assert!(gone.record_class_url_segment().is_none());
    }

    #[test]
    fn test_prepare_ontology_from_wire() {
        let raw = parse_ontology_json(
            r#"{
                "name": "Categories",
                "tree": {
                    "properties": { "label": ["root"] },
                    "children": [
                        { "properties": {
                            "recordClassName": ["GeneRecordClasses.GeneRecordClass"],
                            "targetType": ["attribute"], "name": ["gene_name"] } },
                        { "properties": { "label": ["Gene models"], "EuPathDB alternative term": ["Gene models"] },
                          "children": [
                            { "properties": {
                                "recordClassName": ["GeneRecordClasses.GeneRecordClass"],
                                "targetType": ["attribute"], "name": ["exon_count"] } }
                          ] }
                    ]
                }
            }"#,
        )
        .unwrap();

        let prepared = prepare_ontology(&model(), &raw);
        assert_eq!(prepared.name, "Categories");
        // branches sort before leaves
        assert_eq!(get_all_leaf_ids(&prepared.tree), vec!["exon_count", "gene_name"]);
    }

    fn question(attributes: Vec<AttributeField>) -> Question {
        Question {
            full_name: "GeneQuestions.GenesByTaxon".to_string(),
            url_segment: "GenesByTaxon".to_string(),
            display_name: "Organism".to_string(),
            summary: None,
            description: None,
            help: None,
            dynamic_attributes: attributes,
        }
    }

    fn dynamic(name: &str, displayable: bool) -> AttributeField {
        AttributeField {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            help: Some(format!("{} help", name)),
            is_displayable: displayable,
        }
    }

    #[test]
    fn test_add_search_specific_subtree() {
        let tree = create_node("root", "Root", None, vec![create_node("age", "Age", None, vec![])]);
        let question = question(vec![dynamic("score", true), dynamic("internal", false)]);

        let grafted = add_search_specific_subtree(&question, tree);
        assert_eq!(grafted.children.len(), 2);
        let subtree = &grafted.children[0];
        assert_eq!(subtree.id(), "category:search-specific-subtree");
        assert_eq!(subtree.display_name(), Some("Search Specific"));
        assert_eq!(get_all_leaf_ids(subtree), vec!["score"]);

        let again = add_search_specific_subtree(&question, grafted.clone());
        assert_eq!(again, grafted);
    }

    #[test]
    fn test_add_search_specific_subtree_without_displayable_attributes() {
        let tree = create_node("root", "Root", None, vec![create_node("age", "Age", None, vec![])]);
        let unchanged =
            add_search_specific_subtree(&question(vec![dynamic("internal", false)]), tree.clone());
        assert_eq!(unchanged, tree);
    }
}
