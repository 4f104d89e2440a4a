//! Selection and expansion state of a checkbox tree
//!
//! One [`TreeState`] backs one widget instance. It owns the selected leaf
//! ids, the expanded branch ids, and the search term. Branch check states
//! are never stored: they are derived from the selection and the tree the
//! widget currently shows, so a search that narrows the tree cannot leave a
//! stale "checked" branch behind.
//!
//! Every operation takes the *current* tree (usually pruned and searched)
//! and returns the change it caused, if any:
//!
//! ```text
//!   TreeAction ──apply──> TreeState ──> Option<TreeEvent>
//!                                          │
//!                     SelectionChanged(all selected ids)
//!                     ExpansionChanged(all expanded ids)
//!                     SearchTermChanged(term)
//! ```
//!
//! Events carry complete sets, not deltas. Ids missing from the current tree
//! are ignored, as are operations the selection mode does not support.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::category::{
    find_node, find_path, get_all_branch_ids, get_all_leaf_ids, is_category_id, CategoryTreeNode,
};
use crate::prune::search_tree;
use crate::search::SearchQuery;
use crate::tree::map_structure;

// =============================================================================
// MODES & STATES
// =============================================================================

/// How many leaves may be selected at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Exactly one leaf; branches are expand/collapse targets only
    SinglePick,
    /// Any set of leaves; branches toggle all their leaves
    #[default]
    MultiPick,
}

impl SelectionMode {
    pub fn from_multi_pick(multi_pick: bool) -> Self {
        if multi_pick {
            SelectionMode::MultiPick
        } else {
            SelectionMode::SinglePick
        }
    }

    pub fn is_multi_pick(&self) -> bool {
        matches!(self, SelectionMode::MultiPick)
    }
}

/// Derived checkbox state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Checked,
    Indeterminate,
    Unchecked,
}

impl CheckState {
    fn from_counts(selected: usize, leaves: usize) -> Self {
        if selected == 0 {
            CheckState::Unchecked
        } else if selected == leaves {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }
}

/// Initial selection supplied by the embedding page.
///
/// `current_list` wins whenever it is present, even when empty;
/// `default_list` only applies when it is absent, and again on
/// [`TreeState::reset_to_default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_list: Option<Vec<String>>,
}

impl SelectionSeed {
    pub fn current(ids: Vec<String>) -> Self {
        Self {
            current_list: Some(ids),
            default_list: None,
        }
    }

    pub fn with_default(mut self, ids: Vec<String>) -> Self {
        self.default_list = Some(ids);
        self
    }

    fn initial(&self) -> Vec<String> {
        self.current_list
            .clone()
            .or_else(|| self.default_list.clone())
            .unwrap_or_default()
    }
}

/// State change reported to the embedding page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum TreeEvent {
    SelectionChanged(Vec<String>),
    ExpansionChanged(Vec<String>),
    SearchTermChanged(String),
}

/// User or page intent against a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAction {
    /// Check or uncheck a leaf or branch
    SetChecked { id: String, checked: bool },
    /// Flip a node based on its current check state
    Toggle(String),
    SelectAll,
    ClearAll,
    /// Replace the whole selection (e.g. the page's current list changed)
    SetSelection(Vec<String>),
    /// Replace the whole expansion set
    SetExpanded(Vec<String>),
    ToggleExpansion(String),
    /// Expand every ancestor of a node (deep link)
    ExpandPathTo(String),
    ExpandAll,
    CollapseAll,
    SetSearchTerm(String),
    ResetToDefault,
}

/// Persistable part of a [`TreeState`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStateSnapshot {
    pub mode: SelectionMode,
    pub selected: Vec<String>,
    pub expanded: Vec<String>,
    #[serde(default)]
    pub search_term: String,
}

// =============================================================================
// TREE STATE
// =============================================================================

/// Selection, expansion and search state of one checkbox tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeState {
    mode: SelectionMode,
    seed: SelectionSeed,
    selected: Vec<String>,
    expanded: Vec<String>,
    search_term: String,
}

impl TreeState {
    /// Seed ids are trusted to be leaf ids of the full ontology
    pub fn new(mode: SelectionMode, seed: SelectionSeed) -> Self {
        let selected = Self::fit_to_mode(mode, seed.initial());
        Self {
            mode,
            seed,
            selected,
            expanded: Vec::new(),
            search_term: String::new(),
        }
    }

    pub fn multi_pick() -> Self {
        Self::new(SelectionMode::MultiPick, SelectionSeed::default())
    }

    pub fn single_pick() -> Self {
        Self::new(SelectionMode::SinglePick, SelectionSeed::default())
    }

    /// Builder-style initial expansion
    pub fn with_expanded(mut self, ids: Vec<String>) -> Self {
        self.expanded = dedup(ids);
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn expanded(&self) -> &[String] {
        &self.expanded
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.iter().any(|e| e == id)
    }

    /// Selections hold leaf ids only; category ids are dropped
    fn fit_to_mode(mode: SelectionMode, ids: Vec<String>) -> Vec<String> {
        let ids: Vec<String> = dedup(ids)
            .into_iter()
            .filter(|id| {
                let branch = is_category_id(id);
                if branch {
                    tracing::debug!("Dropping category id '{}' from selection", id);
                }
                !branch
            })
            .collect();
        match mode {
            SelectionMode::MultiPick => ids,
            SelectionMode::SinglePick => ids.into_iter().take(1).collect(),
        }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Check or uncheck a node of the current tree
    pub fn set_checked(
        &mut self,
        tree: &CategoryTreeNode,
        id: &str,
        checked: bool,
    ) -> Option<TreeEvent> {
        let Some(node) = find_selectable(tree, id) else {
            tracing::debug!("Ignoring selection change for unknown node '{}'", id);
            return None;
        };

        if node.is_leaf() {
            self.set_leaf_checked(id, checked)
        } else {
            self.set_branch_checked(node, checked)
        }
    }

    fn set_leaf_checked(&mut self, id: &str, checked: bool) -> Option<TreeEvent> {
        match (self.mode, checked) {
            (SelectionMode::MultiPick, true) => self.add_selected(std::iter::once(id.to_string())),
            (SelectionMode::MultiPick, false) => self.remove_selected(&HashSet::from([id])),
            (SelectionMode::SinglePick, true) => {
                if self.selected.len() == 1 && self.selected[0] == id {
                    return None;
                }
                self.selected = vec![id.to_string()];
                Some(self.selection_event())
            }
            (SelectionMode::SinglePick, false) => None,
        }
    }

    fn set_branch_checked(&mut self, node: &CategoryTreeNode, checked: bool) -> Option<TreeEvent> {
        if !self.mode.is_multi_pick() {
            return None;
        }
        let leaf_ids = get_all_leaf_ids(node);
        if checked {
            self.add_selected(leaf_ids.into_iter())
        } else {
            let leaf_ids: HashSet<&str> = leaf_ids.iter().map(String::as_str).collect();
            self.remove_selected(&leaf_ids)
        }
    }

    /// Check an unchecked or indeterminate node, uncheck a checked one
    pub fn toggle(&mut self, tree: &CategoryTreeNode, id: &str) -> Option<TreeEvent> {
        let Some(node) = find_selectable(tree, id) else {
            tracing::debug!("Ignoring toggle of unknown node '{}'", id);
            return None;
        };
        let checked = self.check_state(node) != CheckState::Checked;
        self.set_checked(tree, id, checked)
    }

    /// Select every leaf of the current tree, keeping selections outside it
    pub fn select_all(&mut self, tree: &CategoryTreeNode) -> Option<TreeEvent> {
        if !self.mode.is_multi_pick() {
            return None;
        }
        self.add_selected(get_all_leaf_ids(tree).into_iter())
    }

    /// Deselect every leaf of the current tree, keeping selections outside it
    pub fn clear_all(&mut self, tree: &CategoryTreeNode) -> Option<TreeEvent> {
        if !self.mode.is_multi_pick() {
            return None;
        }
        let leaf_ids = get_all_leaf_ids(tree);
        let leaf_ids: HashSet<&str> = leaf_ids.iter().map(String::as_str).collect();
        self.remove_selected(&leaf_ids)
    }

    /// Replace the selection wholesale
    pub fn set_selection(&mut self, ids: Vec<String>) -> Option<TreeEvent> {
        let ids = Self::fit_to_mode(self.mode, ids);
        if ids == self.selected {
            return None;
        }
        self.selected = ids;
        Some(self.selection_event())
    }

    /// Reapply the default list (or clear when there is none)
    pub fn reset_to_default(&mut self) -> Option<TreeEvent> {
        let defaults = self.seed.default_list.clone().unwrap_or_default();
        self.set_selection(defaults)
    }

    fn add_selected(&mut self, ids: impl Iterator<Item = String>) -> Option<TreeEvent> {
        let mut present: HashSet<String> = self.selected.iter().cloned().collect();
        let before = self.selected.len();
        for id in ids {
            if present.insert(id.clone()) {
                self.selected.push(id);
            }
        }
        (self.selected.len() != before).then(|| self.selection_event())
    }

    fn remove_selected(&mut self, ids: &HashSet<&str>) -> Option<TreeEvent> {
        let before = self.selected.len();
        self.selected.retain(|s| !ids.contains(s.as_str()));
        (self.selected.len() != before).then(|| self.selection_event())
    }

    fn selection_event(&self) -> TreeEvent {
        TreeEvent::SelectionChanged(self.selected.clone())
    }

    // =========================================================================
    // EXPANSION
    // =========================================================================

    /// Replace the expansion set wholesale
    pub fn set_expanded(&mut self, ids: Vec<String>) -> Option<TreeEvent> {
        let ids = dedup(ids);
        if ids == self.expanded {
            return None;
        }
        self.expanded = ids;
        Some(self.expansion_event())
    }

    /// Expand or collapse one branch of the current tree
    pub fn toggle_expansion(&mut self, tree: &CategoryTreeNode, id: &str) -> Option<TreeEvent> {
        if !find_node(tree, id).is_some_and(|node| node.is_branch()) {
            tracing::debug!("Ignoring expansion toggle of unknown branch '{}'", id);
            return None;
        }
        if self.is_expanded(id) {
            self.expanded.retain(|e| e != id);
        } else {
            self.expanded.push(id.to_string());
        }
        Some(self.expansion_event())
    }

    /// Expand every ancestor of `id` so the node becomes visible
    pub fn expand_path_to(&mut self, tree: &CategoryTreeNode, id: &str) -> Option<TreeEvent> {
        let path = find_path(tree, id);
        let Some((_, ancestors)) = path.split_last() else {
            tracing::debug!("Ignoring deep link to unknown node '{}'", id);
            return None;
        };
        let before = self.expanded.len();
        for ancestor in ancestors {
            let ancestor_id = ancestor.id();
            if !self.is_expanded(&ancestor_id) {
                self.expanded.push(ancestor_id);
            }
        }
        (self.expanded.len() != before).then(|| self.expansion_event())
    }

    pub fn expand_all(&mut self, tree: &CategoryTreeNode) -> Option<TreeEvent> {
        self.set_expanded(get_all_branch_ids(tree))
    }

    pub fn collapse_all(&mut self) -> Option<TreeEvent> {
        self.set_expanded(Vec::new())
    }

    fn expansion_event(&self) -> TreeEvent {
        TreeEvent::ExpansionChanged(self.expanded.clone())
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Change the search term; selection and expansion are left alone
    pub fn set_search_term(&mut self, term: impl Into<String>) -> Option<TreeEvent> {
        let term = term.into();
        if term == self.search_term {
            return None;
        }
        self.search_term = term;
        Some(TreeEvent::SearchTermChanged(self.search_term.clone()))
    }

    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::parse(&self.search_term)
    }

    /// The tree as the widget shows it: visible nodes narrowed by the
    /// current search term
    pub fn visible_tree<V>(&self, tree: &CategoryTreeNode, visibility_filter: &V) -> CategoryTreeNode
    where
        V: Fn(&CategoryTreeNode) -> bool,
    {
        search_tree(tree, &self.search_query(), visibility_filter)
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Apply an action against the current tree
    pub fn apply(&mut self, tree: &CategoryTreeNode, action: TreeAction) -> Option<TreeEvent> {
        match action {
            TreeAction::SetChecked { id, checked } => self.set_checked(tree, &id, checked),
            TreeAction::Toggle(id) => self.toggle(tree, &id),
            TreeAction::SelectAll => self.select_all(tree),
            TreeAction::ClearAll => self.clear_all(tree),
            TreeAction::SetSelection(ids) => self.set_selection(ids),
            TreeAction::SetExpanded(ids) => self.set_expanded(ids),
            TreeAction::ToggleExpansion(id) => self.toggle_expansion(tree, &id),
            TreeAction::ExpandPathTo(id) => self.expand_path_to(tree, &id),
            TreeAction::ExpandAll => self.expand_all(tree),
            TreeAction::CollapseAll => self.collapse_all(),
            TreeAction::SetSearchTerm(term) => self.set_search_term(term),
            TreeAction::ResetToDefault => self.reset_to_default(),
        }
    }

    // =========================================================================
    // DERIVED STATE
    // =========================================================================

    /// Check state of a single node
    pub fn check_state(&self, node: &CategoryTreeNode) -> CheckState {
        if node.is_leaf() {
            return if self.is_selected(&node.id()) {
                CheckState::Checked
            } else {
                CheckState::Unchecked
            };
        }
        let leaf_ids = get_all_leaf_ids(node);
        let selected = leaf_ids.iter().filter(|id| self.is_selected(id)).count();
        CheckState::from_counts(selected, leaf_ids.len())
    }

    /// Check state of every node of the tree, keyed by id, in one bottom-up pass
    pub fn node_states(&self, tree: &CategoryTreeNode) -> HashMap<String, CheckState> {
        let selected: HashSet<&str> = self.selected.iter().map(String::as_str).collect();
        let mut states = HashMap::new();

        // (selected leaves, total leaves) below each node
        map_structure(tree, &mut |node: &CategoryTreeNode, counts: Vec<(usize, usize)>| {
            let id = node.id();
            let (chosen, total) = if counts.is_empty() {
                (usize::from(selected.contains(id.as_str())), 1)
            } else {
                counts
                    .into_iter()
                    .fold((0, 0), |(s, t), (cs, ct)| (s + cs, t + ct))
            };
            states.insert(id, CheckState::from_counts(chosen, total));
            (chosen, total)
        });

        states
    }

    /// Render projection of the tree
    pub fn node_view(&self, tree: &CategoryTreeNode) -> NodeView {
        let states = self.node_states(tree);
        NodeView::build(tree, &states, self)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    pub fn snapshot(&self) -> TreeStateSnapshot {
        TreeStateSnapshot {
            mode: self.mode,
            selected: self.selected.clone(),
            expanded: self.expanded.clone(),
            search_term: self.search_term.clone(),
        }
    }

    /// Rebuild a state from a snapshot. The seed is kept for
    /// [`TreeState::reset_to_default`] but not reapplied.
    pub fn restore(snapshot: TreeStateSnapshot, seed: SelectionSeed) -> Self {
        Self {
            mode: snapshot.mode,
            seed,
            selected: Self::fit_to_mode(snapshot.mode, snapshot.selected),
            expanded: dedup(snapshot.expanded),
            search_term: snapshot.search_term,
        }
    }
}

/// Node that selection operations may target; a childless root is an empty
/// tree and offers nothing
fn find_selectable<'a>(tree: &'a CategoryTreeNode, id: &str) -> Option<&'a CategoryTreeNode> {
    if tree.is_leaf() {
        return None;
    }
    find_node(tree, id)
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

// =============================================================================
// RENDER PROJECTION
// =============================================================================

/// What a widget needs to draw one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    pub check_state: CheckState,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

impl NodeView {
    fn build(
        node: &CategoryTreeNode,
        states: &HashMap<String, CheckState>,
        state: &TreeState,
    ) -> Self {
        let id = node.id();
        Self {
            display_name: node
                .display_name()
                .or_else(|| node.label())
                .unwrap_or(id.as_str())
                .to_string(),
            tooltip: node.tooltip().map(str::to_string),
            check_state: states.get(&id).copied().unwrap_or(CheckState::Unchecked),
            expanded: node.is_branch() && state.is_expanded(&id),
            children: node
                .children
                .iter()
                .map(|child| NodeView::build(child, states, state))
                .collect(),
            id,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
