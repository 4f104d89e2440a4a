//! Engine configuration
//!
//! Loaded from `ontology_tree.yaml` in the config directory:
//!
//! ```yaml
//! ontology_path: data/ontology.json
//! model_path: data/model.json
//! pickers:
//!   download_attributes:
//!     target_type: attribute
//!     scope: download
//!     record_class_name: GeneRecordClasses.GeneRecordClass
//!     multi_pick: true
//!     hide_internal: true
//! ```
//!
//! A picker preset describes one checkbox-tree widget: which leaves qualify,
//! the selection mode, and whether internal fields are hidden from display
//! (they stay searchable).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::FileOntologySource;
use crate::category::{CategoryTreeNode, QualifyingSpec, Scope, TargetType};
use crate::error::{OntologyError, Result};
use crate::prune::prune_tree;
use crate::selection::SelectionMode;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "ONTOLOGY_TREE_CONFIG_DIR";
pub const CONFIG_FILE: &str = "ontology_tree.yaml";

fn default_ontology_path() -> PathBuf {
    PathBuf::from("data/ontology.json")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("data/model.json")
}

fn default_true() -> bool {
    true
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_ontology_path")]
    pub ontology_path: PathBuf,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default)]
    pub pickers: BTreeMap<String, PickerPreset>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ontology_path: default_ontology_path(),
            model_path: default_model_path(),
            pickers: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn picker(&self, name: &str) -> Result<&PickerPreset> {
        self.pickers
            .get(name)
            .ok_or_else(|| OntologyError::UnknownPicker {
                name: name.to_string(),
            })
    }

    /// Source reading the configured ontology and model files
    pub fn file_source(&self) -> FileOntologySource {
        FileOntologySource::new(self.ontology_path.clone(), self.model_path.clone())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, preset) in &self.pickers {
            if preset.hide_internal && preset.scope.is_some_and(|s| s.is_internal()) {
                return Err(OntologyError::Config {
                    message: format!(
                        "picker '{}' selects an internal scope but hides internal fields",
                        name
                    ),
                });
            }
        }
        Ok(())
    }
}

/// One checkbox-tree widget configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_class_name: Option<String>,
    #[serde(default = "default_true")]
    pub multi_pick: bool,
    #[serde(default)]
    pub hide_internal: bool,
}

impl Default for PickerPreset {
    fn default() -> Self {
        Self {
            target_type: None,
            scope: None,
            record_class_name: None,
            multi_pick: true,
            hide_internal: false,
        }
    }
}

impl PickerPreset {
    /// Property values a leaf must carry to appear in this picker
    pub fn qualifying_spec(&self) -> QualifyingSpec {
        let mut spec = QualifyingSpec::new();
        if let Some(target_type) = self.target_type {
            spec = spec.target_type(target_type);
        }
        if let Some(scope) = self.scope {
            spec = spec.scope(scope);
        }
        if let Some(record_class_name) = &self.record_class_name {
            spec = spec.record_class_name(record_class_name.clone());
        }
        spec
    }

    pub fn selection_mode(&self) -> SelectionMode {
        SelectionMode::from_multi_pick(self.multi_pick)
    }

    /// Visibility filter: with `hide_internal`, nodes offered only in
    /// internal scopes are hidden
    pub fn is_visible(&self, node: &CategoryTreeNode) -> bool {
        if !self.hide_internal {
            return true;
        }
        let scopes = node.scopes();
        scopes.is_empty() || scopes.iter().any(|scope| !scope.is_internal())
    }

    /// Sub-tree of `tree` relevant to this picker.
    ///
    /// With `hide_internal`, leaves of the internal counterpart scope are
    /// kept as well so searches can still reach them.
    pub fn prune(&self, tree: &CategoryTreeNode) -> CategoryTreeNode {
        let spec = self.qualifying_spec();
        let internal_spec = match (self.hide_internal, self.scope) {
            (true, Some(scope)) => Some(spec.clone().scope(scope.internal())),
            _ => None,
        };
        prune_tree(tree, |node: &CategoryTreeNode| {
            spec.matches(node) || internal_spec.as_ref().is_some_and(|s| s.matches(node))
        })
    }
}

// =============================================================================
// LOADER
// =============================================================================

/// Locates and reads the configuration file
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Create loader from ONTOLOGY_TREE_CONFIG_DIR or default to "config"
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => Self::new(dir),
            Err(_) => Self::new("config"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load and validate the configuration; a missing file yields defaults
    pub fn load(&self) -> Result<EngineConfig> {
        let path = self.config_path();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(EngineConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;

        tracing::info!(
            "Loaded {} picker presets from {}",
            config.pickers.len(),
            path.display()
        );
        Ok(config)
    }
}
