//! Session cache of the prepared ontology
//!
//! The raw ontology and the domain model are fetched from an
//! [`OntologySource`] at most once per cache generation. Concurrent callers
//! that arrive while a fetch is in flight wait for that same fetch. The
//! fetched tree is pruned, resolved, and sorted before it is stored, and is
//! only ever handed out behind an `Arc` afterwards.
//!
//! A failed fetch is not cached; the next caller tries again.
//! [`OntologyCache::invalidate`] starts a new generation (e.g. after the
//! model changed). Callers still holding the previous `Arc` keep a
//! consistent, if stale, tree.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::category::CategoryOntology;
use crate::error::Result;
use crate::model::ModelIndex;
use crate::resolve::prepare_ontology;
use crate::tree::Ontology;
use crate::wire::parse_ontology_json;

/// Where the raw ontology and the domain model come from
#[async_trait]
pub trait OntologySource: Send + Sync {
    async fn fetch_ontology(&self) -> Result<Ontology<()>>;
    async fn fetch_model(&self) -> Result<ModelIndex>;
}

/// Reads both documents from JSON files
#[derive(Debug, Clone)]
pub struct FileOntologySource {
    ontology_path: PathBuf,
    model_path: PathBuf,
}

impl FileOntologySource {
    pub fn new(ontology_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            ontology_path: ontology_path.into(),
            model_path: model_path.into(),
        }
    }

    pub fn ontology_path(&self) -> &Path {
        &self.ontology_path
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

#[async_trait]
impl OntologySource for FileOntologySource {
    async fn fetch_ontology(&self) -> Result<Ontology<()>> {
        let content = tokio::fs::read_to_string(&self.ontology_path).await?;
        parse_ontology_json(&content)
    }

    async fn fetch_model(&self) -> Result<ModelIndex> {
        let content = tokio::fs::read_to_string(&self.model_path).await?;
        ModelIndex::from_json(&content)
    }
}

/// Prepared ontology together with the model it was resolved against
#[derive(Debug)]
pub struct LoadedOntology {
    pub ontology: CategoryOntology,
    pub model: ModelIndex,
}

type Slot = Arc<OnceCell<Arc<LoadedOntology>>>;

/// Explicitly owned, fetch-once cache of the prepared ontology
pub struct OntologyCache<S> {
    source: S,
    slot: Mutex<Slot>,
    generation: AtomicU64,
}

impl<S: OntologySource> OntologyCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slot: Mutex::new(Arc::new(OnceCell::new())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The prepared ontology, fetching it if this generation has none yet
    pub async fn get(&self) -> Result<Arc<LoadedOntology>> {
        let slot = self.current_slot();
        let loaded = slot.get_or_try_init(|| self.load()).await?;
        Ok(Arc::clone(loaded))
    }

    /// The prepared ontology if it has already been fetched
    pub fn cached(&self) -> Option<Arc<LoadedOntology>> {
        self.current_slot().get().cloned()
    }

    /// Drop the cached ontology; the next [`OntologyCache::get`] fetches again
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(OnceCell::new());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("Ontology cache invalidated (generation {})", generation);
    }

    /// Number of invalidations so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn current_slot(&self) -> Slot {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&slot)
    }

    async fn load(&self) -> Result<Arc<LoadedOntology>> {
        let (raw, model) =
            tokio::try_join!(self.source.fetch_ontology(), self.source.fetch_model())?;
        let ontology = prepare_ontology(&model, &raw);
        tracing::info!(
            "Loaded ontology '{}' ({} of {} nodes kept)",
            ontology.name,
            ontology.tree.node_count(),
            raw.tree.node_count()
        );
        Ok(Arc::new(LoadedOntology { ontology, model }))
    }
}
