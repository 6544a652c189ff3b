//! Model registry and routing
//!
//! The registry selects a model variant for each request and owns the
//! in-memory cache of loaded models: one population singleton plus a per-user
//! map. It is constructed once at startup and injected into request handling;
//! loaded models are immutable for the process lifetime.
//!
//! Cache discipline: reads of a cached entry take no exclusive lock beyond the
//! brief map access. A miss takes a per-key exclusive section so that
//! concurrent misses for the same user collapse into one artifact load
//! (single-flight), while misses for different users load independently. The
//! per-user map grows without bound; eviction is an external concern.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::artifact::ArtifactStore;
use crate::error::EngineError;
use crate::model::{BoundaryModel, InferenceAdapter, ReconstructionModel};
use crate::types::ModelKey;

type UserCell = Arc<OnceCell<Arc<BoundaryModel>>>;

/// Registry of loaded inference adapters
pub struct ModelRegistry {
    store: Arc<dyn ArtifactStore>,
    population: OnceCell<Arc<ReconstructionModel>>,
    per_user: Mutex<HashMap<String, UserCell>>,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            population: OnceCell::new(),
            per_user: Mutex::new(HashMap::new()),
        }
    }

    /// Route a request to its model key.
    ///
    /// A registered user without a user id is a caller error, never silently
    /// defaulted to the population model.
    pub fn route(
        &self,
        registered_user: bool,
        user_id: Option<&str>,
    ) -> Result<ModelKey, EngineError> {
        if registered_user {
            match user_id {
                Some(id) if !id.is_empty() => Ok(ModelKey::PerUser(id.to_string())),
                _ => Err(EngineError::MalformedRequest(
                    "user_id is required when registered_user=true".to_string(),
                )),
            }
        } else {
            Ok(ModelKey::Population)
        }
    }

    /// Resolve a request to a loaded inference adapter.
    pub fn resolve(
        &self,
        registered_user: bool,
        user_id: Option<&str>,
    ) -> Result<Arc<dyn InferenceAdapter>, EngineError> {
        match self.route(registered_user, user_id)? {
            ModelKey::Population => Ok(self.population()?),
            ModelKey::PerUser(id) => Ok(self.per_user(&id)?),
        }
    }

    /// Population adapter, loaded once for the process lifetime.
    ///
    /// A missing (or undecodable) population artifact degrades to the
    /// heuristic fallback rather than failing: population coverage is
    /// required for every unregistered login.
    fn population(&self) -> Result<Arc<ReconstructionModel>, EngineError> {
        let model = self.population.get_or_init(|| {
            let artifact = match self.store.load_population() {
                Ok(artifact) => artifact,
                Err(err) => {
                    log::error!("Population artifact unreadable, using heuristic: {}", err);
                    None
                }
            };
            match artifact {
                Some(artifact) => Arc::new(ReconstructionModel::trained(artifact)),
                None => {
                    log::warn!("No population artifact, running heuristic fallback");
                    Arc::new(ReconstructionModel::heuristic())
                }
            }
        });
        Ok(Arc::clone(model))
    }

    /// Per-user adapter, loaded lazily on first use and cached by user id.
    ///
    /// A failed load leaves the cell empty so a later request retries; a
    /// missing artifact propagates as [`EngineError::ModelNotFound`].
    fn per_user(&self, user_id: &str) -> Result<Arc<BoundaryModel>, EngineError> {
        let cell = {
            let mut map = self.per_user.lock();
            Arc::clone(map.entry(user_id.to_string()).or_default())
        };

        // The map lock is already released; only callers for this user id
        // serialize here.
        let model = cell.get_or_try_init(|| {
            let artifact = self.store.load_user(user_id)?;
            Ok::<_, EngineError>(Arc::new(BoundaryModel::new(artifact)))
        })?;
        Ok(Arc::clone(model))
    }

    /// Number of per-user adapters currently cached.
    pub fn cached_user_count(&self) -> usize {
        let map = self.per_user.lock();
        map.values().filter(|cell| cell.get().is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{AutoencoderArtifact, BoundaryArtifact, StandardScaler};
    use crate::encoder::FEATURE_COUNT;
    use crate::types::ModelFamily;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn identity_scaler() -> StandardScaler {
        StandardScaler {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    fn boundary_artifact() -> BoundaryArtifact {
        BoundaryArtifact {
            support_vectors: vec![vec![0.0; FEATURE_COUNT]],
            dual_coef: vec![1.0],
            intercept: -0.5,
            gamma: 0.1,
            scaler: identity_scaler(),
        }
    }

    /// Store that counts loads and can simulate slow artifact reads
    struct CountingStore {
        population_loads: AtomicUsize,
        user_loads: AtomicUsize,
        known_user: String,
        load_delay: std::time::Duration,
    }

    impl CountingStore {
        fn new(known_user: &str) -> Self {
            Self {
                population_loads: AtomicUsize::new(0),
                user_loads: AtomicUsize::new(0),
                known_user: known_user.to_string(),
                load_delay: std::time::Duration::from_millis(0),
            }
        }

        fn slow(known_user: &str, delay_ms: u64) -> Self {
            Self {
                load_delay: std::time::Duration::from_millis(delay_ms),
                ..Self::new(known_user)
            }
        }
    }

    impl ArtifactStore for CountingStore {
        fn load_population(&self) -> Result<Option<AutoencoderArtifact>, EngineError> {
            self.population_loads.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        fn load_user(&self, user_id: &str) -> Result<BoundaryArtifact, EngineError> {
            std::thread::sleep(self.load_delay);
            self.user_loads.fetch_add(1, Ordering::SeqCst);
            if user_id == self.known_user {
                Ok(boundary_artifact())
            } else {
                Err(EngineError::ModelNotFound {
                    user_id: user_id.to_string(),
                })
            }
        }
    }

    #[test]
    fn test_routing() {
        let registry = ModelRegistry::new(Arc::new(CountingStore::new("u1")));
        assert_eq!(registry.route(false, None).unwrap(), ModelKey::Population);
        assert_eq!(
            registry.route(true, Some("u1")).unwrap(),
            ModelKey::PerUser("u1".to_string())
        );
        assert!(matches!(
            registry.route(true, None),
            Err(EngineError::MalformedRequest(_))
        ));
        assert!(matches!(
            registry.route(true, Some("")),
            Err(EngineError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_population_loaded_once_and_reused() {
        let store = Arc::new(CountingStore::new("u1"));
        let registry = ModelRegistry::new(Arc::clone(&store) as Arc<dyn ArtifactStore>);

        let a = registry.resolve(false, None).unwrap();
        let b = registry.resolve(false, None).unwrap();
        assert_eq!(store.population_loads.load(Ordering::SeqCst), 1);
        assert_eq!(a.family(), ModelFamily::Reconstruction);
        assert_eq!(b.model_name(), "autoencoder_fallback");
    }

    #[test]
    fn test_unknown_user_propagates_model_not_found() {
        let registry = ModelRegistry::new(Arc::new(CountingStore::new("u1")));
        assert!(matches!(
            registry.resolve(true, Some("ghost")),
            Err(EngineError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_failed_user_load_retries_on_next_request() {
        let store = Arc::new(CountingStore::new("u1"));
        let registry = ModelRegistry::new(Arc::clone(&store) as Arc<dyn ArtifactStore>);

        assert!(registry.resolve(true, Some("ghost")).is_err());
        assert!(registry.resolve(true, Some("ghost")).is_err());
        // Both attempts hit the store: the failure is not pinned
        assert_eq!(store.user_loads.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_user_count(), 0);
    }

    #[test]
    fn test_concurrent_resolves_single_flight() {
        let store = Arc::new(CountingStore::slow("u1", 30));
        let registry = Arc::new(ModelRegistry::new(
            Arc::clone(&store) as Arc<dyn ArtifactStore>
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.resolve(true, Some("u1")).map(|_| ()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        // All eight callers received an adapter from exactly one load
        assert_eq!(store.user_loads.load(Ordering::SeqCst), 1);
        assert_eq!(registry.cached_user_count(), 1);
    }

    #[test]
    fn test_cached_user_reused_without_reload() {
        let store = Arc::new(CountingStore::new("u1"));
        let registry = ModelRegistry::new(Arc::clone(&store) as Arc<dyn ArtifactStore>);

        registry.resolve(true, Some("u1")).unwrap();
        registry.resolve(true, Some("u1")).unwrap();
        assert_eq!(store.user_loads.load(Ordering::SeqCst), 1);
        assert_eq!(registry.cached_user_count(), 1);
    }
}
