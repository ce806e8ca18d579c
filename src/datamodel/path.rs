//! Live references to a property of a data model.
//!
//! A [`DataModelPath`] remembers the model identity and the dotted path even
//! while the model is unavailable. It subscribes to the registry so that it
//! rebinds by itself when a model with the same identity is announced again,
//! and falls dormant when its model is removed.

use crate::datamodel::accessor::{AccessorCache, PathAccessor};
use crate::datamodel::model::DataModel;
use crate::datamodel::registry::{DataModelEvent, DataModelRegistry};
use crate::error::{BindingError, Result};
use crate::id::{ProviderId, SubscriptionId};
use crate::storage::DataModelPathEntity;
use crate::types::{Value, ValueType};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Binding state of a [`DataModelPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// The model is available and the path resolves.
    Bound,
    /// The model is not currently registered.
    Dormant,
    /// The model is registered but the path does not resolve against its shape.
    Broken,
}

struct PathState {
    model_id: ProviderId,
    path: String,
    model: Weak<DataModel>,
    accessor: Option<Arc<PathAccessor>>,
}

impl PathState {
    fn bind(&mut self, model: &Arc<DataModel>, cache: &AccessorCache) {
        self.model = Arc::downgrade(model);
        match cache.get_or_compile(model, &self.path) {
            Ok(accessor) => {
                tracing::debug!("Bound '{}' on {}", self.path, model.name());
                self.accessor = Some(accessor);
            }
            Err(e) => {
                tracing::debug!("Cannot bind '{}' on {}: {}", self.path, model.name(), e);
                self.accessor = None;
            }
        }
    }

    fn unbind(&mut self) {
        self.model = Weak::new();
        self.accessor = None;
    }

    fn status(&self) -> PathStatus {
        match (self.model.strong_count() > 0, self.accessor.is_some()) {
            (true, true) => PathStatus::Bound,
            (true, false) => PathStatus::Broken,
            (false, _) => PathStatus::Dormant,
        }
    }
}

/// A (data model, path) pair that follows registry events.
pub struct DataModelPath {
    state: Arc<Mutex<PathState>>,
    registry: Weak<DataModelRegistry>,
    subscription: SubscriptionId,
}

impl DataModelPath {
    /// Create a path on a registered model.
    ///
    /// Fails with `PathNotFound` or `PathUnsupported` when the path cannot be
    /// compiled against the model's shape.
    pub fn new(registry: &Arc<DataModelRegistry>, model: &Arc<DataModel>, path: &str) -> Result<Self> {
        let accessor = registry.accessors().get_or_compile(model, path)?;
        let state = PathState {
            model_id: model.id(),
            path: path.to_string(),
            model: Arc::downgrade(model),
            accessor: Some(accessor),
        };
        Ok(Self::attach(registry, state))
    }

    /// Create a path from a persisted reference.
    ///
    /// Binds right away if the model is registered and the path resolves,
    /// otherwise starts dormant or broken and waits for the registry.
    pub fn from_entity(registry: &Arc<DataModelRegistry>, entity: &DataModelPathEntity) -> Self {
        let mut state = PathState {
            model_id: entity.data_model_id,
            path: entity.path.clone(),
            model: Weak::new(),
            accessor: None,
        };
        if let Some(model) = registry.get(entity.data_model_id) {
            state.bind(&model, registry.accessors());
        }
        Self::attach(registry, state)
    }

    fn attach(registry: &Arc<DataModelRegistry>, state: PathState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let weak_state = Arc::downgrade(&state);
        let cache = Arc::clone(registry.accessors());

        let subscription = registry.subscribe(move |event| {
            let Some(state) = weak_state.upgrade() else {
                return;
            };
            let Ok(mut state) = state.lock() else {
                return;
            };
            match event {
                DataModelEvent::Added(model) if model.id() == state.model_id => {
                    state.bind(model, &cache);
                }
                DataModelEvent::Removed(model) if model.id() == state.model_id => {
                    tracing::debug!("Data model for '{}' went away", state.path);
                    state.unbind();
                }
                _ => {}
            }
        });

        Self {
            state,
            registry: Arc::downgrade(registry),
            subscription,
        }
    }

    pub fn model_id(&self) -> Option<ProviderId> {
        self.state.lock().ok().map(|s| s.model_id)
    }

    pub fn path(&self) -> String {
        self.state.lock().map(|s| s.path.clone()).unwrap_or_default()
    }

    /// The model this path is bound to, if it is available.
    pub fn model(&self) -> Option<Arc<DataModel>> {
        self.state.lock().ok()?.model.upgrade()
    }

    pub fn status(&self) -> PathStatus {
        self.state
            .lock()
            .map(|s| s.status())
            .unwrap_or(PathStatus::Dormant)
    }

    /// True when the model is available and the path resolves.
    pub fn is_valid(&self) -> bool {
        self.status() == PathStatus::Bound
    }

    /// Declared type of the referenced property, when bound.
    pub fn value_type(&self) -> Option<ValueType> {
        let state = self.state.lock().ok()?;
        state.accessor.as_ref().map(|a| a.value_type())
    }

    /// Current value of the referenced property, `None` unless bound.
    #[inline]
    pub fn value(&self) -> Option<Value> {
        let state = self.state.lock().ok()?;
        let accessor = state.accessor.as_ref()?;
        let model = state.model.upgrade()?;
        model.read(accessor)
    }

    pub fn to_entity(&self) -> Result<DataModelPathEntity> {
        let state = self
            .state
            .lock()
            .map_err(|_| BindingError::Disposed("DataModelPath"))?;
        Ok(DataModelPathEntity {
            data_model_id: state.model_id,
            path: state.path.clone(),
        })
    }

    /// Stop following registry events. Idempotent.
    pub fn dispose(&mut self) {
        if !self.subscription.is_valid() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.subscription);
        }
        self.subscription = SubscriptionId::INVALID;
    }
}

impl Clone for DataModelPath {
    fn clone(&self) -> Self {
        let state = {
            let s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            PathState {
                model_id: s.model_id,
                path: s.path.clone(),
                model: s.model.clone(),
                accessor: s.accessor.clone(),
            }
        };
        match self.registry.upgrade() {
            Some(registry) => Self::attach(&registry, state),
            None => Self {
                state: Arc::new(Mutex::new(state)),
                registry: Weak::new(),
                subscription: SubscriptionId::INVALID,
            },
        }
    }
}

impl Drop for DataModelPath {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DataModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.lock() {
            Ok(s) => f
                .debug_struct("DataModelPath")
                .field("model_id", &s.model_id)
                .field("path", &s.path)
                .field("status", &s.status())
                .finish(),
            Err(_) => write!(f, "DataModelPath(<poisoned>)"),
        }
    }
}
