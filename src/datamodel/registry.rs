//! Registry of data models currently provided by plugins.

use crate::datamodel::accessor::AccessorCache;
use crate::datamodel::model::DataModel;
use crate::events::Observers;
use crate::id::{ProviderId, SubscriptionId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Announcements raised by [`DataModelRegistry`].
#[derive(Debug, Clone)]
pub enum DataModelEvent {
    Added(Arc<DataModel>),
    Removed(Arc<DataModel>),
}

/// Process-wide set of available data models.
///
/// Handlers registered with [`subscribe`](Self::subscribe) run synchronously
/// on the thread that adds or removes a model, after the registry lock has
/// been released.
#[derive(Default)]
pub struct DataModelRegistry {
    models: RwLock<HashMap<ProviderId, Arc<DataModel>>>,
    observers: Observers<DataModelEvent>,
    accessors: Arc<AccessorCache>,
}

impl DataModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. A model with the same identity is replaced, which
    /// announces the old handle as removed before the new one is added.
    pub fn add(&self, model: DataModel) -> Arc<DataModel> {
        let model = Arc::new(model);
        let previous = match self.models.write() {
            Ok(mut models) => models.insert(model.id(), Arc::clone(&model)),
            Err(_) => None,
        };

        if let Some(previous) = previous {
            tracing::debug!("Replacing data model {} ({})", previous.name(), previous.id());
            self.accessors.purge(previous.id());
            self.observers.notify(&DataModelEvent::Removed(previous));
        }

        tracing::debug!("Data model added: {} ({})", model.name(), model.id());
        self.observers.notify(&DataModelEvent::Added(Arc::clone(&model)));
        model
    }

    /// Unregister a model, returning it if it was present.
    pub fn remove(&self, id: ProviderId) -> Option<Arc<DataModel>> {
        let removed = self.models.write().ok()?.remove(&id)?;
        self.accessors.purge(id);
        tracing::debug!("Data model removed: {} ({})", removed.name(), id);
        self.observers.notify(&DataModelEvent::Removed(Arc::clone(&removed)));
        Some(removed)
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<DataModel>> {
        self.models.read().ok()?.get(&id).cloned()
    }

    /// All registered models, sorted by name.
    pub fn models(&self) -> Vec<Arc<DataModel>> {
        let mut models: Vec<_> = self
            .models
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        models.sort_by(|a, b| a.name().cmp(b.name()));
        models
    }

    pub fn accessors(&self) -> &Arc<AccessorCache> {
        &self.accessors
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DataModelEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.unsubscribe(id);
    }

    /// Number of live subscriptions, used to check that bindings release theirs.
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}
