//! Pluggable modifier types
//!
//! A modifier type is a transformation that a binding modifier applies to the
//! value flowing through a direct binding. Types are registered at runtime by
//! providers (the built-in set, user scripts, plugins) and looked up by
//! (provider id, type name).
//!
//! # Main Types
//!
//! - [`ModifierType`] - The capability interface every modifier type implements
//! - [`ModifierTypeRegistration`] - A type registered under a provider
//! - [`ModifierTypeRegistry`] - Registered types, with add/remove events
//!
//! # Built-in Types
//!
//! See [`builtin`] for the arithmetic, rounding, trigonometric and color
//! modifiers, and [`script`] for Rhai expression modifiers.

pub mod builtin;
pub mod script;

pub use builtin::{register_builtins, BuiltinModifier};
pub use script::ScriptModifier;

use crate::events::Observers;
use crate::id::{ProviderId, SubscriptionId};
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Which side of a modifier a type check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePart {
    /// The value being modified.
    Value,
    /// The modifier's parameter.
    Parameter,
}

/// A transformation applied by binding modifiers.
pub trait ModifierType: Send + Sync {
    /// Unique name within the provider.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Grouping shown by editors.
    fn category(&self) -> Option<&str> {
        None
    }

    /// The parameter type, or `None` if the type takes no parameter.
    fn parameter_type(&self) -> Option<ValueType>;

    /// Whether this type can operate on `ty` for the given `part`.
    fn supports_type(&self, ty: ValueType, part: TypePart) -> bool;

    /// Apply the transformation. `parameter` is `None` for parameterless types.
    fn apply(&self, current: &Value, parameter: Option<&Value>) -> Value;
}

/// Identity of a registered modifier type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierTypeKey {
    pub provider: ProviderId,
    pub name: String,
}

impl ModifierTypeKey {
    pub fn new(provider: ProviderId, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }
}

impl fmt::Display for ModifierTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// A modifier type registered by a provider.
pub struct ModifierTypeRegistration {
    provider: ProviderId,
    modifier_type: Arc<dyn ModifierType>,
}

impl ModifierTypeRegistration {
    pub fn new(provider: ProviderId, modifier_type: Arc<dyn ModifierType>) -> Self {
        Self {
            provider,
            modifier_type,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn name(&self) -> &str {
        self.modifier_type.name()
    }

    pub fn key(&self) -> ModifierTypeKey {
        ModifierTypeKey {
            provider: self.provider,
            name: self.name().to_string(),
        }
    }

    pub fn matches(&self, key: &ModifierTypeKey) -> bool {
        self.provider == key.provider && self.name() == key.name
    }

    pub fn modifier_type(&self) -> &Arc<dyn ModifierType> {
        &self.modifier_type
    }
}

impl fmt::Debug for ModifierTypeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierTypeRegistration")
            .field("provider", &self.provider)
            .field("name", &self.name())
            .finish()
    }
}

/// Announcements raised by [`ModifierTypeRegistry`].
#[derive(Debug, Clone)]
pub enum ModifierTypeEvent {
    Added(Arc<ModifierTypeRegistration>),
    Removed(Arc<ModifierTypeRegistration>),
}

/// Process-wide set of available modifier types.
#[derive(Default)]
pub struct ModifierTypeRegistry {
    registrations: RwLock<Vec<Arc<ModifierTypeRegistration>>>,
    observers: Observers<ModifierTypeEvent>,
}

impl ModifierTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under `provider`, replacing one with the same name.
    pub fn register(
        &self,
        provider: ProviderId,
        modifier_type: Arc<dyn ModifierType>,
    ) -> Arc<ModifierTypeRegistration> {
        let registration = Arc::new(ModifierTypeRegistration::new(provider, modifier_type));
        let key = registration.key();

        let previous = match self.registrations.write() {
            Ok(mut registrations) => {
                let previous = registrations
                    .iter()
                    .position(|r| r.matches(&key))
                    .map(|i| registrations.remove(i));
                registrations.push(Arc::clone(&registration));
                previous
            }
            Err(_) => None,
        };

        if let Some(previous) = previous {
            self.observers.notify(&ModifierTypeEvent::Removed(previous));
        }
        tracing::debug!("Modifier type registered: {}", key);
        self.observers
            .notify(&ModifierTypeEvent::Added(Arc::clone(&registration)));
        registration
    }

    /// Remove a single type.
    pub fn unregister(&self, key: &ModifierTypeKey) -> Option<Arc<ModifierTypeRegistration>> {
        let removed = {
            let mut registrations = self.registrations.write().ok()?;
            let index = registrations.iter().position(|r| r.matches(key))?;
            registrations.remove(index)
        };
        tracing::debug!("Modifier type removed: {}", key);
        self.observers
            .notify(&ModifierTypeEvent::Removed(Arc::clone(&removed)));
        Some(removed)
    }

    /// Remove every type registered by `provider`, e.g. when a plugin unloads.
    pub fn unregister_provider(&self, provider: ProviderId) -> usize {
        let removed: Vec<_> = match self.registrations.write() {
            Ok(mut registrations) => {
                let (gone, kept): (Vec<_>, Vec<_>) = registrations
                    .drain(..)
                    .partition(|r| r.provider() == provider);
                *registrations = kept;
                gone
            }
            Err(_) => Vec::new(),
        };
        for registration in &removed {
            self.observers
                .notify(&ModifierTypeEvent::Removed(Arc::clone(registration)));
        }
        removed.len()
    }

    pub fn get(&self, key: &ModifierTypeKey) -> Option<Arc<ModifierTypeRegistration>> {
        self.registrations
            .read()
            .ok()?
            .iter()
            .find(|r| r.matches(key))
            .cloned()
    }

    pub fn registrations(&self) -> Vec<Arc<ModifierTypeRegistration>> {
        self.registrations
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Types that can modify a value of type `target`.
    pub fn compatible_with(&self, target: ValueType) -> Vec<Arc<ModifierTypeRegistration>> {
        self.registrations()
            .into_iter()
            .filter(|r| r.modifier_type().supports_type(target, TypePart::Value))
            .collect()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ModifierTypeEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.unsubscribe(id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}
