//! Binding modifiers
//!
//! A modifier applies a registered [`ModifierType`](crate::modifiers::ModifierType)
//! to the value flowing through a direct binding. Its parameter is either a
//! static value or a live data model path.
//!
//! The modifier type is referenced by (provider id, type name). When that
//! type is not registered yet the modifier passes values through untouched
//! and resolves the type as soon as the registry announces it. When the type
//! is unregistered the modifier reverts to pass-through but keeps the
//! reference for the next registration.

use crate::binding::ordering::Ordered;
use crate::binding::BindingContext;
use crate::datamodel::{DataModelPath, PathStatus};
use crate::error::{BindingError, Result};
use crate::id::{ModifierId, SubscriptionId};
use crate::modifiers::{ModifierTypeEvent, ModifierTypeKey, ModifierTypeRegistration, TypePart};
use crate::storage::{self, DataBindingModifierEntity};
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where a modifier takes its parameter from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterKind {
    /// A live data model property
    Dynamic,
    /// A fixed value
    #[default]
    Static,
}

/// Type reference and parameter of a modifier, shared with the registry
/// handler.
struct ModifierState {
    key: Option<ModifierTypeKey>,
    resolved: Option<Arc<ModifierTypeRegistration>>,
    parameter_kind: ParameterKind,
    parameter_path: Option<DataModelPath>,
    parameter_static_value: Value,
}

impl ModifierState {
    fn expected_parameter_type(&self, target: ValueType) -> ValueType {
        self.resolved
            .as_ref()
            .and_then(|r| r.modifier_type().parameter_type())
            .unwrap_or(target)
    }

    /// Bring the parameter in line with the resolved modifier type.
    fn validate_parameter(&mut self, id: ModifierId, target: ValueType) {
        let Some(registration) = self.resolved.clone() else {
            return;
        };
        let modifier_type = registration.modifier_type();

        match self.parameter_kind {
            ParameterKind::Dynamic => {
                let unsupported = self
                    .parameter_path
                    .as_ref()
                    .and_then(DataModelPath::value_type)
                    .is_some_and(|ty| !modifier_type.supports_type(ty, TypePart::Parameter));
                if unsupported {
                    tracing::debug!("Clearing parameter path of modifier {}: type not supported", id);
                    if let Some(mut path) = self.parameter_path.take() {
                        path.dispose();
                    }
                }
            }
            ParameterKind::Static => {
                let expected = self.expected_parameter_type(target);
                let supported = match self.parameter_static_value.value_type() {
                    Some(ty) => modifier_type.supports_type(ty, TypePart::Parameter),
                    None => true,
                };
                self.parameter_static_value = if supported {
                    self.parameter_static_value
                        .convert_to(expected)
                        .unwrap_or_else(|_| expected.default_value())
                } else {
                    expected.default_value()
                };
            }
        }
    }
}

/// A modifier in a direct binding's chain.
pub struct BindingModifier {
    id: ModifierId,
    context: BindingContext,
    state: Arc<Mutex<ModifierState>>,
    subscription: SubscriptionId,
    order: u32,
    disposed: bool,
}

impl BindingModifier {
    /// Create an unconfigured modifier.
    pub fn new(context: BindingContext, id: ModifierId, kind: ParameterKind, order: u32) -> Self {
        let state = ModifierState {
            key: None,
            resolved: None,
            parameter_kind: kind,
            parameter_path: None,
            parameter_static_value: context.target_type().default_value(),
        };
        Self::attach(context, id, state, order)
    }

    /// Hydrate a modifier from its persisted record.
    pub fn from_entity(context: BindingContext, id: ModifierId, entity: &DataBindingModifierEntity) -> Self {
        let target = context.target_type();
        let resolved = entity.modifier_type.as_ref().and_then(|key| {
            let registration = context.modifier_types.get(key)?;
            if registration.modifier_type().supports_type(target, TypePart::Value) {
                Some(registration)
            } else {
                tracing::warn!("Modifier type {} does not support {}, leaving it unresolved", key, target);
                None
            }
        });

        let expected = resolved
            .as_ref()
            .and_then(|r| r.modifier_type().parameter_type())
            .unwrap_or(target);
        let parameter_static_value =
            storage::deserialize_or_default(entity.parameter_static_value.as_deref(), expected);
        let parameter_path = entity
            .parameter_path
            .as_ref()
            .map(|e| DataModelPath::from_entity(&context.data_models, e));

        let state = ModifierState {
            key: entity.modifier_type.clone(),
            resolved,
            parameter_kind: entity.parameter_kind,
            parameter_path,
            parameter_static_value,
        };
        Self::attach(context, id, state, entity.order)
    }

    fn attach(context: BindingContext, id: ModifierId, state: ModifierState, order: u32) -> Self {
        let state = Arc::new(Mutex::new(state));
        let weak_state = Arc::downgrade(&state);
        let target = context.target_type();

        let subscription = context.modifier_types.subscribe(move |event| {
            let Some(state) = weak_state.upgrade() else {
                return;
            };
            let Ok(mut state) = state.lock() else {
                return;
            };
            match event {
                ModifierTypeEvent::Added(registration) if state.resolved.is_none() => {
                    let matches = state.key.as_ref().is_some_and(|k| registration.matches(k));
                    if matches && registration.modifier_type().supports_type(target, TypePart::Value) {
                        tracing::debug!("Resolved modifier type {}", registration.key());
                        state.resolved = Some(Arc::clone(registration));
                        state.validate_parameter(id, target);
                    }
                }
                ModifierTypeEvent::Removed(registration) => {
                    let current = state.resolved.as_ref().is_some_and(|r| Arc::ptr_eq(r, registration));
                    if current {
                        tracing::debug!("Modifier type {} went away", registration.key());
                        state.resolved = None;
                    }
                }
                _ => {}
            }
        });

        Self {
            id,
            context,
            state,
            subscription,
            order,
            disposed: false,
        }
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(BindingError::Disposed("BindingModifier"))
        } else {
            Ok(())
        }
    }

    fn state(&self) -> MutexGuard<'_, ModifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> ModifierId {
        self.id
    }

    /// The currently resolved modifier type, if any.
    pub fn modifier_type(&self) -> Option<Arc<ModifierTypeRegistration>> {
        self.state().resolved.clone()
    }

    /// The referenced modifier type, resolved or not.
    pub fn modifier_type_key(&self) -> Option<ModifierTypeKey> {
        self.state().key.clone()
    }

    pub fn parameter_kind(&self) -> ParameterKind {
        self.state().parameter_kind
    }

    pub fn parameter_path(&self) -> Option<DataModelPath> {
        self.state().parameter_path.clone()
    }

    pub fn parameter_static_value(&self) -> Value {
        self.state().parameter_static_value.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The type static parameter values are coerced to.
    pub fn expected_parameter_type(&self) -> ValueType {
        self.state().expected_parameter_type(self.context.target_type())
    }

    /// Apply this modifier to `current`.
    ///
    /// Passes `current` through when the type is unresolved or a dynamic
    /// parameter cannot be read.
    pub fn apply(&self, current: &Value) -> Result<Value> {
        self.check_disposed()?;
        let state = self.state();
        let Some(registration) = state.resolved.as_ref() else {
            return Ok(current.clone());
        };
        let modifier_type = registration.modifier_type();
        if modifier_type.parameter_type().is_none() {
            return Ok(modifier_type.apply(current, None));
        }

        match state.parameter_kind {
            ParameterKind::Dynamic => {
                match state.parameter_path.as_ref().and_then(DataModelPath::value) {
                    Some(parameter) => Ok(modifier_type.apply(current, Some(&parameter))),
                    None => {
                        tracing::trace!("Modifier {} has no readable parameter", self.id);
                        Ok(current.clone())
                    }
                }
            }
            ParameterKind::Static => Ok(modifier_type.apply(current, Some(&state.parameter_static_value))),
        }
    }

    /// Change the modifier type, or clear it with `None`.
    ///
    /// Fails with `UnsupportedModifierForType` if the type cannot modify the
    /// binding's target type. Afterwards the parameter is revalidated against
    /// the new type.
    pub fn update_modifier_type(&mut self, registration: Option<&Arc<ModifierTypeRegistration>>) -> Result<()> {
        self.check_disposed()?;
        let target = self.context.target_type();

        let Some(registration) = registration else {
            let mut state = self.state();
            state.key = None;
            state.resolved = None;
            return Ok(());
        };

        if !registration.modifier_type().supports_type(target, TypePart::Value) {
            return Err(BindingError::UnsupportedModifierForType {
                modifier: registration.name().to_string(),
                target,
            });
        }

        let mut state = self.state();
        state.key = Some(registration.key());
        state.resolved = Some(Arc::clone(registration));
        state.validate_parameter(self.id, target);
        Ok(())
    }

    /// Take the parameter from a live data model path.
    ///
    /// Fails with `InvalidParameterPath` if `path` is given but not bound.
    pub fn update_parameter_dynamic(&mut self, path: Option<DataModelPath>) -> Result<()> {
        self.check_disposed()?;
        if let Some(path) = &path {
            if !path.is_valid() {
                return Err(BindingError::InvalidParameterPath(path.path()));
            }
        }
        let mut state = self.state();
        if let Some(mut previous) = state.parameter_path.take() {
            previous.dispose();
        }
        state.parameter_path = path;
        state.parameter_kind = ParameterKind::Dynamic;
        Ok(())
    }

    /// Use a fixed parameter value.
    ///
    /// The value is coerced to the expected parameter type; `None` becomes
    /// that type's default.
    pub fn update_parameter_static(&mut self, value: Option<Value>) -> Result<()> {
        self.check_disposed()?;
        let target = self.context.target_type();
        let mut state = self.state();
        let expected = state.expected_parameter_type(target);
        let value = match value {
            Some(value) => value.convert_to(expected)?,
            None => expected.default_value(),
        };
        if let Some(mut previous) = state.parameter_path.take() {
            previous.dispose();
        }
        state.parameter_static_value = value;
        state.parameter_kind = ParameterKind::Static;
        Ok(())
    }

    /// Persist this modifier.
    ///
    /// Returns `None` while a dynamic parameter path is broken, so an invalid
    /// edit never reaches saved state.
    pub fn save(&self) -> Result<Option<DataBindingModifierEntity>> {
        self.check_disposed()?;
        let state = self.state();
        let (parameter_path, parameter_static_value) = match state.parameter_kind {
            ParameterKind::Dynamic => {
                if let Some(path) = &state.parameter_path {
                    if path.status() == PathStatus::Broken {
                        tracing::debug!("Not saving modifier {}: parameter path is broken", self.id);
                        return Ok(None);
                    }
                }
                (state.parameter_path.as_ref().map(DataModelPath::to_entity).transpose()?, None)
            }
            ParameterKind::Static => (None, Some(storage::serialize_value(&state.parameter_static_value)?)),
        };

        Ok(Some(DataBindingModifierEntity {
            modifier_type: state.key.clone(),
            parameter_kind: state.parameter_kind,
            order: self.order,
            parameter_path,
            parameter_static_value,
        }))
    }

    /// Release registry subscriptions. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.context.modifier_types.unsubscribe(self.subscription);
        if let Some(path) = &mut self.state().parameter_path {
            path.dispose();
        }
    }
}

impl Ordered for BindingModifier {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl Drop for BindingModifier {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for BindingModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingModifier")
            .field("id", &self.id)
            .field("modifier_type", &self.modifier_type_key())
            .field("parameter_kind", &self.parameter_kind())
            .field("order", &self.order)
            .finish()
    }
}
