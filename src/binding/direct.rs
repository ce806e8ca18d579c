//! Direct binding mode
//!
//! Reads one live value from a data model, pipes it through the modifier chain
//! in ascending order and converts the result to the layer property type.
//!
//! A direct binding whose source model is unavailable is inert: `resolve`
//! returns the base value until the model is announced again, at which point
//! the source rebinds by itself.

use crate::binding::modifier::{BindingModifier, ParameterKind};
use crate::binding::ordering;
use crate::binding::BindingContext;
use crate::datamodel::{DataModel, DataModelPath};
use crate::error::{BindingError, Result};
use crate::events::{BindingEvent, EventBroadcaster};
use crate::id::ModifierId;
use crate::storage::DirectDataBindingEntity;
use crate::types::Value;
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Direct binding mode: a source path plus a modifier chain.
pub struct DirectBinding {
    context: BindingContext,
    source: Option<DataModelPath>,
    modifiers: Vec<BindingModifier>,
    next_modifier_id: u32,
    events: EventBroadcaster<BindingEvent>,
    disposed: bool,
}

impl DirectBinding {
    pub fn new(context: BindingContext) -> Self {
        Self {
            context,
            source: None,
            modifiers: Vec::new(),
            next_modifier_id: 0,
            events: EventBroadcaster::new(),
            disposed: false,
        }
    }

    /// Hydrate from a persisted record.
    ///
    /// The source is restored even if its model is not registered yet.
    pub fn from_entity(context: BindingContext, entity: &DirectDataBindingEntity) -> Self {
        let mut binding = Self::new(context);
        binding.source = entity
            .source
            .as_ref()
            .map(|e| DataModelPath::from_entity(&binding.context.data_models, e));
        for modifier in &entity.modifiers {
            let id = binding.next_id();
            binding
                .modifiers
                .push(BindingModifier::from_entity(binding.context.clone(), id, modifier));
        }
        ordering::apply_order(&mut binding.modifiers);
        binding
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(BindingError::Disposed("DirectBinding"))
        } else {
            Ok(())
        }
    }

    fn next_id(&mut self) -> ModifierId {
        let id = ModifierId(self.next_modifier_id);
        self.next_modifier_id += 1;
        id
    }

    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    pub fn source(&self) -> Option<&DataModelPath> {
        self.source.as_ref()
    }

    /// Modifiers in ascending order.
    pub fn modifiers(&self) -> &[BindingModifier] {
        &self.modifiers
    }

    pub fn modifier(&self, id: ModifierId) -> Option<&BindingModifier> {
        self.modifiers.iter().find(|m| m.id() == id)
    }

    pub fn modifier_mut(&mut self, id: ModifierId) -> Option<&mut BindingModifier> {
        self.modifiers.iter_mut().find(|m| m.id() == id)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Bind to `path` on `model`, or clear the source when both are `None`.
    ///
    /// Fails with `InvalidSourceSpecification` if only one is given, and with
    /// `PathNotFound` / `PathUnsupported` if the path does not resolve. The
    /// current source is left untouched on failure.
    pub fn update_source(&mut self, model: Option<&Arc<DataModel>>, path: Option<&str>) -> Result<()> {
        self.check_disposed()?;
        let source = match (model, path) {
            (Some(model), Some(path)) => {
                Some(DataModelPath::new(&self.context.data_models, model, path)?)
            }
            (None, None) => None,
            _ => return Err(BindingError::InvalidSourceSpecification),
        };
        if let Some(mut previous) = self.source.take() {
            previous.dispose();
        }
        self.source = source;
        Ok(())
    }

    /// Compute the property value for this frame.
    pub fn resolve(&self, base: &Value) -> Result<Value> {
        self.check_disposed()?;
        let Some(raw) = self.source.as_ref().and_then(DataModelPath::value) else {
            return Ok(base.clone());
        };

        let value = self
            .modifiers
            .iter()
            .try_fold(raw, |value, modifier| modifier.apply(&value))?;

        match self.context.converter.convert(&value, self.context.target_type()) {
            Ok(converted) => Ok(converted),
            Err(e) => {
                tracing::trace!("Cannot convert bound value for {}: {}", self.context.property.path, e);
                Ok(base.clone())
            }
        }
    }

    /// Append a new modifier and return it for configuration.
    pub fn add_modifier(&mut self, kind: ParameterKind) -> Result<&mut BindingModifier> {
        self.check_disposed()?;
        let id = self.next_id();
        let order = self.modifiers.len() as u32 + 1;
        self.modifiers
            .push(BindingModifier::new(self.context.clone(), id, kind, order));
        ordering::apply_order(&mut self.modifiers);
        self.events.broadcast(BindingEvent::ModifiersUpdated);
        self.modifier_mut(id)
            .ok_or(BindingError::Disposed("BindingModifier"))
    }

    /// Remove and dispose a modifier. Unknown ids are ignored.
    pub fn remove_modifier(&mut self, id: ModifierId) -> Result<()> {
        self.check_disposed()?;
        let Some(index) = self.modifiers.iter().position(|m| m.id() == id) else {
            return Ok(());
        };
        let mut modifier = self.modifiers.remove(index);
        modifier.dispose();
        ordering::apply_order(&mut self.modifiers);
        self.events.broadcast(BindingEvent::ModifiersUpdated);
        Ok(())
    }

    /// Move a modifier to 1-based position `order`.
    pub fn move_modifier(&mut self, id: ModifierId, order: u32) -> Result<()> {
        self.check_disposed()?;
        if let Some(index) = self.modifiers.iter().position(|m| m.id() == id) {
            ordering::move_to(&mut self.modifiers, index, order);
            self.events.broadcast(BindingEvent::ModifiersUpdated);
        }
        Ok(())
    }

    /// Sort modifiers by their current order and renumber them 1..N.
    pub fn apply_order(&mut self) -> Result<()> {
        self.check_disposed()?;
        ordering::apply_order(&mut self.modifiers);
        self.events.broadcast(BindingEvent::ModifiersUpdated);
        Ok(())
    }

    /// Receive `ModifiersUpdated` notifications.
    pub fn subscribe(&mut self) -> Result<Receiver<BindingEvent>> {
        self.check_disposed()?;
        Ok(self.events.subscribe())
    }

    /// Persist this binding. Modifiers with a broken parameter path are skipped.
    pub fn save(&self) -> Result<DirectDataBindingEntity> {
        self.check_disposed()?;
        let source = self.source.as_ref().map(DataModelPath::to_entity).transpose()?;
        let mut modifiers = Vec::with_capacity(self.modifiers.len());
        for modifier in &self.modifiers {
            if let Some(entity) = modifier.save()? {
                modifiers.push(entity);
            }
        }
        Ok(DirectDataBindingEntity { source, modifiers })
    }

    /// Dispose modifiers, then release the source subscription. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for modifier in &mut self.modifiers {
            modifier.dispose();
        }
        if let Some(source) = &mut self.source {
            source.dispose();
        }
        self.events.close();
    }
}

impl Drop for DirectBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}
