//! Conditional binding mode
//!
//! Walks its conditions in ascending order and emits the value of the first
//! one whose predicate holds, or the base value when none does. Predicates
//! are evaluated fresh every frame.

use crate::binding::condition::BindingCondition;
use crate::binding::ordering;
use crate::binding::BindingContext;
use crate::error::{BindingError, Result};
use crate::events::{BindingEvent, EventBroadcaster};
use crate::id::ConditionId;
use crate::storage::ConditionalDataBindingEntity;
use crate::types::Value;
use crossbeam_channel::Receiver;

/// Conditional binding mode: ordered (predicate, value) branches.
pub struct ConditionalBinding {
    context: BindingContext,
    conditions: Vec<BindingCondition>,
    next_condition_id: u32,
    events: EventBroadcaster<BindingEvent>,
    disposed: bool,
}

impl ConditionalBinding {
    pub fn new(context: BindingContext) -> Self {
        Self {
            context,
            conditions: Vec::new(),
            next_condition_id: 0,
            events: EventBroadcaster::new(),
            disposed: false,
        }
    }

    pub fn from_entity(context: BindingContext, entity: &ConditionalDataBindingEntity) -> Self {
        let mut binding = Self::new(context);
        for condition in &entity.conditions {
            let id = binding.next_id();
            binding
                .conditions
                .push(BindingCondition::from_entity(binding.context.clone(), id, condition));
        }
        ordering::apply_order(&mut binding.conditions);
        binding
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(BindingError::Disposed("ConditionalBinding"))
        } else {
            Ok(())
        }
    }

    fn next_id(&mut self) -> ConditionId {
        let id = ConditionId(self.next_condition_id);
        self.next_condition_id += 1;
        id
    }

    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    /// Conditions in ascending order.
    pub fn conditions(&self) -> &[BindingCondition] {
        &self.conditions
    }

    pub fn condition(&self, id: ConditionId) -> Option<&BindingCondition> {
        self.conditions.iter().find(|c| c.id() == id)
    }

    pub fn condition_mut(&mut self, id: ConditionId) -> Option<&mut BindingCondition> {
        self.conditions.iter_mut().find(|c| c.id() == id)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Value of the first matching condition, else `base`.
    pub fn resolve(&self, base: &Value) -> Result<Value> {
        self.check_disposed()?;
        for condition in &self.conditions {
            if condition.evaluate()? {
                return Ok(condition.value().clone());
            }
        }
        Ok(base.clone())
    }

    /// Append a new condition with an empty predicate.
    pub fn add_condition(&mut self) -> Result<&mut BindingCondition> {
        self.check_disposed()?;
        let id = self.next_id();
        let order = self.conditions.len() as u32 + 1;
        self.conditions
            .push(BindingCondition::new(self.context.clone(), id, order));
        ordering::apply_order(&mut self.conditions);
        self.events.broadcast(BindingEvent::ConditionsUpdated);
        self.condition_mut(id)
            .ok_or(BindingError::Disposed("BindingCondition"))
    }

    /// Remove and dispose a condition. Unknown ids are ignored.
    pub fn remove_condition(&mut self, id: ConditionId) -> Result<()> {
        self.check_disposed()?;
        let Some(index) = self.conditions.iter().position(|c| c.id() == id) else {
            return Ok(());
        };
        let mut condition = self.conditions.remove(index);
        condition.dispose();
        ordering::apply_order(&mut self.conditions);
        self.events.broadcast(BindingEvent::ConditionsUpdated);
        Ok(())
    }

    /// Move a condition to 1-based position `order`.
    pub fn move_condition(&mut self, id: ConditionId, order: u32) -> Result<()> {
        self.check_disposed()?;
        if let Some(index) = self.conditions.iter().position(|c| c.id() == id) {
            ordering::move_to(&mut self.conditions, index, order);
            self.events.broadcast(BindingEvent::ConditionsUpdated);
        }
        Ok(())
    }

    /// Sort conditions by their current order and renumber them 1..N.
    pub fn apply_order(&mut self) -> Result<()> {
        self.check_disposed()?;
        ordering::apply_order(&mut self.conditions);
        self.events.broadcast(BindingEvent::ConditionsUpdated);
        Ok(())
    }

    /// Receive `ConditionsUpdated` notifications.
    pub fn subscribe(&mut self) -> Result<Receiver<BindingEvent>> {
        self.check_disposed()?;
        Ok(self.events.subscribe())
    }

    pub fn save(&self) -> Result<ConditionalDataBindingEntity> {
        self.check_disposed()?;
        let conditions = self
            .conditions
            .iter()
            .map(BindingCondition::save)
            .collect::<Result<Vec<_>>>()?;
        Ok(ConditionalDataBindingEntity { conditions })
    }

    /// Dispose every condition. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for condition in &mut self.conditions {
            condition.dispose();
        }
        self.events.close();
    }
}

impl Drop for ConditionalBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}
