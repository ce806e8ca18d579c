//! A single branch of a conditional binding.

use crate::binding::ordering::Ordered;
use crate::binding::BindingContext;
use crate::conditions::ConditionGroup;
use crate::error::{BindingError, Result};
use crate::id::ConditionId;
use crate::storage::{self, DataBindingConditionEntity};
use crate::types::Value;
use std::fmt;

/// A predicate tree plus the value emitted while it holds.
pub struct BindingCondition {
    id: ConditionId,
    context: BindingContext,
    condition: ConditionGroup,
    value: Value,
    order: u32,
    disposed: bool,
}

impl BindingCondition {
    /// Create a condition with an empty predicate, which never matches.
    pub fn new(context: BindingContext, id: ConditionId, order: u32) -> Self {
        let value = context.target_type().default_value();
        Self {
            id,
            context,
            condition: ConditionGroup::default(),
            value,
            order,
            disposed: false,
        }
    }

    pub fn from_entity(context: BindingContext, id: ConditionId, entity: &DataBindingConditionEntity) -> Self {
        let condition = ConditionGroup::from_entity(&context.data_models, &entity.condition);
        let value = storage::deserialize_or_default(entity.value.as_deref(), context.target_type());
        Self {
            id,
            context,
            condition,
            value,
            order: entity.order,
            disposed: false,
        }
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(BindingError::Disposed("BindingCondition"))
        } else {
            Ok(())
        }
    }

    pub fn id(&self) -> ConditionId {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn condition(&self) -> &ConditionGroup {
        &self.condition
    }

    /// Edit the predicate tree.
    pub fn condition_mut(&mut self) -> Result<&mut ConditionGroup> {
        self.check_disposed()?;
        Ok(&mut self.condition)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Set the emitted value, coerced to the property type. `None` resets it
    /// to the type's default.
    pub fn update_value(&mut self, value: Option<Value>) -> Result<()> {
        self.check_disposed()?;
        let target = self.context.target_type();
        self.value = match value {
            Some(value) => value.convert_to(target)?,
            None => target.default_value(),
        };
        Ok(())
    }

    pub fn evaluate(&self) -> Result<bool> {
        self.check_disposed()?;
        self.condition.evaluate()
    }

    pub fn save(&self) -> Result<DataBindingConditionEntity> {
        self.check_disposed()?;
        Ok(DataBindingConditionEntity {
            order: self.order,
            condition: self.condition.save()?,
            value: Some(storage::serialize_value(&self.value)?),
        })
    }

    /// Dispose the predicate tree. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.condition.dispose();
    }
}

impl Ordered for BindingCondition {
    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl fmt::Debug for BindingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingCondition")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("order", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::LayerProperty;
    use crate::datamodel::DataModelRegistry;
    use crate::modifiers::ModifierTypeRegistry;
    use crate::types::{Color, ValueType};
    use std::sync::Arc;

    fn context() -> BindingContext {
        BindingContext::new(
            LayerProperty::new("brush.color", ValueType::Color),
            Arc::new(DataModelRegistry::new()),
            Arc::new(ModifierTypeRegistry::new()),
        )
    }

    #[test]
    fn test_new_condition_never_matches() {
        let c = BindingCondition::new(context(), ConditionId(0), 1);
        assert!(!c.evaluate().unwrap());
        assert_eq!(c.value(), &Value::Color(Color::default()));
    }

    #[test]
    fn test_update_value_coerces() {
        let mut c = BindingCondition::new(context(), ConditionId(0), 1);
        c.update_value(Some(Value::from("#00FF00"))).unwrap();
        assert_eq!(c.value(), &Value::Color(Color::rgb(0, 255, 0)));
        assert!(c.update_value(Some(Value::Bool(true))).is_err());
        c.update_value(None).unwrap();
        assert_eq!(c.value(), &Value::Color(Color::default()));
    }

    #[test]
    fn test_save_round_trip() {
        let ctx = context();
        let mut c = BindingCondition::new(ctx.clone(), ConditionId(0), 3);
        c.update_value(Some(Value::Color(Color::rgb(1, 2, 3)))).unwrap();
        let entity = c.save().unwrap();
        let loaded = BindingCondition::from_entity(ctx, ConditionId(1), &entity);
        assert_eq!(loaded.value(), c.value());
        assert_eq!(loaded.order(), 3);
    }

    #[test]
    fn test_dispose_is_final() {
        let mut c = BindingCondition::new(context(), ConditionId(0), 1);
        c.dispose();
        assert!(c.evaluate().is_err());
        assert!(c.update_value(None).is_err());
        assert!(c.condition_mut().is_err());
        assert!(c.save().is_err());
        assert!(c.condition().is_disposed());
    }
}
