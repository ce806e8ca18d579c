//! Mock construction helpers

use lumenbind::binding::ValueConverter;
use lumenbind::modifiers::{ModifierType, TypePart};
use lumenbind::types::{Value, ValueType};
use lumenbind::{BindingError, Result};

/// A plugin modifier type that negates numbers
pub struct NegateModifier;

impl ModifierType for NegateModifier {
    fn name(&self) -> &str {
        "Negate"
    }

    fn parameter_type(&self) -> Option<ValueType> {
        None
    }

    fn supports_type(&self, ty: ValueType, part: TypePart) -> bool {
        part == TypePart::Value && ty.is_numeric()
    }

    fn apply(&self, current: &Value, _parameter: Option<&Value>) -> Value {
        match current {
            Value::Int(v) => Value::Int(-v),
            Value::Float(v) => Value::Float(-v),
            other => other.clone(),
        }
    }
}

/// A converter that refuses everything
pub struct RejectingConverter;

impl ValueConverter for RejectingConverter {
    fn convert(&self, value: &Value, target: ValueType) -> Result<Value> {
        Err(BindingError::Conversion {
            from: value.value_type().unwrap_or(target),
            to: target,
        })
    }
}
