//! Persisted entities
//!
//! Every live binding object has a flat serde record here. Loading hydrates
//! live objects from these records and saving writes their state back.
//!
//! # Main Types
//!
//! - [`DataBindingEntity`] - One layer property's binding, including its mode
//! - [`DirectDataBindingEntity`] / [`DataBindingModifierEntity`] - Direct mode
//! - [`ConditionalDataBindingEntity`] / [`DataBindingConditionEntity`] - Conditional mode
//! - [`ConditionGroupEntity`] - A persisted predicate tree
//! - [`DataModelPathEntity`] - A (data model, path) reference
//!
//! # Typed values
//!
//! Static values are stored as a JSON string of the self-describing
//! [`Value`] (`{"type":"Int","value":5}`), so the record format does not
//! depend on the property type. [`deserialize_typed`] also accepts plain
//! JSON scalars written by older profiles.

use crate::binding::{Easing, ParameterKind};
use crate::conditions::{BooleanOperator, ConditionOperator};
use crate::error::{BindingError, Result};
use crate::id::ProviderId;
use crate::modifiers::ModifierTypeKey;
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// A reference to a property of a data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModelPathEntity {
    pub data_model_id: ProviderId,
    pub path: String,
}

/// A binding modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBindingModifierEntity {
    #[serde(default)]
    pub modifier_type: Option<ModifierTypeKey>,
    pub parameter_kind: ParameterKind,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_path: Option<DataModelPathEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_static_value: Option<String>,
}

/// Direct binding mode: a source path and a modifier chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DirectDataBindingEntity {
    #[serde(default)]
    pub source: Option<DataModelPathEntity>,
    #[serde(default)]
    pub modifiers: Vec<DataBindingModifierEntity>,
}

/// A condition of a conditional binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBindingConditionEntity {
    pub order: u32,
    #[serde(default)]
    pub condition: ConditionGroupEntity,
    #[serde(default)]
    pub value: Option<String>,
}

/// Conditional binding mode: an ordered list of conditions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionalDataBindingEntity {
    #[serde(default)]
    pub conditions: Vec<DataBindingConditionEntity>,
}

/// The persisted mode of a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DataBindingModeEntity {
    Direct(DirectDataBindingEntity),
    Conditional(ConditionalDataBindingEntity),
}

/// The binding of one layer property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBindingEntity {
    /// Path of the layer property this binding services.
    pub identifier: String,
    #[serde(default)]
    pub mode: Option<DataBindingModeEntity>,
    #[serde(default)]
    pub easing_time_ms: u64,
    #[serde(default)]
    pub easing: Easing,
}

/// A persisted predicate tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionGroupEntity {
    #[serde(default)]
    pub operator: BooleanOperator,
    #[serde(default)]
    pub children: Vec<ConditionPartEntity>,
}

/// A node of a predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "part")]
pub enum ConditionPartEntity {
    Group(ConditionGroupEntity),
    Predicate(DataModelPredicateEntity),
}

/// A comparison between a data model property and a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModelPredicateEntity {
    #[serde(default)]
    pub left: Option<DataModelPathEntity>,
    pub operator: ConditionOperator,
    pub right: PredicateRightEntity,
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "side")]
pub enum PredicateRightEntity {
    Static {
        #[serde(default)]
        value: Option<String>,
    },
    Dynamic {
        #[serde(default)]
        path: Option<DataModelPathEntity>,
    },
}

/// Serialize a value as a tagged JSON string.
pub fn serialize_value(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Deserialize a stored value and coerce it to `expected`.
///
/// Accepts the tagged representation as well as plain JSON scalars.
pub fn deserialize_typed(json: &str, expected: ValueType) -> Result<Value> {
    deserialize_value(json)?.convert_to(expected)
}

/// Deserialize a stored value without coercing it.
pub fn deserialize_value(json: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => Ok(value),
        Err(_) => from_plain_json(serde_json::from_str(json)?),
    }
}

/// Like [`deserialize_typed`], but never fails.
///
/// A missing value or a value that cannot be read is replaced with the
/// default of `expected`.
pub fn deserialize_or_default(json: Option<&str>, expected: ValueType) -> Value {
    let Some(json) = json else {
        return expected.default_value();
    };
    match deserialize_typed(json, expected) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "Failed to deserialize stored value {} as {}, using default: {}",
                json,
                expected,
                e
            );
            expected.default_value()
        }
    }
}

fn from_plain_json(json: serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        other => {
            return Err(BindingError::Serialization(format!(
                "Unsupported stored value: {}",
                other
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_typed_value_round_trip() {
        let json = serialize_value(&Value::Color(Color::rgb(1, 2, 3))).unwrap();
        assert_eq!(
            deserialize_typed(&json, ValueType::Color).unwrap(),
            Value::Color(Color::rgb(1, 2, 3))
        );
    }

    #[test]
    fn test_plain_scalars_are_accepted() {
        assert_eq!(deserialize_typed("5", ValueType::Int).unwrap(), Value::Int(5));
        assert_eq!(deserialize_typed("5", ValueType::Float).unwrap(), Value::Float(5.0));
        assert_eq!(
            deserialize_typed("\"#FF0000\"", ValueType::Color).unwrap(),
            Value::Color(Color::rgb(255, 0, 0))
        );
        assert_eq!(deserialize_typed("null", ValueType::Int).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_stored_value_is_coerced() {
        let json = serialize_value(&Value::Int(3)).unwrap();
        assert_eq!(deserialize_typed(&json, ValueType::Float).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn test_corrupt_value_falls_back_to_default() {
        assert_eq!(deserialize_or_default(Some("{not json"), ValueType::Int), Value::Int(0));
        assert_eq!(deserialize_or_default(Some("[1,2]"), ValueType::Float), Value::Float(0.0));
        assert_eq!(deserialize_or_default(Some("\"abc\""), ValueType::Int), Value::Int(0));
        assert_eq!(deserialize_or_default(None, ValueType::String), Value::Null);
    }

    #[test]
    fn test_binding_entity_json_shape() {
        let entity = DataBindingEntity {
            identifier: "brush.color".to_string(),
            mode: Some(DataBindingModeEntity::Direct(DirectDataBindingEntity::default())),
            easing_time_ms: 0,
            easing: Easing::Linear,
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["mode"]["kind"], "Direct");
        let back: DataBindingEntity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }
}
