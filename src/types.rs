//! Core value types for lumenbind
//!
//! This module contains the dynamic value model shared by data models, layer
//! properties, modifier parameters and condition values.
//!
//! # Main Types
//!
//! - [`ValueType`] - The kind of a value (bool, int, float, string, color, list, struct)
//! - [`Value`] - A self-describing runtime value
//! - [`Color`] - An ARGB color as used by lighting layers
//!
//! # Value and reference types
//!
//! Bool, Int, Float and Color are *value types*: their default is a concrete
//! zero value. String, List and Struct are *reference types*: their default is
//! [`Value::Null`].
//!
//! # Coercion
//!
//! [`Value::convert_to`] implements the coercion policy used when a static
//! value is assigned to a typed slot and when a binding converts its result to
//! the layer property type. Conversions that are impossible fail with
//! [`BindingError::Conversion`].

use crate::error::{BindingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a value flowing through a data binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean value
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// UTF-8 text
    String,
    /// ARGB color
    Color,
    /// Sequence of values (not readable through direct accessors)
    List,
    /// Nested structure with named fields
    Struct,
}

impl ValueType {
    /// Returns true if values of this type have a non-null default
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::Color
        )
    }

    /// Returns true for Int and Float
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    /// The default value for this type: zero for value types, null otherwise
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Color => Value::Color(Color::default()),
            ValueType::String | ValueType::List | ValueType::Struct => Value::Null,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "Bool"),
            ValueType::Int => write!(f, "Int"),
            ValueType::Float => write!(f, "Float"),
            ValueType::String => write!(f, "String"),
            ValueType::Color => write!(f, "Color"),
            ValueType::List => write!(f, "List"),
            ValueType::Struct => write!(f, "Struct"),
        }
    }
}

/// An ARGB color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    /// Create a color with explicit alpha
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Pack into 0xAARRGGBB
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Unpack from 0xAARRGGBB
    pub fn from_u32(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self { a, r, g, b }
    }

    /// Parse `#RRGGBB` or `#AARRGGBB` (the leading `#` is optional)
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        let packed = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(Self::from_u32(0xFF00_0000 | packed)),
            8 => Some(Self::from_u32(packed)),
            _ => None,
        }
    }

    /// Scale the RGB channels by `factor`, keeping alpha
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self {
            a: self.a,
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }

    /// Per-channel linear interpolation
    pub fn lerp(self, to: Color, t: f64) -> Self {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Self {
            a: mix(self.a, to.a),
            r: mix(self.r, to.r),
            g: mix(self.g, to.g),
            b: mix(self.b, to.b),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.to_u32())
    }
}

/// A self-describing runtime value
///
/// Serializes as a tagged object (`{"type":"Int","value":5}`) so arbitrary
/// property types round-trip through persisted entities without a fixed schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Absence of a value (default for reference types)
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Color(Color),
    List(Vec<Value>),
    /// Fields in schema order
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// The type of this value, `None` for [`Value::Null`]
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Color(_) => ValueType::Color,
            Value::List(_) => ValueType::List,
            Value::Struct(_) => ValueType::Struct,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of Int and Float values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a field of a struct value by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Convert this value to `target`
    ///
    /// Identity when the type already matches; null becomes the target's
    /// default; otherwise a best-effort conversion between primitives.
    pub fn convert_to(&self, target: ValueType) -> Result<Value> {
        let Some(source) = self.value_type() else {
            return Ok(target.default_value());
        };
        if source == target {
            return Ok(self.clone());
        }

        let fail = || BindingError::Conversion {
            from: source,
            to: target,
        };

        let converted = match (self, target) {
            (Value::Int(v), ValueType::Float) => Value::Float(*v as f64),
            (Value::Float(v), ValueType::Int) => Value::Int(float_to_int(*v).ok_or_else(fail)?),
            (Value::Bool(v), ValueType::Int) => Value::Int(i64::from(*v)),
            (Value::Bool(v), ValueType::Float) => Value::Float(if *v { 1.0 } else { 0.0 }),
            (Value::Int(v), ValueType::Bool) => Value::Bool(*v != 0),
            (Value::Float(v), ValueType::Bool) => Value::Bool(*v != 0.0),
            (Value::Int(v), ValueType::Color) => {
                Value::Color(Color::from_u32(u32::try_from(*v).map_err(|_| fail())?))
            }
            (Value::Color(c), ValueType::Int) => Value::Int(i64::from(c.to_u32())),
            (Value::String(s), ValueType::Int) => {
                Value::Int(s.trim().parse::<i64>().map_err(|_| fail())?)
            }
            (Value::String(s), ValueType::Float) => {
                Value::Float(s.trim().parse::<f64>().map_err(|_| fail())?)
            }
            (Value::String(s), ValueType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(fail()),
            },
            (Value::String(s), ValueType::Color) => {
                Value::Color(Color::parse_hex(s).ok_or_else(fail)?)
            }
            (Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Color(_), ValueType::String) => {
                Value::String(self.to_string())
            }
            _ => return Err(fail()),
        };

        Ok(converted)
    }

    /// Interpolate between two values of the same type
    ///
    /// Int, Float and Color blend; every other combination snaps to `to`
    /// once `t` reaches 1 and holds `from` before that.
    pub fn interpolate(from: &Value, to: &Value, t: f64) -> Value {
        let t = t.clamp(0.0, 1.0);
        match (from, to) {
            (Value::Int(a), Value::Int(b)) => {
                let span = (i128::from(*b) - i128::from(*a)) as f64;
                let value = i128::from(*a) + (span * t).round() as i128;
                Value::Int(value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
            }
            (Value::Float(a), Value::Float(b)) => Value::Float(a + (b - a) * t),
            (Value::Color(a), Value::Color(b)) => Value::Color(a.lerp(*b, t)),
            _ if t >= 1.0 => to.clone(),
            _ => from.clone(),
        }
    }
}

fn float_to_int(v: f64) -> Option<i64> {
    let rounded = v.round();
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Color(v) => write!(f, "{}", v),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Struct(fields) => write!(f, "{{{} fields}}", fields.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Value::Color(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(ValueType::Int.default_value(), Value::Int(0));
        assert_eq!(ValueType::Float.default_value(), Value::Float(0.0));
        assert_eq!(ValueType::Bool.default_value(), Value::Bool(false));
        assert_eq!(ValueType::Color.default_value(), Value::Color(Color::default()));
        assert_eq!(ValueType::String.default_value(), Value::Null);
        assert_eq!(ValueType::Struct.default_value(), Value::Null);
    }

    #[test]
    fn test_convert_identity() {
        let v = Value::Int(5);
        assert_eq!(v.convert_to(ValueType::Int).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_convert_numeric() {
        assert_eq!(Value::Int(5).convert_to(ValueType::Float).unwrap(), Value::Float(5.0));
        assert_eq!(Value::Float(2.5).convert_to(ValueType::Int).unwrap(), Value::Int(3));
        assert_eq!(Value::Float(-2.5).convert_to(ValueType::Int).unwrap(), Value::Int(-3));
        assert!(Value::Float(f64::NAN).convert_to(ValueType::Int).is_err());
    }

    #[test]
    fn test_convert_strings() {
        assert_eq!(Value::from("42").convert_to(ValueType::Int).unwrap(), Value::Int(42));
        assert_eq!(
            Value::from("True").convert_to(ValueType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Value::Int(7).convert_to(ValueType::String).unwrap(),
            Value::from("7")
        );
        let err = Value::from("abc").convert_to(ValueType::Int).unwrap_err();
        assert!(matches!(
            err,
            BindingError::Conversion {
                from: ValueType::String,
                to: ValueType::Int
            }
        ));
    }

    #[test]
    fn test_convert_null_gives_default() {
        assert_eq!(Value::Null.convert_to(ValueType::Float).unwrap(), Value::Float(0.0));
        assert_eq!(Value::Null.convert_to(ValueType::String).unwrap(), Value::Null);
    }

    #[test]
    fn test_convert_list_to_int_fails() {
        assert!(Value::List(vec![]).convert_to(ValueType::Int).is_err());
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::parse_hex("#FF0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse_hex("80FF0000"), Some(Color::argb(0x80, 255, 0, 0)));
        assert_eq!(Color::parse_hex("#FFF"), None);
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "#FF010203");
        let c = Color::argb(1, 2, 3, 4);
        assert_eq!(Color::from_u32(c.to_u32()), c);
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(
            Value::interpolate(&Value::Int(0), &Value::Int(10), 0.5),
            Value::Int(5)
        );
        assert_eq!(
            Value::interpolate(&Value::Float(0.0), &Value::Float(1.0), 0.25),
            Value::Float(0.25)
        );
        assert_eq!(
            Value::interpolate(&Value::from("a"), &Value::from("b"), 0.5),
            Value::from("a")
        );
        assert_eq!(
            Value::interpolate(&Value::from("a"), &Value::from("b"), 1.0),
            Value::from("b")
        );
    }

    #[test]
    fn test_interpolate_int_extremes() {
        let (min, max) = (Value::Int(i64::MIN), Value::Int(i64::MAX));
        assert_eq!(Value::interpolate(&min, &max, 0.0), min);
        assert_eq!(Value::interpolate(&min, &max, 0.5), Value::Int(0));
        assert_eq!(Value::interpolate(&min, &max, 1.0), max);
        assert_eq!(Value::interpolate(&max, &min, 1.0), min);
    }

    #[test]
    fn test_tagged_serialization() {
        let json = serde_json::to_string(&Value::Int(5)).unwrap();
        assert_eq!(json, r#"{"type":"Int","value":5}"#);
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Value::Int(5));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_int_float_int_is_lossless(v in -1_000_000_000i64..1_000_000_000) {
            let f = Value::Int(v).convert_to(ValueType::Float).unwrap();
            prop_assert_eq!(f.convert_to(ValueType::Int).unwrap(), Value::Int(v));
        }

        #[test]
        fn test_convert_never_panics(v in any::<f64>()) {
            for target in [ValueType::Bool, ValueType::Int, ValueType::String, ValueType::Color] {
                let _ = Value::Float(v).convert_to(target);
            }
        }
    }
}
