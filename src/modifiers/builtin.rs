//! Built-in modifier types
//!
//! Numeric modifiers operate on Int and Float values and keep the type of the
//! value they modify: an Int stays an Int, rounded half away from zero.
//! Operations that would divide by zero return the current value unchanged.
//!
//! | Name | Parameter | Result |
//! |------|-----------|--------|
//! | Add, Subtract, Multiply, Divide | Float | `value op param` |
//! | PercentageOf | Float | `value / param * 100` |
//! | Modulo | Float | `value % param` |
//! | Min, Max | Float | smaller / larger of the two |
//! | Absolute, Floor, Ceiling, Round | - | rounding and sign |
//! | Sine, Cosine, SquareRoot | - | trigonometry |
//! | Brighten, Darken | Float (percent) | scales a color's RGB channels |

use crate::id::ProviderId;
use crate::modifiers::{ModifierType, ModifierTypeRegistry, TypePart};
use crate::types::{Value, ValueType};
use std::sync::Arc;

/// The operation a [`BuiltinModifier`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    PercentageOf,
    Modulo,
    Min,
    Max,
    Absolute,
    Floor,
    Ceiling,
    Round,
    Sine,
    Cosine,
    SquareRoot,
    Brighten,
    Darken,
}

impl BuiltinOp {
    pub const ALL: [BuiltinOp; 17] = [
        BuiltinOp::Add,
        BuiltinOp::Subtract,
        BuiltinOp::Multiply,
        BuiltinOp::Divide,
        BuiltinOp::PercentageOf,
        BuiltinOp::Modulo,
        BuiltinOp::Min,
        BuiltinOp::Max,
        BuiltinOp::Absolute,
        BuiltinOp::Floor,
        BuiltinOp::Ceiling,
        BuiltinOp::Round,
        BuiltinOp::Sine,
        BuiltinOp::Cosine,
        BuiltinOp::SquareRoot,
        BuiltinOp::Brighten,
        BuiltinOp::Darken,
    ];

    fn name(&self) -> &'static str {
        match self {
            BuiltinOp::Add => "Add",
            BuiltinOp::Subtract => "Subtract",
            BuiltinOp::Multiply => "Multiply",
            BuiltinOp::Divide => "Divide",
            BuiltinOp::PercentageOf => "PercentageOf",
            BuiltinOp::Modulo => "Modulo",
            BuiltinOp::Min => "Min",
            BuiltinOp::Max => "Max",
            BuiltinOp::Absolute => "Absolute",
            BuiltinOp::Floor => "Floor",
            BuiltinOp::Ceiling => "Ceiling",
            BuiltinOp::Round => "Round",
            BuiltinOp::Sine => "Sine",
            BuiltinOp::Cosine => "Cosine",
            BuiltinOp::SquareRoot => "SquareRoot",
            BuiltinOp::Brighten => "Brighten",
            BuiltinOp::Darken => "Darken",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            BuiltinOp::Add => "Adds the parameter to the value",
            BuiltinOp::Subtract => "Subtracts the parameter from the value",
            BuiltinOp::Multiply => "Multiplies the value by the parameter",
            BuiltinOp::Divide => "Divides the value by the parameter",
            BuiltinOp::PercentageOf => "Expresses the value as a percentage of the parameter",
            BuiltinOp::Modulo => "Remainder of dividing the value by the parameter",
            BuiltinOp::Min => "Keeps the smaller of the value and the parameter",
            BuiltinOp::Max => "Keeps the larger of the value and the parameter",
            BuiltinOp::Absolute => "Removes the sign of the value",
            BuiltinOp::Floor => "Rounds the value down",
            BuiltinOp::Ceiling => "Rounds the value up",
            BuiltinOp::Round => "Rounds the value to the nearest whole number",
            BuiltinOp::Sine => "Sine of the value in radians",
            BuiltinOp::Cosine => "Cosine of the value in radians",
            BuiltinOp::SquareRoot => "Square root of the value",
            BuiltinOp::Brighten => "Brightens the color by a percentage",
            BuiltinOp::Darken => "Darkens the color by a percentage",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            BuiltinOp::Add
            | BuiltinOp::Subtract
            | BuiltinOp::Multiply
            | BuiltinOp::Divide
            | BuiltinOp::PercentageOf
            | BuiltinOp::Modulo => "Calculation",
            BuiltinOp::Min | BuiltinOp::Max | BuiltinOp::Absolute => "Comparison",
            BuiltinOp::Floor | BuiltinOp::Ceiling | BuiltinOp::Round => "Rounding",
            BuiltinOp::Sine | BuiltinOp::Cosine | BuiltinOp::SquareRoot => "Advanced",
            BuiltinOp::Brighten | BuiltinOp::Darken => "Color",
        }
    }

    fn is_color(&self) -> bool {
        matches!(self, BuiltinOp::Brighten | BuiltinOp::Darken)
    }

    fn takes_parameter(&self) -> bool {
        !matches!(
            self,
            BuiltinOp::Absolute
                | BuiltinOp::Floor
                | BuiltinOp::Ceiling
                | BuiltinOp::Round
                | BuiltinOp::Sine
                | BuiltinOp::Cosine
                | BuiltinOp::SquareRoot
        )
    }

    /// Numeric evaluation. `None` means the value is left unchanged.
    fn eval(&self, v: f64, p: f64) -> Option<f64> {
        match self {
            BuiltinOp::Add => Some(v + p),
            BuiltinOp::Subtract => Some(v - p),
            BuiltinOp::Multiply => Some(v * p),
            BuiltinOp::Divide if p == 0.0 => None,
            BuiltinOp::Divide => Some(v / p),
            BuiltinOp::PercentageOf if p == 0.0 => None,
            BuiltinOp::PercentageOf => Some(v / p * 100.0),
            BuiltinOp::Modulo if p == 0.0 => None,
            BuiltinOp::Modulo => Some(v % p),
            BuiltinOp::Min => Some(v.min(p)),
            BuiltinOp::Max => Some(v.max(p)),
            BuiltinOp::Absolute => Some(v.abs()),
            BuiltinOp::Floor => Some(v.floor()),
            BuiltinOp::Ceiling => Some(v.ceil()),
            BuiltinOp::Round => Some(v.round()),
            BuiltinOp::Sine => Some(v.sin()),
            BuiltinOp::Cosine => Some(v.cos()),
            BuiltinOp::SquareRoot if v < 0.0 => None,
            BuiltinOp::SquareRoot => Some(v.sqrt()),
            BuiltinOp::Brighten | BuiltinOp::Darken => None,
        }
    }
}

/// A modifier type implemented in Rust.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinModifier {
    op: BuiltinOp,
}

impl BuiltinModifier {
    pub fn new(op: BuiltinOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> BuiltinOp {
        self.op
    }
}

impl ModifierType for BuiltinModifier {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn category(&self) -> Option<&str> {
        Some(self.op.category())
    }

    fn parameter_type(&self) -> Option<ValueType> {
        self.op.takes_parameter().then_some(ValueType::Float)
    }

    fn supports_type(&self, ty: ValueType, part: TypePart) -> bool {
        match part {
            TypePart::Value if self.op.is_color() => ty == ValueType::Color,
            TypePart::Value => ty.is_numeric(),
            TypePart::Parameter => self.op.takes_parameter() && ty.is_numeric(),
        }
    }

    fn apply(&self, current: &Value, parameter: Option<&Value>) -> Value {
        let param = parameter.and_then(Value::as_f64);
        if self.op.takes_parameter() && param.is_none() {
            return current.clone();
        }
        let p = param.unwrap_or_default();

        match current {
            Value::Color(color) => {
                let factor = match self.op {
                    BuiltinOp::Brighten => 1.0 + p / 100.0,
                    BuiltinOp::Darken => 1.0 - p / 100.0,
                    _ => return current.clone(),
                };
                Value::Color(color.scaled(factor.max(0.0)))
            }
            Value::Int(v) => match self.op.eval(*v as f64, p) {
                Some(r) if r.is_finite() => Value::Float(r)
                    .convert_to(ValueType::Int)
                    .unwrap_or_else(|_| current.clone()),
                _ => current.clone(),
            },
            Value::Float(v) => match self.op.eval(*v, p) {
                Some(r) => Value::Float(r),
                None => current.clone(),
            },
            _ => current.clone(),
        }
    }
}

/// Register every built-in modifier type under [`ProviderId::BUILTIN`].
///
/// Returns the number of types registered.
pub fn register_builtins(registry: &ModifierTypeRegistry) -> usize {
    for op in BuiltinOp::ALL {
        registry.register(ProviderId::BUILTIN, Arc::new(BuiltinModifier::new(op)));
    }
    BuiltinOp::ALL.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn apply(op: BuiltinOp, current: Value, param: f64) -> Value {
        BuiltinModifier::new(op).apply(&current, Some(&Value::Float(param)))
    }

    #[test]
    fn test_arithmetic_keeps_int() {
        assert_eq!(apply(BuiltinOp::Add, Value::Int(10), 5.0), Value::Int(15));
        assert_eq!(apply(BuiltinOp::Multiply, Value::Int(15), 2.0), Value::Int(30));
        assert_eq!(apply(BuiltinOp::Divide, Value::Int(5), 2.0), Value::Int(3));
        assert_eq!(apply(BuiltinOp::Subtract, Value::Float(1.5), 0.5), Value::Float(1.0));
    }

    #[test]
    fn test_division_by_zero_passes_through() {
        assert_eq!(apply(BuiltinOp::Divide, Value::Int(5), 0.0), Value::Int(5));
        assert_eq!(apply(BuiltinOp::Modulo, Value::Float(5.0), 0.0), Value::Float(5.0));
        assert_eq!(apply(BuiltinOp::PercentageOf, Value::Float(5.0), 0.0), Value::Float(5.0));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(apply(BuiltinOp::PercentageOf, Value::Float(25.0), 50.0), Value::Float(50.0));
    }

    #[test]
    fn test_parameterless() {
        let abs = BuiltinModifier::new(BuiltinOp::Absolute);
        assert_eq!(abs.parameter_type(), None);
        assert_eq!(abs.apply(&Value::Float(-2.0), None), Value::Float(2.0));
        let floor = BuiltinModifier::new(BuiltinOp::Floor);
        assert_eq!(floor.apply(&Value::Float(2.7), None), Value::Float(2.0));
        let sqrt = BuiltinModifier::new(BuiltinOp::SquareRoot);
        assert_eq!(sqrt.apply(&Value::Float(-4.0), None), Value::Float(-4.0));
    }

    #[test]
    fn test_missing_parameter_passes_through() {
        let add = BuiltinModifier::new(BuiltinOp::Add);
        assert_eq!(add.apply(&Value::Int(3), None), Value::Int(3));
        assert_eq!(add.apply(&Value::from("x"), Some(&Value::Float(1.0))), Value::from("x"));
    }

    #[test]
    fn test_color_modifiers() {
        let c = Value::Color(Color::rgb(100, 100, 100));
        assert_eq!(apply(BuiltinOp::Brighten, c.clone(), 50.0), Value::Color(Color::rgb(150, 150, 150)));
        assert_eq!(apply(BuiltinOp::Darken, c, 150.0), Value::Color(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn test_supports_type() {
        let add = BuiltinModifier::new(BuiltinOp::Add);
        assert!(add.supports_type(ValueType::Int, TypePart::Value));
        assert!(!add.supports_type(ValueType::String, TypePart::Value));
        assert!(add.supports_type(ValueType::Int, TypePart::Parameter));
        let brighten = BuiltinModifier::new(BuiltinOp::Brighten);
        assert!(brighten.supports_type(ValueType::Color, TypePart::Value));
        assert!(!brighten.supports_type(ValueType::Float, TypePart::Value));
        assert!(!BuiltinModifier::new(BuiltinOp::Round).supports_type(ValueType::Float, TypePart::Parameter));
    }
}
