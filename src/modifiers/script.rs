//! Rhai expression modifiers
//!
//! A script modifier evaluates a user expression with two variables in scope:
//!
//! - `value` - the current value as a float
//! - `param` - the modifier parameter as a float (`0.0` when absent)
//!
//! The script is compiled once when the modifier type is created. Evaluation
//! errors fall back to the current value.
//!
//! ```rhai
//! // Map a 0-100 percentage onto a 0-255 brightness
//! value * 2.55 + param
//! ```

use crate::error::{BindingError, Result, ResultExt};
use crate::modifiers::{ModifierType, TypePart};
use crate::types::{Value, ValueType};
use rhai::{Dynamic, Engine, Scope, AST};

/// A modifier type backed by a compiled Rhai expression.
pub struct ScriptModifier {
    name: String,
    source: String,
    engine: Engine,
    ast: AST,
}

impl ScriptModifier {
    /// Compile `source` into a modifier type called `name`.
    pub fn compile(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();
        let mut engine = Engine::new();
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(10_000);

        let ast = engine
            .compile(&source)
            .map_err(|e| BindingError::Script(format!("Failed to compile '{}': {}", name, e)))?;

        Ok(Self {
            name,
            source,
            engine,
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn evaluate(&self, value: f64, param: f64) -> Result<f64> {
        let mut scope = Scope::new();
        scope.push("value", value);
        scope.push("param", param);

        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .with_context(|| format!("Evaluating script '{}'", self.name))?;

        if let Ok(v) = result.as_float() {
            Ok(v)
        } else if let Ok(v) = result.as_int() {
            Ok(v as f64)
        } else {
            Err(BindingError::Script(format!(
                "Script '{}' returned {}, expected a number",
                self.name,
                result.type_name()
            )))
        }
    }
}

impl ModifierType for ScriptModifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "User-defined expression"
    }

    fn category(&self) -> Option<&str> {
        Some("Script")
    }

    fn parameter_type(&self) -> Option<ValueType> {
        Some(ValueType::Float)
    }

    fn supports_type(&self, ty: ValueType, _part: TypePart) -> bool {
        ty.is_numeric()
    }

    fn apply(&self, current: &Value, parameter: Option<&Value>) -> Value {
        let Some(value) = current.as_f64() else {
            return current.clone();
        };
        let param = parameter.and_then(Value::as_f64).unwrap_or(0.0);

        match self.evaluate(value, param) {
            Ok(result) => {
                let target = current.value_type().unwrap_or(ValueType::Float);
                Value::Float(result)
                    .convert_to(target)
                    .unwrap_or_else(|_| current.clone())
            }
            Err(e) => {
                tracing::trace!("Script modifier '{}' failed: {}", self.name, e);
                current.clone()
            }
        }
    }
}

impl std::fmt::Debug for ScriptModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptModifier")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}
