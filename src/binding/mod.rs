//! Data bindings for layer properties
//!
//! A [`DataBinding`] services one layer property. Once per frame the render
//! loop calls [`DataBinding::resolve`] with the property's static base value
//! and receives the effective value for that frame.
//!
//! # Architecture
//!
//! ```text
//! DataBinding ──► BindingMode::Direct ──► DataModelPath ──► modifiers ──► ValueConverter
//!             └─► BindingMode::Conditional ──► conditions (first match wins)
//! ```
//!
//! # Components
//!
//! - [`DataBinding`] - Owns at most one mode plus optional easing between values
//! - [`DirectBinding`] - Live source value piped through [`BindingModifier`]s
//! - [`ConditionalBinding`] - Ordered [`BindingCondition`]s, each with a value
//! - [`BindingContext`] - The serviced property, converter and registries
//! - [`ValueConverter`] - Converts the final value to the property type
//!
//! # Threading
//!
//! Nothing in here locks on behalf of the caller. Configuration calls and
//! `resolve` must be serialized by whoever owns the profile.

pub mod condition;
pub mod conditional;
pub mod direct;
pub mod modifier;
pub mod ordering;

pub use condition::BindingCondition;
pub use conditional::ConditionalBinding;
pub use direct::DirectBinding;
pub use modifier::{BindingModifier, ParameterKind};
pub use ordering::Ordered;

use crate::datamodel::DataModelRegistry;
use crate::error::{BindingError, Result};
use crate::modifiers::ModifierTypeRegistry;
use crate::storage::{DataBindingEntity, DataBindingModeEntity};
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The layer property a binding services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerProperty {
    /// Dotted path of the property within its layer, e.g. `brush.color`
    pub path: String,
    pub value_type: ValueType,
}

impl LayerProperty {
    pub fn new(path: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            path: path.into(),
            value_type,
        }
    }
}

/// Converts a resolved value to the property type.
#[cfg_attr(test, mockall::automock)]
pub trait ValueConverter: Send + Sync {
    fn convert(&self, value: &Value, target: ValueType) -> Result<Value>;
}

/// Default converter, uses [`Value::convert_to`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CoercingConverter;

impl ValueConverter for CoercingConverter {
    fn convert(&self, value: &Value, target: ValueType) -> Result<Value> {
        value.convert_to(target)
    }
}

/// Everything a binding and its children need from the outside world.
#[derive(Clone)]
pub struct BindingContext {
    pub property: LayerProperty,
    pub converter: Arc<dyn ValueConverter>,
    pub data_models: Arc<DataModelRegistry>,
    pub modifier_types: Arc<ModifierTypeRegistry>,
}

impl BindingContext {
    pub fn new(
        property: LayerProperty,
        data_models: Arc<DataModelRegistry>,
        modifier_types: Arc<ModifierTypeRegistry>,
    ) -> Self {
        Self {
            property,
            converter: Arc::new(CoercingConverter),
            data_models,
            modifier_types,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Type of the serviced property.
    pub fn target_type(&self) -> ValueType {
        self.property.value_type
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

/// Easing curve applied while transitioning between resolved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub const ALL: [Easing; 4] = [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut];

    /// Map linear progress `t` in 0..=1 onto the curve (quadratic).
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => write!(f, "Linear"),
            Easing::EaseIn => write!(f, "Ease In"),
            Easing::EaseOut => write!(f, "Ease Out"),
            Easing::EaseInOut => write!(f, "Ease In/Out"),
        }
    }
}

/// Which mode a binding runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingModeKind {
    Direct,
    Conditional,
}

/// The active mode of a [`DataBinding`].
pub enum BindingMode {
    Direct(DirectBinding),
    Conditional(ConditionalBinding),
}

impl BindingMode {
    fn new(kind: BindingModeKind, context: BindingContext) -> Self {
        match kind {
            BindingModeKind::Direct => BindingMode::Direct(DirectBinding::new(context)),
            BindingModeKind::Conditional => BindingMode::Conditional(ConditionalBinding::new(context)),
        }
    }

    fn from_entity(context: BindingContext, entity: &DataBindingModeEntity) -> Self {
        match entity {
            DataBindingModeEntity::Direct(e) => BindingMode::Direct(DirectBinding::from_entity(context, e)),
            DataBindingModeEntity::Conditional(e) => {
                BindingMode::Conditional(ConditionalBinding::from_entity(context, e))
            }
        }
    }

    pub fn kind(&self) -> BindingModeKind {
        match self {
            BindingMode::Direct(_) => BindingModeKind::Direct,
            BindingMode::Conditional(_) => BindingModeKind::Conditional,
        }
    }

    pub fn resolve(&self, base: &Value) -> Result<Value> {
        match self {
            BindingMode::Direct(direct) => direct.resolve(base),
            BindingMode::Conditional(conditional) => conditional.resolve(base),
        }
    }

    pub fn save(&self) -> Result<DataBindingModeEntity> {
        Ok(match self {
            BindingMode::Direct(direct) => DataBindingModeEntity::Direct(direct.save()?),
            BindingMode::Conditional(conditional) => DataBindingModeEntity::Conditional(conditional.save()?),
        })
    }

    pub fn dispose(&mut self) {
        match self {
            BindingMode::Direct(direct) => direct.dispose(),
            BindingMode::Conditional(conditional) => conditional.dispose(),
        }
    }
}

#[derive(Debug, Clone)]
struct Transition {
    from: Value,
    to: Value,
    elapsed: Duration,
}

impl Transition {
    fn progress(&self, easing_time: Duration) -> f64 {
        self.elapsed.as_secs_f64() / easing_time.as_secs_f64()
    }

    fn value(&self, easing: Easing, easing_time: Duration) -> Value {
        Value::interpolate(&self.from, &self.to, easing.apply(self.progress(easing_time)))
    }
}

/// Binding of one layer property.
pub struct DataBinding {
    context: BindingContext,
    mode: Option<BindingMode>,
    easing_time: Duration,
    easing: Easing,
    transition: Option<Transition>,
    displayed: Option<Value>,
    disposed: bool,
}

impl DataBinding {
    /// Create an unbound binding. Until a mode is set `resolve` returns the
    /// base value.
    pub fn new(context: BindingContext) -> Self {
        Self {
            context,
            mode: None,
            easing_time: Duration::ZERO,
            easing: Easing::default(),
            transition: None,
            displayed: None,
            disposed: false,
        }
    }

    pub fn from_entity(context: BindingContext, entity: &DataBindingEntity) -> Self {
        if entity.identifier != context.property.path {
            tracing::warn!(
                "Loading binding for '{}' onto property '{}'",
                entity.identifier,
                context.property.path
            );
        }
        let mut binding = Self::new(context);
        binding.mode = entity
            .mode
            .as_ref()
            .map(|mode| BindingMode::from_entity(binding.context.clone(), mode));
        binding.easing_time = Duration::from_millis(entity.easing_time_ms);
        binding.easing = entity.easing;
        binding
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(BindingError::Disposed("DataBinding"))
        } else {
            Ok(())
        }
    }

    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    pub fn property(&self) -> &LayerProperty {
        &self.context.property
    }

    pub fn mode(&self) -> Option<&BindingMode> {
        self.mode.as_ref()
    }

    pub fn mode_kind(&self) -> Option<BindingModeKind> {
        self.mode.as_ref().map(BindingMode::kind)
    }

    pub fn direct(&self) -> Option<&DirectBinding> {
        match &self.mode {
            Some(BindingMode::Direct(direct)) => Some(direct),
            _ => None,
        }
    }

    pub fn direct_mut(&mut self) -> Option<&mut DirectBinding> {
        match &mut self.mode {
            Some(BindingMode::Direct(direct)) => Some(direct),
            _ => None,
        }
    }

    pub fn conditional(&self) -> Option<&ConditionalBinding> {
        match &self.mode {
            Some(BindingMode::Conditional(conditional)) => Some(conditional),
            _ => None,
        }
    }

    pub fn conditional_mut(&mut self) -> Option<&mut ConditionalBinding> {
        match &mut self.mode {
            Some(BindingMode::Conditional(conditional)) => Some(conditional),
            _ => None,
        }
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn easing_time(&self) -> Duration {
        self.easing_time
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Switch to `kind`, disposing the previous mode. Switching to the
    /// current kind keeps the existing mode.
    pub fn change_mode(&mut self, kind: Option<BindingModeKind>) -> Result<()> {
        self.check_disposed()?;
        if self.mode_kind() == kind {
            return Ok(());
        }
        if let Some(mut previous) = self.mode.take() {
            previous.dispose();
        }
        self.mode = kind.map(|kind| BindingMode::new(kind, self.context.clone()));
        self.transition = None;
        tracing::debug!("Binding for '{}' changed mode to {:?}", self.context.property.path, kind);
        Ok(())
    }

    pub fn set_easing(&mut self, easing_time: Duration, easing: Easing) -> Result<()> {
        self.check_disposed()?;
        self.easing_time = easing_time;
        self.easing = easing;
        if easing_time.is_zero() {
            self.transition = None;
        }
        Ok(())
    }

    /// Advance an active easing transition.
    pub fn update(&mut self, delta: Duration) -> Result<()> {
        self.check_disposed()?;
        if let Some(transition) = &mut self.transition {
            transition.elapsed = (transition.elapsed + delta).min(self.easing_time);
        }
        Ok(())
    }

    /// Compute the value of the property for this frame.
    pub fn resolve(&mut self, base: &Value) -> Result<Value> {
        self.check_disposed()?;
        let target = match &self.mode {
            Some(mode) => mode.resolve(base)?,
            None => base.clone(),
        };

        if self.easing_time.is_zero() {
            self.displayed = Some(target.clone());
            return Ok(target);
        }

        let Some(displayed) = self.displayed.take() else {
            self.displayed = Some(target.clone());
            return Ok(target);
        };

        // A new target eases from wherever the running transition has got to
        let current = match &self.transition {
            Some(transition) => transition.value(self.easing, self.easing_time),
            None => displayed,
        };
        let retarget = match &self.transition {
            Some(transition) => transition.to != target,
            None => current != target,
        };
        if retarget {
            self.transition = Some(Transition {
                from: current.clone(),
                to: target.clone(),
                elapsed: Duration::ZERO,
            });
        }

        let finished = self
            .transition
            .as_ref()
            .map_or(true, |transition| transition.progress(self.easing_time) >= 1.0);
        let value = if finished {
            self.transition = None;
            target
        } else {
            current
        };
        self.displayed = Some(value.clone());
        Ok(value)
    }

    pub fn save(&self) -> Result<DataBindingEntity> {
        self.check_disposed()?;
        Ok(DataBindingEntity {
            identifier: self.context.property.path.clone(),
            mode: self.mode.as_ref().map(BindingMode::save).transpose()?,
            easing_time_ms: self.easing_time.as_millis() as u64,
            easing: self.easing,
        })
    }

    /// Dispose the active mode. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(mode) = &mut self.mode {
            mode.dispose();
        }
    }
}

impl Drop for DataBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DataBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBinding")
            .field("property", &self.context.property)
            .field("mode", &self.mode_kind())
            .field("easing_time", &self.easing_time)
            .field("easing", &self.easing)
            .finish()
    }
}
