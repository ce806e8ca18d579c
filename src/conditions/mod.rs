//! Boolean predicate trees
//!
//! A [`ConditionGroup`] combines predicates over data model properties with a
//! boolean operator. Conditional bindings own one group per condition and
//! evaluate it every frame; nothing is cached between evaluations.
//!
//! # Main Types
//!
//! - [`ConditionGroup`] - A group of parts combined with a [`BooleanOperator`]
//! - [`ConditionPart`] - A nested group or a predicate
//! - [`DataModelPredicate`] - Compares a data model property with a static
//!   value or with another property
//!
//! # Evaluation
//!
//! - An empty group is false, so an unconfigured condition never matches.
//! - A group with a single part evaluates to that part, whatever its operator.
//! - A predicate whose left-hand path is not bound is false.

use crate::datamodel::{DataModelPath, DataModelRegistry};
use crate::error::{BindingError, Result};
use crate::storage::{
    self, ConditionGroupEntity, ConditionPartEntity, DataModelPredicateEntity,
    PredicateRightEntity,
};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// How the parts of a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BooleanOperator {
    /// All parts are true
    #[default]
    And,
    /// Any part is true
    Or,
    /// All parts are false
    AndNot,
    /// Any part is false
    OrNot,
}

/// Comparison performed by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Case-insensitive substring match
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl ConditionOperator {
    /// Operators that ignore the right-hand side.
    pub fn is_unary(&self) -> bool {
        matches!(self, ConditionOperator::IsNull | ConditionOperator::IsNotNull)
    }

    fn compare(&self, left: &Value, right: &Value) -> bool {
        match self {
            ConditionOperator::Equal => values_equal(left, right),
            ConditionOperator::NotEqual => !values_equal(left, right),
            ConditionOperator::LessThan => numeric_cmp(left, right) == Some(Ordering::Less),
            ConditionOperator::LessThanOrEqual => matches!(
                numeric_cmp(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ConditionOperator::GreaterThan => numeric_cmp(left, right) == Some(Ordering::Greater),
            ConditionOperator::GreaterThanOrEqual => matches!(
                numeric_cmp(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ConditionOperator::Contains => text_match(left, right, |l, r| l.contains(r)),
            ConditionOperator::StartsWith => text_match(left, right, |l, r| l.starts_with(r)),
            ConditionOperator::EndsWith => text_match(left, right, |l, r| l.ends_with(r)),
            ConditionOperator::IsNull => left.is_null(),
            ConditionOperator::IsNotNull => !left.is_null(),
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn numeric_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

fn text_match(left: &Value, right: &Value, op: impl Fn(&str, &str) -> bool) -> bool {
    match (left.as_str(), right.as_str()) {
        (Some(l), Some(r)) => op(&l.to_lowercase(), &r.to_lowercase()),
        _ => false,
    }
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone)]
pub enum PredicateRight {
    Static(Value),
    Dynamic(Option<DataModelPath>),
}

/// Compares a data model property against a value.
#[derive(Debug, Clone)]
pub struct DataModelPredicate {
    left: Option<DataModelPath>,
    operator: ConditionOperator,
    right: PredicateRight,
}

impl DataModelPredicate {
    pub fn new(left: Option<DataModelPath>, operator: ConditionOperator, right: PredicateRight) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }

    /// Shorthand for a comparison against a static value.
    pub fn with_static(left: DataModelPath, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self::new(Some(left), operator, PredicateRight::Static(value.into()))
    }

    pub fn left(&self) -> Option<&DataModelPath> {
        self.left.as_ref()
    }

    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    pub fn right(&self) -> &PredicateRight {
        &self.right
    }

    pub fn evaluate(&self) -> bool {
        let Some(left) = self.left.as_ref().and_then(|p| p.value()) else {
            return false;
        };
        if self.operator.is_unary() {
            return self.operator.compare(&left, &Value::Null);
        }

        let right = match &self.right {
            PredicateRight::Static(value) => value.clone(),
            PredicateRight::Dynamic(path) => match path.as_ref().and_then(|p| p.value()) {
                Some(value) => value,
                None => return false,
            },
        };
        // Compare in the left-hand type when the right side can be coerced
        let right = match left.value_type() {
            Some(ty) => right.convert_to(ty).unwrap_or(right),
            None => right,
        };
        self.operator.compare(&left, &right)
    }

    fn save(&self) -> Result<DataModelPredicateEntity> {
        let right = match &self.right {
            PredicateRight::Static(value) => PredicateRightEntity::Static {
                value: Some(storage::serialize_value(value)?),
            },
            PredicateRight::Dynamic(path) => PredicateRightEntity::Dynamic {
                path: path.as_ref().map(DataModelPath::to_entity).transpose()?,
            },
        };
        Ok(DataModelPredicateEntity {
            left: self.left.as_ref().map(DataModelPath::to_entity).transpose()?,
            operator: self.operator,
            right,
        })
    }

    fn from_entity(registry: &Arc<DataModelRegistry>, entity: &DataModelPredicateEntity) -> Self {
        let left = entity
            .left
            .as_ref()
            .map(|e| DataModelPath::from_entity(registry, e));
        let right = match &entity.right {
            PredicateRightEntity::Static { value } => {
                let value = value
                    .as_deref()
                    .map(|json| {
                        storage::deserialize_value(json).unwrap_or_else(|e| {
                            tracing::warn!("Failed to deserialize predicate value {}: {}", json, e);
                            Value::Null
                        })
                    })
                    .unwrap_or_default();
                PredicateRight::Static(value)
            }
            PredicateRightEntity::Dynamic { path } => PredicateRight::Dynamic(
                path.as_ref().map(|e| DataModelPath::from_entity(registry, e)),
            ),
        };
        Self {
            left,
            operator: entity.operator,
            right,
        }
    }

    fn dispose(&mut self) {
        if let Some(left) = &mut self.left {
            left.dispose();
        }
        if let PredicateRight::Dynamic(Some(path)) = &mut self.right {
            path.dispose();
        }
    }
}

/// A node of a predicate tree.
#[derive(Debug, Clone)]
pub enum ConditionPart {
    Group(ConditionGroup),
    Predicate(DataModelPredicate),
}

impl ConditionPart {
    fn evaluate(&self) -> Result<bool> {
        match self {
            ConditionPart::Group(group) => group.evaluate(),
            ConditionPart::Predicate(predicate) => Ok(predicate.evaluate()),
        }
    }
}

/// A boolean combination of predicates and nested groups.
#[derive(Debug, Clone, Default)]
pub struct ConditionGroup {
    operator: BooleanOperator,
    children: Vec<ConditionPart>,
    disposed: bool,
}

impl ConditionGroup {
    pub fn new(operator: BooleanOperator) -> Self {
        Self {
            operator,
            children: Vec::new(),
            disposed: false,
        }
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            Err(BindingError::Disposed("ConditionGroup"))
        } else {
            Ok(())
        }
    }

    pub fn operator(&self) -> BooleanOperator {
        self.operator
    }

    pub fn set_operator(&mut self, operator: BooleanOperator) -> Result<()> {
        self.check_disposed()?;
        self.operator = operator;
        Ok(())
    }

    pub fn children(&self) -> &[ConditionPart] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn add_predicate(&mut self, predicate: DataModelPredicate) -> Result<()> {
        self.check_disposed()?;
        self.children.push(ConditionPart::Predicate(predicate));
        Ok(())
    }

    pub fn add_group(&mut self, group: ConditionGroup) -> Result<()> {
        self.check_disposed()?;
        self.children.push(ConditionPart::Group(group));
        Ok(())
    }

    /// Remove and dispose the part at `index`. Out-of-range indices are ignored.
    pub fn remove_child(&mut self, index: usize) -> Result<()> {
        self.check_disposed()?;
        if index < self.children.len() {
            let mut part = self.children.remove(index);
            dispose_part(&mut part);
        }
        Ok(())
    }

    /// Evaluate the tree against the current data model values.
    pub fn evaluate(&self) -> Result<bool> {
        self.check_disposed()?;
        match self.children.as_slice() {
            [] => Ok(false),
            [only] => only.evaluate(),
            children => {
                let mut results = children.iter().map(ConditionPart::evaluate);
                match self.operator {
                    BooleanOperator::And => try_all(&mut results, |r| r),
                    BooleanOperator::Or => try_any(&mut results, |r| r),
                    BooleanOperator::AndNot => try_all(&mut results, |r| !r),
                    BooleanOperator::OrNot => try_any(&mut results, |r| !r),
                }
            }
        }
    }

    pub fn save(&self) -> Result<ConditionGroupEntity> {
        self.check_disposed()?;
        let children = self
            .children
            .iter()
            .map(|part| {
                Ok(match part {
                    ConditionPart::Group(group) => ConditionPartEntity::Group(group.save()?),
                    ConditionPart::Predicate(p) => ConditionPartEntity::Predicate(p.save()?),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ConditionGroupEntity {
            operator: self.operator,
            children,
        })
    }

    pub fn from_entity(registry: &Arc<DataModelRegistry>, entity: &ConditionGroupEntity) -> Self {
        let children = entity
            .children
            .iter()
            .map(|part| match part {
                ConditionPartEntity::Group(group) => {
                    ConditionPart::Group(ConditionGroup::from_entity(registry, group))
                }
                ConditionPartEntity::Predicate(p) => {
                    ConditionPart::Predicate(DataModelPredicate::from_entity(registry, p))
                }
            })
            .collect();
        Self {
            operator: entity.operator,
            children,
            disposed: false,
        }
    }

    /// Dispose every nested path. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for part in &mut self.children {
            dispose_part(part);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn dispose_part(part: &mut ConditionPart) {
    match part {
        ConditionPart::Group(group) => group.dispose(),
        ConditionPart::Predicate(predicate) => predicate.dispose(),
    }
}

fn try_all(results: &mut dyn Iterator<Item = Result<bool>>, f: fn(bool) -> bool) -> Result<bool> {
    for r in results {
        if !f(r?) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn try_any(results: &mut dyn Iterator<Item = Result<bool>>, f: fn(bool) -> bool) -> Result<bool> {
    for r in results {
        if f(r?) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{DataModel, StructDef};
    use crate::id::ProviderId;
    use crate::types::ValueType;

    struct Fixture {
        registry: Arc<DataModelRegistry>,
        model: Arc<DataModel>,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(DataModelRegistry::new());
            let model = registry.add(DataModel::new(
                ProviderId::new_v4(),
                "Game",
                StructDef::new("Game")
                    .with_primitive("health", ValueType::Int)
                    .with_primitive("map", ValueType::String)
                    .with_primitive("max_health", ValueType::Int),
            ));
            model.set_value("health", 40).unwrap();
            model.set_value("map", "Dust II").unwrap();
            model.set_value("max_health", 100).unwrap();
            Self { registry, model }
        }

        fn path(&self, path: &str) -> DataModelPath {
            DataModelPath::new(&self.registry, &self.model, path).unwrap()
        }

        fn predicate(&self, path: &str, op: ConditionOperator, value: impl Into<Value>) -> DataModelPredicate {
            DataModelPredicate::with_static(self.path(path), op, value)
        }
    }

    #[test]
    fn test_empty_group_is_false() {
        assert!(!ConditionGroup::default().evaluate().unwrap());
    }

    #[test]
    fn test_single_child_ignores_operator() {
        let f = Fixture::new();
        let mut group = ConditionGroup::new(BooleanOperator::AndNot);
        group
            .add_predicate(f.predicate("health", ConditionOperator::LessThan, 50))
            .unwrap();
        assert!(group.evaluate().unwrap());
    }

    #[test]
    fn test_boolean_operators() {
        let f = Fixture::new();
        let mut group = ConditionGroup::new(BooleanOperator::And);
        group
            .add_predicate(f.predicate("health", ConditionOperator::LessThan, 50))
            .unwrap();
        group
            .add_predicate(f.predicate("map", ConditionOperator::Contains, "dust"))
            .unwrap();
        assert!(group.evaluate().unwrap());

        group
            .add_predicate(f.predicate("map", ConditionOperator::StartsWith, "Inferno"))
            .unwrap();
        assert!(!group.evaluate().unwrap());

        group.set_operator(BooleanOperator::Or).unwrap();
        assert!(group.evaluate().unwrap());

        group.set_operator(BooleanOperator::OrNot).unwrap();
        assert!(group.evaluate().unwrap());

        group.set_operator(BooleanOperator::AndNot).unwrap();
        assert!(!group.evaluate().unwrap());
    }

    #[test]
    fn test_dynamic_right_side() {
        let f = Fixture::new();
        let predicate = DataModelPredicate::new(
            Some(f.path("health")),
            ConditionOperator::LessThan,
            PredicateRight::Dynamic(Some(f.path("max_health"))),
        );
        assert!(predicate.evaluate());
    }

    #[test]
    fn test_unbound_left_is_false() {
        let predicate = DataModelPredicate::new(None, ConditionOperator::IsNull, PredicateRight::Static(Value::Null));
        assert!(!predicate.evaluate());
    }

    #[test]
    fn test_static_value_is_coerced_to_left_type() {
        let f = Fixture::new();
        assert!(f.predicate("health", ConditionOperator::Equal, "40").evaluate());
        assert!(f.predicate("health", ConditionOperator::GreaterThanOrEqual, 40.0).evaluate());
    }

    #[test]
    fn test_save_and_load() {
        let f = Fixture::new();
        let mut group = ConditionGroup::new(BooleanOperator::Or);
        group
            .add_predicate(f.predicate("health", ConditionOperator::GreaterThan, 90))
            .unwrap();
        let mut nested = ConditionGroup::new(BooleanOperator::And);
        nested
            .add_predicate(f.predicate("map", ConditionOperator::EndsWith, "ii"))
            .unwrap();
        group.add_group(nested).unwrap();

        let entity = group.save().unwrap();
        let loaded = ConditionGroup::from_entity(&f.registry, &entity);
        assert_eq!(loaded.save().unwrap(), entity);
        assert!(loaded.evaluate().unwrap());
    }

    #[test]
    fn test_dispose_is_final() {
        let f = Fixture::new();
        let mut group = ConditionGroup::new(BooleanOperator::And);
        group
            .add_predicate(f.predicate("health", ConditionOperator::IsNotNull, Value::Null))
            .unwrap();
        let before = f.registry.subscriber_count();
        group.dispose();
        group.dispose();
        assert!(f.registry.subscriber_count() < before);
        assert!(matches!(group.evaluate(), Err(BindingError::Disposed(_))));
        assert!(group.save().is_err());
    }
}
