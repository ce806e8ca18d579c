//! Integration tests for conditional bindings
//!
//! - First matching condition wins
//! - Fallback to the base value
//! - Nested condition groups and dynamic right-hand sides

mod common;

use common::builders::{ModelBuilder, TestEnv};
use lumenbind::binding::{BindingModeKind, DataBinding};
use lumenbind::conditions::{BooleanOperator, ConditionGroup, ConditionOperator, DataModelPredicate, PredicateRight};
use lumenbind::datamodel::DataModelPath;
use lumenbind::id::ProviderId;
use lumenbind::types::{Color, Value, ValueType};
use lumenbind::DataModel;
use std::sync::Arc;

const RED: Color = Color::rgb(255, 0, 0);
const AMBER: Color = Color::rgb(255, 191, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

struct Fixture {
    env: TestEnv,
    model: Arc<DataModel>,
    binding: DataBinding,
}

impl Fixture {
    fn new() -> Self {
        let env = TestEnv::new();
        let model = env.add_model(
            ModelBuilder::new("Game")
                .id(ProviderId::new_v4())
                .field("health", ValueType::Int)
                .field("max_health", ValueType::Int)
                .field("map", ValueType::String)
                .field("in_menu", ValueType::Bool)
                .build(),
        );
        let mut binding = env.binding("brush.color", ValueType::Color);
        binding.change_mode(Some(BindingModeKind::Conditional)).unwrap();
        Self { env, model, binding }
    }

    fn path(&self, path: &str) -> DataModelPath {
        DataModelPath::new(&self.env.data_models, &self.model, path).unwrap()
    }

    /// Append a branch "health < below" emitting `color`
    fn health_below(&mut self, below: i64, color: Color) {
        let predicate = DataModelPredicate::with_static(self.path("health"), ConditionOperator::LessThan, below);
        let conditional = self.binding.conditional_mut().unwrap();
        let condition = conditional.add_condition().unwrap();
        condition.condition_mut().unwrap().add_predicate(predicate).unwrap();
        condition.update_value(Some(Value::Color(color))).unwrap();
    }

    fn resolve(&mut self) -> Value {
        self.binding.resolve(&Value::Color(BLUE)).unwrap()
    }
}

#[test]
fn test_first_match_wins_regardless_of_later_conditions() {
    let mut f = Fixture::new();
    f.health_below(20, RED);
    f.health_below(50, AMBER);

    f.model.set_value("health", 10).unwrap();
    assert_eq!(f.resolve(), Value::Color(RED));
    f.model.set_value("health", 35).unwrap();
    assert_eq!(f.resolve(), Value::Color(AMBER));
}

#[test]
fn test_fallback_to_base() {
    let mut f = Fixture::new();
    f.health_below(20, RED);
    f.model.set_value("health", 100).unwrap();
    assert_eq!(f.resolve(), Value::Color(BLUE));
}

#[test]
fn test_empty_condition_never_matches() {
    let mut f = Fixture::new();
    f.binding.conditional_mut().unwrap().add_condition().unwrap();
    assert_eq!(f.resolve(), Value::Color(BLUE));
}

#[test]
fn test_nested_groups() {
    let mut f = Fixture::new();
    let mut any_low = ConditionGroup::new(BooleanOperator::Or);
    any_low
        .add_predicate(DataModelPredicate::with_static(f.path("health"), ConditionOperator::LessThan, 10))
        .unwrap();
    any_low
        .add_predicate(DataModelPredicate::with_static(f.path("map"), ConditionOperator::StartsWith, "lava"))
        .unwrap();
    let not_in_menu = DataModelPredicate::with_static(f.path("in_menu"), ConditionOperator::Equal, false);

    let conditional = f.binding.conditional_mut().unwrap();
    let condition = conditional.add_condition().unwrap();
    let root = condition.condition_mut().unwrap();
    root.add_group(any_low).unwrap();
    root.add_predicate(not_in_menu).unwrap();
    condition.update_value(Some(Value::Color(RED))).unwrap();

    f.model.set_value("health", 90).unwrap();
    f.model.set_value("map", "Lava Caves").unwrap();
    assert_eq!(f.resolve(), Value::Color(RED));

    f.model.set_value("in_menu", true).unwrap();
    assert_eq!(f.resolve(), Value::Color(BLUE));

    f.model.set_value("in_menu", false).unwrap();
    f.model.set_value("map", "Forest").unwrap();
    assert_eq!(f.resolve(), Value::Color(BLUE));
}

#[test]
fn test_dynamic_right_hand_side() {
    let mut f = Fixture::new();
    let predicate = DataModelPredicate::new(
        Some(f.path("health")),
        ConditionOperator::GreaterThanOrEqual,
        PredicateRight::Dynamic(Some(f.path("max_health"))),
    );
    let conditional = f.binding.conditional_mut().unwrap();
    let condition = conditional.add_condition().unwrap();
    condition.condition_mut().unwrap().add_predicate(predicate).unwrap();
    condition.update_value(Some(Value::from("#FF00FF00"))).unwrap();

    f.model.set_value("max_health", 100).unwrap();
    f.model.set_value("health", 100).unwrap();
    assert_eq!(f.resolve(), Value::Color(Color::rgb(0, 255, 0)));
    f.model.set_value("health", 99).unwrap();
    assert_eq!(f.resolve(), Value::Color(BLUE));
}

#[test]
fn test_removed_model_makes_predicates_false() {
    let mut f = Fixture::new();
    f.health_below(20, RED);
    assert_eq!(f.resolve(), Value::Color(RED));

    f.env.data_models.remove(f.model.id());
    assert_eq!(f.resolve(), Value::Color(BLUE));
}

#[test]
fn test_condition_reorder_and_removal() {
    let mut f = Fixture::new();
    f.health_below(20, RED);
    f.health_below(50, AMBER);
    f.model.set_value("health", 5).unwrap();

    let conditional = f.binding.conditional_mut().unwrap();
    let events = conditional.subscribe().unwrap();
    let amber = conditional.conditions()[1].id();
    conditional.move_condition(amber, 1).unwrap();
    assert_eq!(f.resolve(), Value::Color(AMBER));

    let conditional = f.binding.conditional_mut().unwrap();
    conditional.remove_condition(amber).unwrap();
    assert_eq!(conditional.conditions().len(), 1);
    assert_eq!(f.resolve(), Value::Color(RED));
    assert_eq!(events.try_iter().count(), 2);
}
