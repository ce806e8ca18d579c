//! Benchmarks for per-frame binding resolution
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lumenbind::binding::{BindingContext, BindingModeKind, DataBinding, LayerProperty, ParameterKind};
use lumenbind::conditions::{ConditionOperator, DataModelPredicate};
use lumenbind::datamodel::{DataModel, DataModelPath, DataModelRegistry, PathAccessor, StructDef};
use lumenbind::id::ProviderId;
use lumenbind::modifiers::{register_builtins, ModifierTypeKey, ModifierTypeRegistry};
use lumenbind::types::{Value, ValueType};
use std::sync::Arc;

struct Env {
    data_models: Arc<DataModelRegistry>,
    modifier_types: Arc<ModifierTypeRegistry>,
    model: Arc<DataModel>,
}

impl Env {
    fn new() -> Self {
        let data_models = Arc::new(DataModelRegistry::new());
        let modifier_types = Arc::new(ModifierTypeRegistry::new());
        register_builtins(&modifier_types);
        let model = data_models.add(DataModel::new(
            ProviderId::new_v4(),
            "System",
            StructDef::new("System").with_struct(
                "cpu",
                StructDef::new("Cpu")
                    .with_primitive("load", ValueType::Float)
                    .with_primitive("temperature", ValueType::Int),
            ),
        ));
        let _ = model.set_value("cpu.load", 0.42);
        let _ = model.set_value("cpu.temperature", 71);
        Self {
            data_models,
            modifier_types,
            model,
        }
    }

    fn binding(&self) -> DataBinding {
        DataBinding::new(BindingContext::new(
            LayerProperty::new("brush.size", ValueType::Float),
            Arc::clone(&self.data_models),
            Arc::clone(&self.modifier_types),
        ))
    }

    fn direct(&self, modifiers: usize) -> DataBinding {
        let mut binding = self.binding();
        let _ = binding.change_mode(Some(BindingModeKind::Direct));
        let direct = binding.direct_mut().unwrap();
        direct.update_source(Some(&self.model), Some("cpu.load")).unwrap();
        let add = self
            .modifier_types
            .get(&ModifierTypeKey::new(ProviderId::BUILTIN, "Add"))
            .unwrap();
        for _ in 0..modifiers {
            let modifier = direct.add_modifier(ParameterKind::Static).unwrap();
            modifier.update_modifier_type(Some(&add)).unwrap();
            modifier.update_parameter_static(Some(Value::Float(1.0))).unwrap();
        }
        binding
    }

    fn conditional(&self, conditions: usize) -> DataBinding {
        let mut binding = self.binding();
        let _ = binding.change_mode(Some(BindingModeKind::Conditional));
        let conditional = binding.conditional_mut().unwrap();
        for i in 0..conditions {
            let path = DataModelPath::new(&self.data_models, &self.model, "cpu.temperature").unwrap();
            let condition = conditional.add_condition().unwrap();
            condition
                .condition_mut()
                .unwrap()
                .add_predicate(DataModelPredicate::with_static(
                    path,
                    ConditionOperator::GreaterThan,
                    100 + i as i64,
                ))
                .unwrap();
            condition.update_value(Some(Value::Float(i as f64))).unwrap();
        }
        binding
    }
}

fn bench_accessor(c: &mut Criterion) {
    let env = Env::new();
    let mut group = c.benchmark_group("accessor");

    group.bench_function("compile", |b| {
        b.iter(|| PathAccessor::compile(black_box(env.model.schema()), black_box("cpu.temperature")))
    });

    let accessor = PathAccessor::compile(env.model.schema(), "cpu.temperature").unwrap();
    group.bench_function("read_compiled", |b| b.iter(|| env.model.read(black_box(&accessor))));
    group.bench_function("read_by_name", |b| {
        b.iter(|| env.model.get_value(black_box("cpu.temperature")))
    });

    group.finish();
}

fn bench_direct_resolve(c: &mut Criterion) {
    let env = Env::new();
    let mut group = c.benchmark_group("direct_resolve");
    let base = Value::Float(10.0);

    for modifiers in [0, 1, 4, 16] {
        let mut binding = env.direct(modifiers);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("modifiers", modifiers), &base, |b, base| {
            b.iter(|| black_box(binding.resolve(black_box(base))))
        });
    }

    group.finish();
}

fn bench_conditional_resolve(c: &mut Criterion) {
    let env = Env::new();
    let mut group = c.benchmark_group("conditional_resolve");
    let base = Value::Float(10.0);

    // No condition matches, so every resolve walks the whole list
    for conditions in [1, 4, 16] {
        let mut binding = env.conditional(conditions);
        group.bench_with_input(BenchmarkId::new("conditions", conditions), &base, |b, base| {
            b.iter(|| black_box(binding.resolve(black_box(base))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_accessor,
    bench_direct_resolve,
    bench_conditional_resolve
);
criterion_main!(benches);
