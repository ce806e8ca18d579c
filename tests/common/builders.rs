//! Test data builders for creating test objects

use lumenbind::binding::{BindingContext, DataBinding, LayerProperty};
use lumenbind::datamodel::{DataModel, DataModelRegistry, StructDef};
use lumenbind::id::ProviderId;
use lumenbind::modifiers::{register_builtins, ModifierTypeKey, ModifierTypeRegistration, ModifierTypeRegistry};
use lumenbind::types::ValueType;
use std::sync::Arc;

/// Fresh registries with the built-in modifier types registered
pub struct TestEnv {
    pub data_models: Arc<DataModelRegistry>,
    pub modifier_types: Arc<ModifierTypeRegistry>,
}

impl TestEnv {
    pub fn new() -> Self {
        let modifier_types = Arc::new(ModifierTypeRegistry::new());
        register_builtins(&modifier_types);
        Self {
            data_models: Arc::new(DataModelRegistry::new()),
            modifier_types,
        }
    }

    /// Registries without any modifier types
    pub fn empty() -> Self {
        Self {
            data_models: Arc::new(DataModelRegistry::new()),
            modifier_types: Arc::new(ModifierTypeRegistry::new()),
        }
    }

    pub fn context(&self, path: &str, value_type: ValueType) -> BindingContext {
        BindingContext::new(
            LayerProperty::new(path, value_type),
            Arc::clone(&self.data_models),
            Arc::clone(&self.modifier_types),
        )
    }

    pub fn binding(&self, path: &str, value_type: ValueType) -> DataBinding {
        DataBinding::new(self.context(path, value_type))
    }

    pub fn builtin(&self, name: &str) -> Arc<ModifierTypeRegistration> {
        self.modifier_types
            .get(&ModifierTypeKey::new(ProviderId::BUILTIN, name))
            .unwrap_or_else(|| panic!("built-in modifier {} not registered", name))
    }

    pub fn add_model(&self, model: DataModel) -> Arc<DataModel> {
        self.data_models.add(model)
    }
}

/// Builder for creating test data models
pub struct ModelBuilder {
    id: ProviderId,
    name: String,
    schema: StructDef,
}

impl ModelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            id: ProviderId::new_v4(),
            name: name.to_string(),
            schema: StructDef::new(name),
        }
    }

    pub fn id(mut self, id: ProviderId) -> Self {
        self.id = id;
        self
    }

    pub fn field(mut self, name: &str, ty: ValueType) -> Self {
        self.schema = self.schema.with_primitive(name, ty);
        self
    }

    pub fn nested(mut self, name: &str, def: StructDef) -> Self {
        self.schema = self.schema.with_struct(name, def);
        self
    }

    pub fn build(self) -> DataModel {
        DataModel::new(self.id, self.name, self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_builder() {
        let model = ModelBuilder::new("Sensors")
            .field("fan", ValueType::Int)
            .nested("gpu", StructDef::new("Gpu").with_primitive("load", ValueType::Float))
            .build();

        assert_eq!(model.name(), "Sensors");
        assert!(model.contains_path("gpu.load"));
        assert_eq!(model.type_at_path("fan"), Some(ValueType::Int));
    }
}
