//! Live data model handles.

use crate::datamodel::accessor::PathAccessor;
use crate::datamodel::schema::StructDef;
use crate::error::{BindingError, Result};
use crate::id::ProviderId;
use crate::types::{Value, ValueType};
use std::fmt;
use std::sync::{Arc, RwLock};

/// A data model announced by a plugin.
///
/// The shape is fixed for the lifetime of the handle. The live values are
/// updated by the plugin through [`set_value`](Self::set_value) and read by
/// bindings through compiled accessors.
pub struct DataModel {
    id: ProviderId,
    name: String,
    schema: Arc<StructDef>,
    root: RwLock<Value>,
}

impl DataModel {
    /// Create a model whose live values start at their defaults.
    pub fn new(id: ProviderId, name: impl Into<String>, schema: StructDef) -> Self {
        let root = schema.default_value();
        Self {
            id,
            name: name.into(),
            schema: Arc::new(schema),
            root: RwLock::new(root),
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<StructDef> {
        &self.schema
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.schema.contains_path(path)
    }

    pub fn type_at_path(&self, path: &str) -> Option<ValueType> {
        self.schema.type_at_path(path)
    }

    pub fn list_type_in_path(&self, path: &str) -> Option<String> {
        self.schema.list_type_in_path(path)
    }

    /// Read the current value through a compiled accessor.
    #[inline]
    pub fn read(&self, accessor: &PathAccessor) -> Option<Value> {
        let root = self.root.read().ok()?;
        accessor.read(&root).cloned()
    }

    /// Uncompiled read, for tooling and tests.
    pub fn get_value(&self, path: &str) -> Result<Value> {
        let accessor = PathAccessor::compile(&self.schema, path)?;
        self.read(&accessor).ok_or_else(|| BindingError::PathNotFound {
            model: self.name.clone(),
            path: path.to_string(),
        })
    }

    /// Update a live value, coercing it to the declared field type.
    pub fn set_value(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let accessor = PathAccessor::compile(&self.schema, path)?;
        let value = value.into().convert_to(accessor.value_type())?;
        let mut root = self
            .root
            .write()
            .map_err(|_| BindingError::Config(format!("Data model '{}' is poisoned", self.name)))?;
        match accessor.read_mut(&mut root) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(BindingError::PathNotFound {
                model: self.name.clone(),
                path: path.to_string(),
            }),
        }
    }
}

impl fmt::Debug for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
