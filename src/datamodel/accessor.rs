//! Compiled path accessors.
//!
//! Compiling a dotted path resolves each segment to a field index once, so a
//! per-frame read is an index walk over the live value with no name lookups.
//! Paths that cross a list cannot be compiled.

use crate::datamodel::model::DataModel;
use crate::datamodel::schema::{StructDef, TypeDef};
use crate::error::{BindingError, Result};
use crate::id::ProviderId;
use crate::types::{Value, ValueType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A reusable reader for one path of one data model shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PathAccessor {
    path: String,
    indices: Vec<usize>,
    value_type: ValueType,
}

impl PathAccessor {
    /// Compile `path` against `root`.
    ///
    /// Fails with `PathNotFound` if a segment does not exist and with
    /// `PathUnsupported` if a segment is a list.
    pub fn compile(root: &StructDef, path: &str) -> Result<Self> {
        let not_found = || BindingError::PathNotFound {
            model: root.name.clone(),
            path: path.to_string(),
        };
        if path.is_empty() {
            return Err(not_found());
        }

        let mut current = root;
        let mut indices = Vec::new();
        let mut value_type = ValueType::Struct;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let index = current.field_index(segment).ok_or_else(not_found)?;
            let field = &current.fields[index];
            indices.push(index);
            value_type = field.ty.value_type();

            match &field.ty {
                TypeDef::List(_) => {
                    return Err(BindingError::PathUnsupported {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
                TypeDef::Struct(def) => current = &**def,
                TypeDef::Primitive(_) if segments.peek().is_some() => return Err(not_found()),
                TypeDef::Primitive(_) => {}
            }
        }

        Ok(Self {
            path: path.to_string(),
            indices,
            value_type,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The declared type of the value this accessor reads.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Read the value at this path from a live root value.
    #[inline]
    pub fn read<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.indices.iter().try_fold(root, |current, &index| match current {
            Value::Struct(fields) => fields.get(index).map(|(_, v)| v),
            _ => None,
        })
    }

    /// Mutable counterpart of [`read`](Self::read).
    pub fn read_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.indices
            .iter()
            .try_fold(root, |current, &index| match current {
                Value::Struct(fields) => fields.get_mut(index).map(|(_, v)| v),
                _ => None,
            })
    }
}

struct CacheEntry {
    schema: Arc<StructDef>,
    accessor: Arc<PathAccessor>,
}

/// Interns compiled accessors per (model identity, path).
///
/// Entries are validated against the model's schema pointer, so a model
/// re-registered with a new shape recompiles on first use.
#[derive(Default)]
pub struct AccessorCache {
    entries: Mutex<HashMap<(ProviderId, String), CacheEntry>>,
}

impl AccessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the interned accessor for `path` on `model`, compiling it if needed.
    pub fn get_or_compile(&self, model: &DataModel, path: &str) -> Result<Arc<PathAccessor>> {
        let key = (model.id(), path.to_string());
        if let Ok(entries) = self.entries.lock() {
            if let Some(entry) = entries.get(&key) {
                if Arc::ptr_eq(&entry.schema, model.schema()) {
                    return Ok(Arc::clone(&entry.accessor));
                }
            }
        }

        let accessor = Arc::new(PathAccessor::compile(model.schema(), path)?);
        tracing::trace!("Compiled accessor for '{}' on {}", path, model.name());

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    schema: Arc::clone(model.schema()),
                    accessor: Arc::clone(&accessor),
                },
            );
        }
        Ok(accessor)
    }

    /// Drop every accessor compiled for `model_id`.
    pub fn purge(&self, model_id: ProviderId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|(id, _), _| *id != model_id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
