//! Shape descriptions for data models.
//!
//! A data model's shape is only known at runtime, when the plugin that
//! provides it registers. Paths are dotted field names relative to the root
//! struct, e.g. `player.track.progress`.

use crate::types::{Value, ValueType};
use std::sync::Arc;

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Primitive(ValueType),
    Struct(Arc<StructDef>),
    List(Box<TypeDef>),
}

impl TypeDef {
    pub fn value_type(&self) -> ValueType {
        match self {
            TypeDef::Primitive(t) => *t,
            TypeDef::Struct(_) => ValueType::Struct,
            TypeDef::List(_) => ValueType::List,
        }
    }

    /// Default live value for a field of this type.
    ///
    /// Nested structs are materialized so their fields are always present.
    pub fn default_value(&self) -> Value {
        match self {
            TypeDef::Primitive(t) => t.default_value(),
            TypeDef::Struct(def) => def.default_value(),
            TypeDef::List(_) => Value::List(Vec::new()),
        }
    }
}

/// A named field inside a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeDef,
}

/// A struct shape: an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field addition.
    pub fn with_field(mut self, name: impl Into<String>, ty: TypeDef) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }

    /// Shorthand for a primitive field.
    pub fn with_primitive(self, name: impl Into<String>, ty: ValueType) -> Self {
        self.with_field(name, TypeDef::Primitive(ty))
    }

    /// Shorthand for a nested struct field.
    pub fn with_struct(self, name: impl Into<String>, def: StructDef) -> Self {
        self.with_field(name, TypeDef::Struct(Arc::new(def)))
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A struct value with every field set to its default.
    pub fn default_value(&self) -> Value {
        Value::Struct(
            self.fields
                .iter()
                .map(|f| (f.name.clone(), f.ty.default_value()))
                .collect(),
        )
    }

    /// Walk `path`, returning the type of each segment in order.
    ///
    /// Stops at the first segment that does not name a field. Segments after a
    /// list are resolved against the list's element type.
    fn walk<'a>(&'a self, path: &str) -> Option<Vec<(&'a str, &'a TypeDef)>> {
        if path.is_empty() {
            return None;
        }
        let mut current = self;
        let mut out = Vec::new();
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let field = current.field(segment)?;
            out.push((field.name.as_str(), &field.ty));
            if segments.peek().is_some() {
                current = match element_struct(&field.ty) {
                    Some(def) => def,
                    None => return None,
                };
            }
        }
        Some(out)
    }

    /// True when every segment of `path` names a field.
    pub fn contains_path(&self, path: &str) -> bool {
        self.walk(path).is_some()
    }

    /// The type of the final segment of `path`.
    pub fn type_at_path(&self, path: &str) -> Option<ValueType> {
        self.walk(path)
            .and_then(|segments| segments.last().map(|(_, ty)| ty.value_type()))
    }

    /// The first list-typed segment along `path`, if any.
    pub fn list_type_in_path(&self, path: &str) -> Option<String> {
        self.walk(path)?
            .into_iter()
            .find(|(_, ty)| matches!(ty, TypeDef::List(_)))
            .map(|(name, _)| name.to_string())
    }
}

fn element_struct(ty: &TypeDef) -> Option<&StructDef> {
    match ty {
        TypeDef::Struct(def) => Some(def),
        TypeDef::List(inner) => element_struct(inner),
        TypeDef::Primitive(_) => None,
    }
}
