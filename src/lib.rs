//! # lumenbind: Data-binding resolution for RGB lighting profiles
//!
//! Computes, once per animation frame, the effective value of a lighting
//! layer property by combining its static base value with live data published
//! by plugins. Data models appear and disappear at runtime; bindings rebind by
//! themselves when their model comes back.
//!
//! ## Architecture
//!
//! - **Data models**: plugin-provided value trees with a runtime schema, read
//!   through compiled path accessors
//! - **Modifiers**: pluggable transformations (built-in and Rhai scripts)
//! - **Conditions**: boolean predicate trees over data model values
//! - **Bindings**: direct (source + modifier chain) or conditional (first
//!   matching condition) resolution per layer property
//! - **Storage**: serde records for saving and loading profiles
//!
//! ## Configuration
//!
//! The engine config and saved profiles live in the platform-appropriate data
//! directory under `dev.hxyulin.lumenbind`.
//!
//! ## Example
//!
//! ```ignore
//! use lumenbind::{
//!     binding::{BindingContext, BindingModeKind, DataBinding, LayerProperty},
//!     datamodel::{DataModel, DataModelRegistry, StructDef},
//!     id::ProviderId,
//!     modifiers::{register_builtins, ModifierTypeRegistry},
//!     types::{Value, ValueType},
//! };
//! use std::sync::Arc;
//!
//! let data_models = Arc::new(DataModelRegistry::new());
//! let modifier_types = Arc::new(ModifierTypeRegistry::new());
//! register_builtins(&modifier_types);
//!
//! let cpu = data_models.add(DataModel::new(
//!     ProviderId::new_v4(),
//!     "Cpu",
//!     StructDef::new("Cpu").with_primitive("load", ValueType::Float),
//! ));
//!
//! let context = BindingContext::new(
//!     LayerProperty::new("brush.size", ValueType::Float),
//!     data_models,
//!     modifier_types,
//! );
//! let mut binding = DataBinding::new(context);
//! binding.change_mode(Some(BindingModeKind::Direct))?;
//! binding
//!     .direct_mut()
//!     .unwrap()
//!     .update_source(Some(&cpu), Some("load"))?;
//!
//! let size = binding.resolve(&Value::Float(10.0))?;
//! ```

pub mod binding;
pub mod conditions;
pub mod config;
pub mod datamodel;
pub mod error;
pub mod events;
pub mod id;
pub mod modifiers;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use binding::{BindingContext, BindingModeKind, DataBinding, LayerProperty};
pub use config::{EngineConfig, ProfileFile};
pub use datamodel::{DataModel, DataModelPath, DataModelRegistry, StructDef};
pub use error::{BindingError, Result};
pub use modifiers::{register_builtins, ModifierTypeRegistry};
pub use types::{Color, Value, ValueType};
