//! Data models provided by plugins
//!
//! Plugins announce data models whose shape is only known at runtime. Bindings
//! reference a property of a model by identity and dotted path, and read it
//! every frame through a compiled accessor.
//!
//! # Main Types
//!
//! - [`StructDef`] / [`TypeDef`] - The shape of a data model
//! - [`DataModel`] - A live model handle with identity, shape and values
//! - [`PathAccessor`] - A path compiled to field indices for fast reads
//! - [`AccessorCache`] - Interned accessors per (model, path)
//! - [`DataModelRegistry`] - The set of available models, with add/remove events
//! - [`DataModelPath`] - A self-rebinding reference to a model property

pub mod accessor;
pub mod model;
pub mod path;
pub mod registry;
pub mod schema;

pub use accessor::{AccessorCache, PathAccessor};
pub use model::DataModel;
pub use path::{DataModelPath, PathStatus};
pub use registry::{DataModelEvent, DataModelRegistry};
pub use schema::{FieldDef, StructDef, TypeDef};
