//! Error handling for lumenbind
//!
//! This module defines the binding error type and a Result alias for use
//! throughout the crate.
//!
//! Configuration errors are raised synchronously from mutating calls and are
//! always recoverable: validation happens before any field is mutated.
//! Stale references (a model that went away, a path that no longer resolves)
//! are never errors; they degrade to pass-through values instead.

use crate::types::ValueType;
use thiserror::Error;

/// Main error type for data binding operations
#[derive(Error, Debug)]
pub enum BindingError {
    /// A data model was supplied without a path, or a path without a data model
    #[error("Invalid source specification: a data model and a path must both be provided or both be omitted")]
    InvalidSourceSpecification,

    /// The path does not resolve against the data model's shape
    #[error("Data model '{model}' does not contain a property at path '{path}'")]
    PathNotFound { model: String, path: String },

    /// The path crosses a list, which direct accessors cannot read
    #[error("Cannot create an accessor for path '{path}' because segment '{segment}' is a list")]
    PathUnsupported { path: String, segment: String },

    /// The modifier type cannot operate on the binding's target type
    #[error("Cannot apply modifier type {modifier} because it does not support this data binding's type {target}")]
    UnsupportedModifierForType { modifier: String, target: ValueType },

    /// A dynamic modifier parameter was given a path that is not currently valid
    #[error("Cannot update modifier parameter to an invalid path: {0}")]
    InvalidParameterPath(String),

    /// The object was disposed and can no longer be used
    #[error("{0} has been disposed")]
    Disposed(&'static str),

    /// A value could not be converted to the requested type
    #[error("Cannot convert {from} to {to}")]
    Conversion { from: ValueType, to: ValueType },

    /// Errors related to persisted entities and typed values
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors related to Rhai script modifiers
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration and profile files
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BindingError>,
    },
}

impl BindingError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BindingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        BindingError::Script(err.to_string())
    }

    /// Returns true for the recoverable configuration errors an editor should
    /// surface as validation messages.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            BindingError::InvalidSourceSpecification
            | BindingError::PathNotFound { .. }
            | BindingError::PathUnsupported { .. }
            | BindingError::UnsupportedModifierForType { .. }
            | BindingError::InvalidParameterPath(_) => true,
            BindingError::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for BindingError {
    fn from(err: serde_json::Error) -> Self {
        BindingError::Serialization(err.to_string())
    }
}

/// Result type alias for binding operations
pub type Result<T> = std::result::Result<T, BindingError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| BindingError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| BindingError::from_rhai_error(e).with_context(f()))
    }
}
