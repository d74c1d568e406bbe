//! Flow error types

use thiserror::Error;

/// Errors raised while coercing submitted input against a schema.
///
/// Messages follow the voluptuous wording the frontend already knows how to
/// display.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required key not provided @ data['{0}']")]
    Required(String),

    #[error("extra keys not allowed @ data['{0}']")]
    ExtraKey(String),

    #[error("expected {expected} for dictionary value @ data['{key}']")]
    InvalidType { key: String, expected: &'static str },

    #[error("value must be one of {options:?} for dictionary value @ data['{key}']")]
    NotInOptions { key: String, options: Vec<String> },

    #[error("value must be between {min} and {max} for dictionary value @ data['{key}']")]
    OutOfRange { key: String, min: i64, max: i64 },

    #[error("Entity ID {value} is an invalid entity ID for dictionary value @ data['{key}']")]
    InvalidEntityId { key: String, value: String },

    #[error("Invalid date specified for dictionary value @ data['{key}']")]
    InvalidDate { key: String },
}

/// Flow manager errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow not found: {0}")]
    UnknownFlow(String),

    #[error("Handler {handler} does not support step {step_id}")]
    UnknownStep { handler: String, step_id: String },

    #[error("Invalid user input: {0}")]
    InvalidInput(#[from] SchemaError),

    #[error("Handler {handler} failed: {reason}")]
    Handler { handler: String, reason: String },

    #[error("Failed to finish flow {flow_id}: {reason}")]
    Finish { flow_id: String, reason: String },
}

pub type FlowManagerResult<T> = Result<T, FlowError>;
