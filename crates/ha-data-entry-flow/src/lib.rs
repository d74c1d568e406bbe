//! Data Entry Flows
//!
//! This crate provides the host side of multi-step configuration flows:
//! integrations implement [`FlowHandler`] and return a [`FlowResult`] per
//! step, the [`FlowManager`] keeps in-progress flows addressable by
//! `flow_id` and coerces submitted input against the schema of the form that
//! was shown.
//!
//! # Key Types
//!
//! - [`DataSchema`] - Ordered form fields with suggested values
//! - [`FlowResult`] - Outcome of a step: form, create_entry or abort
//! - [`FlowHandler`] - Per-integration step implementation
//! - [`FlowManager`] - Drives flows and hands finished ones to a [`FlowFinisher`]

pub mod error;
pub mod handler;
pub mod manager;
pub mod result;
pub mod schema;

pub use error::{FlowError, FlowManagerResult, SchemaError};
pub use handler::{FlowContext, FlowHandler, SOURCE_IMPORT, SOURCE_USER};
pub use manager::{FlowFinisher, FlowManager, FlowProgress, PassthroughFinisher};
pub use result::{FieldDescription, FlowResult, FlowResultType, FormField};
pub use schema::{ConfigData, DataSchema, Extra, FieldValidator, Marker, SchemaField};
