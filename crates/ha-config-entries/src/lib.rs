//! Config Entries
//!
//! This crate provides the configuration entry store and the flow managers
//! that commit finished config and options flows into it.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`ConfigEntries`] - Store for all config entries
//! - [`ConfigEntriesFlowManager`] - Runs config flows, adds entries
//! - [`OptionsFlowManager`] - Runs options flows, updates entry options
//!
//! # Storage
//!
//! Config entries are persisted in `.storage/core.config_entries` with
//! version tracking.

pub mod entry;
pub mod flow;
pub mod manager;
pub mod storage;

pub use entry::{ConfigEntry, ConfigEntrySource, ConfigEntryUpdate};
pub use flow::{
    ConfigEntriesFlowManager, EntryCreator, OptionsFlowFactory, OptionsFlowManager,
    OptionsUpdater, SOURCE_OPTIONS,
};
pub use manager::{
    ConfigEntries, ConfigEntriesData, ConfigEntriesError, ConfigEntriesResult, STORAGE_KEY,
    STORAGE_MINOR_VERSION, STORAGE_VERSION,
};
pub use storage::{Storage, StorageError, StorageFile, StorageResult};
