//! Garbage Collection
//!
//! Config and options flows for the `garbage_collection` integration, which
//! describes a waste collection schedule.
//!
//! Setup runs in two steps: `user` picks the frequency and the common
//! parameters, `detail` asks for what that frequency needs (collection days,
//! a date, member entities, ...). The options flow repeats both steps on an
//! existing entry. Sensors defined in YAML are imported through the same
//! steps.
//!
//! # Key Types
//!
//! - [`SharedConfigState`] - Record and step logic shared by both flows
//! - [`GarbageCollectionFlowHandler`] - Config flow
//! - [`OptionsFlowHandler`] - Options flow, [`EmptyOptions`] for old entries
//! - [`Frequency`] - Schedule type chosen in step 1

pub mod config_flow;
pub mod constants;
pub mod frequency;
pub mod import;
pub mod options_flow;
pub mod shared;
pub mod validation;
pub mod validators;

pub use config_flow::{
    async_get_options_flow, options_flow_factory, GarbageCollectionFlowHandler,
    CONFIG_FLOW_VERSION,
};
pub use constants::DOMAIN;
pub use frequency::{Frequency, UnknownFrequency};
pub use import::{
    async_import_yaml, load_sensor_configs, parse_sensor_configs, ImportError, ImportResult,
    ImportSummary,
};
pub use options_flow::{EmptyOptions, OptionsFlowHandler};
pub use shared::{SharedConfigState, StepOutcome};
pub use validators::{ConfigValidator, DefaultValidator, Invalid};

use ha_config_entries::{
    ConfigEntries, ConfigEntriesError, ConfigEntriesResult, ConfigEntryUpdate, OptionsFlowManager,
};
use tracing::debug;

/// Register the options flow of this integration
pub fn async_setup(options: &OptionsFlowManager) {
    options.register(DOMAIN, options_flow_factory());
}

/// Apply options saved by the options flow.
///
/// The options hold the complete edited record, so they replace the entry
/// data and are cleared.
pub async fn async_update_listener(
    entries: &ConfigEntries,
    entry_id: &str,
) -> ConfigEntriesResult<()> {
    let entry = entries
        .get(entry_id)
        .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
    if entry.options.is_empty() {
        return Ok(());
    }

    debug!("Moving options of {} into its data", entry_id);
    entries
        .update(
            entry_id,
            ConfigEntryUpdate::new()
                .data(entry.options.clone())
                .options(Default::default()),
        )
        .await?;
    Ok(())
}
