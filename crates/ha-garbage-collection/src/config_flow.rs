//! Config flow: create a garbage collection entry
//!
//! Two steps, `user` then `detail`, plus `import` for sensors defined in
//! YAML. Every flow seeds its record with a fresh `unique_id`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use ha_config_entries::{ConfigEntry, OptionsFlowFactory};
use ha_data_entry_flow::{
    ConfigData, DataSchema, Extra, FlowError, FlowHandler, FlowManagerResult, FlowResult,
};

use crate::constants::*;
use crate::options_flow::{EmptyOptions, OptionsFlowHandler};
use crate::shared::{SharedConfigState, StepOutcome};
use crate::validators::{ConfigValidator, DefaultValidator};

/// Version stamped on entries this flow creates
pub const CONFIG_FLOW_VERSION: u32 = 1;

pub struct GarbageCollectionFlowHandler {
    shared: SharedConfigState,
}

impl Default for GarbageCollectionFlowHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl GarbageCollectionFlowHandler {
    pub fn new() -> Self {
        Self::with_validator(Arc::new(DefaultValidator))
    }

    pub fn with_validator(validator: Arc<dyn ConfigValidator>) -> Self {
        let mut seed = ConfigData::new();
        seed.insert(
            CONF_UNIQUE_ID.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        Self {
            shared: SharedConfigState::with_validator(seed, validator),
        }
    }

    pub fn shared(&self) -> &SharedConfigState {
        &self.shared
    }

    /// Step 1: frequency and common parameters
    async fn async_step_user(
        &mut self,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        match self.shared.step1_frequency(user_input.as_ref(), false) {
            StepOutcome::Advance => self.async_step_detail(None).await,
            StepOutcome::NeedsInput { schema, errors } => Ok(FlowResult::form(
                STEP_USER,
                schema.with_extra(Extra::Allow),
                errors,
            )),
        }
    }

    /// Step 2: frequency specific detail
    async fn async_step_detail(
        &mut self,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        match self.shared.step2_detail(user_input) {
            // nothing to ask for, e.g. blank without verbose state
            StepOutcome::NeedsInput { schema, .. } if schema.is_empty() => Ok(self.create_entry()),
            StepOutcome::Advance => Ok(self.create_entry()),
            StepOutcome::NeedsInput { schema, errors } => Ok(FlowResult::form(
                STEP_DETAIL,
                schema.with_extra(Extra::Allow),
                errors,
            )
            .with_last_step(true)),
        }
    }

    fn create_entry(&self) -> FlowResult {
        FlowResult::create_entry(
            self.shared.name().unwrap_or_default(),
            self.shared.data().clone(),
        )
    }

    /// Create an entry from a YAML sensor definition.
    ///
    /// The whole mapping goes through step 1 and then, if accepted, through
    /// step 2. Required fields left out of the YAML take their suggested
    /// value. A definition that fails the icon or time check leaves the flow
    /// on the `user` form.
    async fn async_step_import(
        &mut self,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        debug!("Importing config for {:?}", user_input);
        let mut input = user_input.unwrap_or_default();

        let schema = self.shared.step1_schema(None, false);
        fill_required(&schema, &mut input);
        let mut input = schema.with_extra(Extra::Allow).coerce(&input)?;
        match self.shared.step1_frequency(Some(&input), false) {
            StepOutcome::Advance => {}
            StepOutcome::NeedsInput { schema, errors } => {
                return Ok(FlowResult::form(
                    STEP_USER,
                    schema.with_extra(Extra::Allow),
                    errors,
                ))
            }
        }

        let schema = self.shared.step2_schema();
        fill_required(&schema, &mut input);
        let input = schema.with_extra(Extra::Allow).coerce(&input)?;
        self.async_step_detail(Some(input)).await
    }
}

/// Give required fields missing from `input` their suggested value
fn fill_required(schema: &DataSchema, input: &mut ConfigData) {
    for field in schema.fields().iter().filter(|f| f.is_required()) {
        if let Some(value) = &field.suggested_value {
            input
                .entry(field.key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

#[async_trait]
impl FlowHandler for GarbageCollectionFlowHandler {
    fn handler(&self) -> &str {
        DOMAIN
    }

    fn version(&self) -> u32 {
        CONFIG_FLOW_VERSION
    }

    async fn async_step(
        &mut self,
        step_id: &str,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        match step_id {
            STEP_USER => self.async_step_user(user_input).await,
            STEP_DETAIL => self.async_step_detail(user_input).await,
            STEP_IMPORT => self.async_step_import(user_input).await,
            other => Err(FlowError::UnknownStep {
                handler: DOMAIN.to_string(),
                step_id: other.to_string(),
            }),
        }
    }
}

/// Options flow for `entry`.
///
/// Entries without a `unique_id` in their data predate the config flow and
/// cannot be edited.
pub fn async_get_options_flow(entry: &ConfigEntry) -> Box<dyn FlowHandler> {
    let has_unique_id = entry
        .data
        .get(CONF_UNIQUE_ID)
        .is_some_and(|id| !id.is_null());
    if has_unique_id {
        Box::new(OptionsFlowHandler::new(entry))
    } else {
        Box::new(EmptyOptions)
    }
}

/// Factory to register with the options flow manager
pub fn options_flow_factory() -> OptionsFlowFactory {
    Arc::new(async_get_options_flow)
}
