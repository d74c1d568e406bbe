//! Options flow: edit an existing entry
//!
//! Same two steps as the config flow, starting from the entry's data, with
//! the title left alone. The finished record is stored as the entry's
//! options.

use async_trait::async_trait;
use std::sync::Arc;

use ha_config_entries::ConfigEntry;
use ha_data_entry_flow::{
    ConfigData, FlowContext, FlowError, FlowHandler, FlowManagerResult, FlowResult,
};

use crate::constants::*;
use crate::shared::{SharedConfigState, StepOutcome};
use crate::validators::{ConfigValidator, DefaultValidator};

pub struct OptionsFlowHandler {
    shared: SharedConfigState,
}

impl OptionsFlowHandler {
    pub fn new(entry: &ConfigEntry) -> Self {
        Self::with_validator(entry, Arc::new(DefaultValidator))
    }

    pub fn with_validator(entry: &ConfigEntry, validator: Arc<dyn ConfigValidator>) -> Self {
        Self {
            shared: SharedConfigState::with_validator(entry.data.clone(), validator),
        }
    }

    pub fn shared(&self) -> &SharedConfigState {
        &self.shared
    }

    async fn async_step_init(
        &mut self,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        match self.shared.step1_frequency(user_input.as_ref(), true) {
            StepOutcome::Advance => self.async_step_detail(None).await,
            StepOutcome::NeedsInput { schema, errors } => {
                Ok(FlowResult::form(STEP_INIT, schema, errors))
            }
        }
    }

    async fn async_step_detail(
        &mut self,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        match self.shared.step2_detail(user_input) {
            StepOutcome::NeedsInput { schema, .. } if schema.is_empty() => {
                Ok(FlowResult::create_entry("", self.shared.data().clone()))
            }
            StepOutcome::Advance => Ok(FlowResult::create_entry("", self.shared.data().clone())),
            StepOutcome::NeedsInput { schema, errors } => {
                Ok(FlowResult::form(STEP_DETAIL, schema, errors).with_last_step(true))
            }
        }
    }
}

#[async_trait]
impl FlowHandler for OptionsFlowHandler {
    fn handler(&self) -> &str {
        DOMAIN
    }

    fn init_step(&self, _context: &FlowContext) -> String {
        STEP_INIT.to_string()
    }

    async fn async_step(
        &mut self,
        step_id: &str,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        match step_id {
            STEP_INIT => self.async_step_init(user_input).await,
            STEP_DETAIL => self.async_step_detail(user_input).await,
            other => Err(FlowError::UnknownStep {
                handler: DOMAIN.to_string(),
                step_id: other.to_string(),
            }),
        }
    }
}

/// Options flow for entries that cannot be edited
#[derive(Debug, Default)]
pub struct EmptyOptions;

#[async_trait]
impl FlowHandler for EmptyOptions {
    fn handler(&self) -> &str {
        DOMAIN
    }

    fn init_step(&self, _context: &FlowContext) -> String {
        STEP_INIT.to_string()
    }

    async fn async_step(
        &mut self,
        _step_id: &str,
        _user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        Ok(FlowResult::abort(ABORT_NO_OPTIONS))
    }
}
