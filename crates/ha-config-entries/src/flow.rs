//! Config and options flow managers
//!
//! Both wrap a [`FlowManager`] whose finisher writes into [`ConfigEntries`]:
//! a finished config flow becomes a new entry, a finished options flow
//! replaces the options of the entry it was started for.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use ha_data_entry_flow::{
    ConfigData, FlowContext, FlowError, FlowFinisher, FlowHandler, FlowManager,
    FlowManagerResult, FlowProgress, FlowResult,
};

use crate::entry::{ConfigEntry, ConfigEntrySource, ConfigEntryUpdate};
use crate::manager::{ConfigEntries, ConfigEntriesError, ConfigEntriesResult};

/// Context source of options flows
pub const SOURCE_OPTIONS: &str = "options";

/// Builds the options flow handler for an entry of one domain
pub type OptionsFlowFactory = Arc<dyn Fn(&ConfigEntry) -> Box<dyn FlowHandler> + Send + Sync>;

fn finish_error(result: &FlowResult, reason: impl ToString) -> FlowError {
    FlowError::Finish {
        flow_id: result.flow_id.clone(),
        reason: reason.to_string(),
    }
}

/// Turns `create_entry` results into stored config entries
pub struct EntryCreator {
    entries: Arc<ConfigEntries>,
}

#[async_trait]
impl FlowFinisher for EntryCreator {
    async fn async_finish_flow(
        &self,
        context: &FlowContext,
        mut result: FlowResult,
    ) -> FlowManagerResult<FlowResult> {
        if !result.is_create_entry() {
            return Ok(result);
        }

        let source = context.source.parse().unwrap_or_else(|e| {
            warn!("{}, storing entry as user", e);
            ConfigEntrySource::User
        });
        let data = result.data.clone().unwrap_or_default();
        let mut entry = ConfigEntry::new(&result.handler, result.title.clone().unwrap_or_default())
            .with_version(result.version.unwrap_or(1))
            .with_source(source);
        if let Some(unique_id) = data.get("unique_id").and_then(|id| id.as_str()) {
            entry = entry.with_unique_id(unique_id);
        }
        let entry = entry.with_data(data);

        let entry = self
            .entries
            .add(entry)
            .await
            .map_err(|e| finish_error(&result, e))?;
        result.result = Some(serde_json::to_value(&entry).map_err(|e| finish_error(&result, e))?);
        Ok(result)
    }
}

/// Runs config flows and stores what they create
pub struct ConfigEntriesFlowManager {
    flows: FlowManager<EntryCreator>,
}

impl ConfigEntriesFlowManager {
    pub fn new(entries: Arc<ConfigEntries>) -> Self {
        Self {
            flows: FlowManager::new(EntryCreator { entries }),
        }
    }

    pub async fn async_init(
        &self,
        handler: Box<dyn FlowHandler>,
        context: FlowContext,
        data: Option<ConfigData>,
    ) -> ConfigEntriesResult<FlowResult> {
        Ok(self.flows.async_init(handler, context, data).await?)
    }

    pub async fn async_configure(
        &self,
        flow_id: &str,
        user_input: Option<ConfigData>,
    ) -> ConfigEntriesResult<FlowResult> {
        Ok(self.flows.async_configure(flow_id, user_input).await?)
    }

    pub async fn async_abort(&self, flow_id: &str) -> ConfigEntriesResult<()> {
        Ok(self.flows.async_abort(flow_id).await?)
    }

    pub async fn async_progress(&self) -> Vec<FlowProgress> {
        self.flows.async_progress().await
    }
}

/// Writes `create_entry` data into the options of the flow's entry
pub struct OptionsUpdater {
    entries: Arc<ConfigEntries>,
}

#[async_trait]
impl FlowFinisher for OptionsUpdater {
    async fn async_finish_flow(
        &self,
        context: &FlowContext,
        mut result: FlowResult,
    ) -> FlowManagerResult<FlowResult> {
        if !result.is_create_entry() {
            return Ok(result);
        }

        let entry_id = context
            .entry_id
            .as_deref()
            .ok_or_else(|| finish_error(&result, "options flow has no entry_id"))?;
        let options = result.data.clone().unwrap_or_default();
        let entry = self
            .entries
            .update(entry_id, ConfigEntryUpdate::new().options(options))
            .await
            .map_err(|e| finish_error(&result, e))?;

        debug!("Stored options for entry {}", entry_id);
        result.result = Some(serde_json::to_value(&entry).map_err(|e| finish_error(&result, e))?);
        Ok(result)
    }
}

/// Runs options flows for existing entries
pub struct OptionsFlowManager {
    entries: Arc<ConfigEntries>,
    factories: DashMap<String, OptionsFlowFactory>,
    flows: FlowManager<OptionsUpdater>,
}

impl OptionsFlowManager {
    pub fn new(entries: Arc<ConfigEntries>) -> Self {
        Self {
            flows: FlowManager::new(OptionsUpdater {
                entries: entries.clone(),
            }),
            entries,
            factories: DashMap::new(),
        }
    }

    /// Register the options flow factory for `domain`
    pub fn register(&self, domain: &str, factory: OptionsFlowFactory) {
        self.factories.insert(domain.to_string(), factory);
        debug!("Registered options flow for domain: {}", domain);
    }

    /// Start the options flow of `entry_id`
    pub async fn async_init(&self, entry_id: &str) -> ConfigEntriesResult<FlowResult> {
        let entry = self
            .entries
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        let factory = self
            .factories
            .get(&entry.domain)
            .map(|f| f.value().clone())
            .ok_or_else(|| ConfigEntriesError::NoOptionsFlow(entry.domain.clone()))?;

        let context = FlowContext::new(SOURCE_OPTIONS).with_entry_id(entry_id);
        Ok(self.flows.async_init(factory(&entry), context, None).await?)
    }

    pub async fn async_configure(
        &self,
        flow_id: &str,
        user_input: Option<ConfigData>,
    ) -> ConfigEntriesResult<FlowResult> {
        Ok(self.flows.async_configure(flow_id, user_input).await?)
    }

    pub async fn async_abort(&self, flow_id: &str) -> ConfigEntriesResult<()> {
        Ok(self.flows.async_abort(flow_id).await?)
    }

    pub async fn async_progress(&self) -> Vec<FlowProgress> {
        self.flows.async_progress().await
    }
}
