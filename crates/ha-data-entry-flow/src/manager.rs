//! Flow Manager
//!
//! Keeps in-progress flows addressable by `flow_id`. Each flow owns its
//! handler, so no state is shared between flows; the manager only holds the
//! map. Finished flows are removed and passed to a [`FlowFinisher`].

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use ulid::Ulid;

use crate::error::{FlowError, FlowManagerResult};
use crate::handler::{FlowContext, FlowHandler};
use crate::result::{FlowResult, FlowResultType};
use crate::schema::{ConfigData, DataSchema};

/// Receives flows that finished with `create_entry` or `abort`
#[async_trait]
pub trait FlowFinisher: Send + Sync {
    async fn async_finish_flow(
        &self,
        context: &FlowContext,
        result: FlowResult,
    ) -> FlowManagerResult<FlowResult>;
}

/// Finisher that returns the result unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFinisher;

#[async_trait]
impl FlowFinisher for PassthroughFinisher {
    async fn async_finish_flow(
        &self,
        _context: &FlowContext,
        result: FlowResult,
    ) -> FlowManagerResult<FlowResult> {
        Ok(result)
    }
}

/// Summary of a flow waiting for input
#[derive(Debug, Clone, Serialize)]
pub struct FlowProgress {
    pub flow_id: String,
    pub handler: String,
    pub step_id: String,
    pub context: FlowContext,
}

struct ActiveFlow {
    handler: Box<dyn FlowHandler>,
    context: FlowContext,
    /// Step that will receive the next submission
    step_id: String,
    /// Schema of the form last shown
    schema: Option<DataSchema>,
}

/// Drives flows step by step
pub struct FlowManager<F> {
    finisher: F,
    flows: Mutex<HashMap<String, ActiveFlow>>,
}

impl<F: FlowFinisher> FlowManager<F> {
    pub fn new(finisher: F) -> Self {
        Self {
            finisher,
            flows: Mutex::new(HashMap::new()),
        }
    }

    pub fn finisher(&self) -> &F {
        &self.finisher
    }

    /// Start a flow and run its initial step
    ///
    /// `data` is passed to the initial step as-is; import flows use it to
    /// submit a complete configuration in one go.
    pub async fn async_init(
        &self,
        mut handler: Box<dyn FlowHandler>,
        context: FlowContext,
        data: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        let flow_id = Ulid::new().to_string();
        let step_id = handler.init_step(&context);

        info!(
            "Starting {} flow {} for {} at step {}",
            context.source,
            flow_id,
            handler.handler(),
            step_id
        );

        let result = handler.async_step(&step_id, data).await?;
        let flow = ActiveFlow {
            handler,
            context,
            step_id,
            schema: None,
        };
        self.handle_result(flow_id, flow, result).await
    }

    /// Submit input to the step the flow is waiting on
    pub async fn async_configure(
        &self,
        flow_id: &str,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult> {
        let mut flow = self
            .flows
            .lock()
            .await
            .remove(flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;

        debug!("Progressing flow {} at step {}", flow_id, flow.step_id);

        let user_input = match (&flow.schema, user_input) {
            (Some(schema), Some(input)) => match schema.coerce(&input) {
                Ok(coerced) => Some(coerced),
                Err(e) => {
                    // Bad input leaves the flow on the same form
                    self.flows.lock().await.insert(flow_id.to_string(), flow);
                    return Err(e.into());
                }
            },
            (_, input) => input,
        };

        let step_id = flow.step_id.clone();
        let result = match flow.handler.async_step(&step_id, user_input).await {
            Ok(result) => result,
            Err(e) => {
                self.flows.lock().await.insert(flow_id.to_string(), flow);
                return Err(e);
            }
        };

        self.handle_result(flow_id.to_string(), flow, result).await
    }

    /// Drop a flow without finishing it
    pub async fn async_abort(&self, flow_id: &str) -> FlowManagerResult<()> {
        self.flows
            .lock()
            .await
            .remove(flow_id)
            .map(|_| debug!("Aborted flow {}", flow_id))
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))
    }

    /// Flows waiting for input
    pub async fn async_progress(&self) -> Vec<FlowProgress> {
        self.flows
            .lock()
            .await
            .iter()
            .map(|(flow_id, flow)| FlowProgress {
                flow_id: flow_id.clone(),
                handler: flow.handler.handler().to_string(),
                step_id: flow.step_id.clone(),
                context: flow.context.clone(),
            })
            .collect()
    }

    async fn handle_result(
        &self,
        flow_id: String,
        mut flow: ActiveFlow,
        mut result: FlowResult,
    ) -> FlowManagerResult<FlowResult> {
        result.flow_id = flow_id.clone();
        result.handler = flow.handler.handler().to_string();

        match result.result_type {
            FlowResultType::Form => {
                if let Some(step_id) = &result.step_id {
                    flow.step_id = step_id.clone();
                }
                flow.schema = Some(result.data_schema.clone());
                self.flows.lock().await.insert(flow_id, flow);
                Ok(result)
            }
            FlowResultType::CreateEntry => {
                result.version = Some(flow.handler.version());
                info!("Flow {} for {} created an entry", flow_id, result.handler);
                self.finisher.async_finish_flow(&flow.context, result).await
            }
            FlowResultType::Abort => {
                info!(
                    "Flow {} for {} aborted: {}",
                    flow_id,
                    result.handler,
                    result.reason.as_deref().unwrap_or("unknown")
                );
                self.finisher.async_finish_flow(&flow.context, result).await
            }
        }
    }
}
