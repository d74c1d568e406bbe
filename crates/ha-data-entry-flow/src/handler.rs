//! Flow handler trait
//!
//! Integrations implement [`FlowHandler`] for both their config flow and
//! their options flow. The manager calls [`FlowHandler::async_step`] with the
//! step id of the form that was last shown, or the initial step when the
//! flow starts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FlowManagerResult;
use crate::result::FlowResult;
use crate::schema::ConfigData;

/// Flow started from the UI
pub const SOURCE_USER: &str = "user";
/// Flow started from YAML configuration
pub const SOURCE_IMPORT: &str = "import";

/// Information about why and for what a flow was started
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowContext {
    /// Origin of the flow (`user`, `import`, ...)
    pub source: String,
    /// Entry the flow operates on (options flows)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

impl FlowContext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entry_id: None,
        }
    }

    pub fn user() -> Self {
        Self::new(SOURCE_USER)
    }

    pub fn import() -> Self {
        Self::new(SOURCE_IMPORT)
    }

    pub fn with_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }
}

/// Trait for integration flow handlers
#[async_trait]
pub trait FlowHandler: Send {
    /// Integration domain
    fn handler(&self) -> &str;

    /// Version stamped on created entries
    fn version(&self) -> u32 {
        1
    }

    /// Step the flow starts in; config flows start in the step named after
    /// the source.
    fn init_step(&self, context: &FlowContext) -> String {
        context.source.clone()
    }

    /// Run `step_id` with the submitted input.
    ///
    /// `None` means the step is entered without a submission and should
    /// render its form.
    async fn async_step(
        &mut self,
        step_id: &str,
        user_input: Option<ConfigData>,
    ) -> FlowManagerResult<FlowResult>;
}
