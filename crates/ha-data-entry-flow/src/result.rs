//! Flow step results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::schema::{ConfigData, DataSchema};

/// Kind of step outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowResultType {
    /// Show a form and wait for input
    Form,
    /// Flow finished with data to persist
    CreateEntry,
    /// Flow finished without creating anything
    Abort,
}

/// Result of a flow step
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    /// Flow ID (filled in by the manager)
    pub flow_id: String,
    /// Handler (integration domain, filled in by the manager)
    pub handler: String,
    #[serde(rename = "type")]
    pub result_type: FlowResultType,
    /// Current step ID (for form type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// Data schema for the form; empty for other result types
    pub data_schema: DataSchema,
    /// Errors from the previous submission, null if none
    pub errors: Option<HashMap<String, String>>,
    /// Description placeholders for the form, null if none
    pub description_placeholders: Option<HashMap<String, String>>,
    /// Title (for create_entry type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Entry data (for create_entry type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ConfigData>,
    /// Abort reason (for abort type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Handler version (for create_entry type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Whatever the finisher produced, e.g. the persisted entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Whether this is the last step (controls submit vs next button in frontend)
    pub last_step: Option<bool>,
}

impl FlowResult {
    fn empty(result_type: FlowResultType) -> Self {
        Self {
            flow_id: String::new(),
            handler: String::new(),
            result_type,
            step_id: None,
            data_schema: DataSchema::new(),
            errors: None,
            description_placeholders: None,
            title: None,
            data: None,
            reason: None,
            version: None,
            result: None,
            last_step: None,
        }
    }

    /// Ask the frontend to render `data_schema` for `step_id`
    pub fn form(
        step_id: impl Into<String>,
        data_schema: DataSchema,
        errors: HashMap<String, String>,
    ) -> Self {
        Self {
            step_id: Some(step_id.into()),
            data_schema,
            errors: if errors.is_empty() { None } else { Some(errors) },
            ..Self::empty(FlowResultType::Form)
        }
    }

    /// Finish the flow with data to persist
    pub fn create_entry(title: impl Into<String>, data: ConfigData) -> Self {
        Self {
            title: Some(title.into()),
            data: Some(data),
            ..Self::empty(FlowResultType::CreateEntry)
        }
    }

    /// Finish the flow without creating anything
    pub fn abort(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::empty(FlowResultType::Abort)
        }
    }

    pub fn with_last_step(mut self, last_step: bool) -> Self {
        self.last_step = Some(last_step);
        self
    }

    pub fn is_form(&self) -> bool {
        self.result_type == FlowResultType::Form
    }

    pub fn is_create_entry(&self) -> bool {
        self.result_type == FlowResultType::CreateEntry
    }

    pub fn is_abort(&self) -> bool {
        self.result_type == FlowResultType::Abort
    }

    /// Error code reported under `base`, if any
    pub fn base_error(&self) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|e| e.get("base"))
            .map(String::as_str)
    }
}

/// Extra information attached to a form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub suggested_value: serde_json::Value,
}

/// Form field as sent to the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "valueMin", skip_serializing_if = "Option::is_none")]
    pub value_min: Option<i64>,
    #[serde(rename = "valueMax", skip_serializing_if = "Option::is_none")]
    pub value_max: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaField;
    use serde_json::json;

    #[test]
    fn test_form_without_errors_serializes_null() {
        let mut schema = DataSchema::new();
        schema.push(SchemaField::required("name"));
        let result = FlowResult::form("user", schema, HashMap::new());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "form");
        assert_eq!(json["step_id"], "user");
        assert_eq!(json["errors"], serde_json::Value::Null);
        assert_eq!(json["data_schema"][0]["name"], "name");
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_form_with_errors() {
        let errors = HashMap::from([("base".to_string(), "icon".to_string())]);
        let result = FlowResult::form("user", DataSchema::new(), errors);
        assert!(result.is_form());
        assert_eq!(result.base_error(), Some("icon"));
    }

    #[test]
    fn test_create_entry_and_abort() {
        let data: ConfigData = serde_json::from_value(json!({"frequency": "weekly"})).unwrap();
        let created = FlowResult::create_entry("Paper", data);
        assert!(created.is_create_entry());
        assert_eq!(created.title.as_deref(), Some("Paper"));
        assert_eq!(serde_json::to_value(&created).unwrap()["type"], "create_entry");

        let aborted = FlowResult::abort("no_options");
        assert!(aborted.is_abort());
        assert_eq!(aborted.reason.as_deref(), Some("no_options"));
        assert_eq!(aborted.data_schema.len(), 0);
    }
}
