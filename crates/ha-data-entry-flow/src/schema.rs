//! Form schemas
//!
//! A [`DataSchema`] is the ordered list of fields a flow step asks for. It is
//! rendered by the frontend (see [`FormField`]) and, when the form is
//! submitted, used by the manager to coerce the raw input before the handler
//! sees it.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::SchemaError;
use crate::result::{FieldDescription, FormField};

/// Field name to value mapping submitted to, or accumulated by, a flow.
pub type ConfigData = HashMap<String, Value>;

/// Whether a field must be present in the submitted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Required,
    Optional,
}

/// What to do with submitted keys the schema does not list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extra {
    /// Reject unknown keys
    #[default]
    Prevent,
    /// Pass unknown keys through untouched
    Allow,
}

/// Value validator/coercer attached to a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValidator {
    /// Free text; numbers are converted to their string form
    String,
    /// Strict boolean
    Boolean,
    /// One string out of a fixed list
    In(Vec<String>),
    /// Any subset of a fixed list; a single value is wrapped in a list
    MultiSelect(Vec<String>),
    /// Integer coerced from numbers or numeric strings, inclusive range
    IntRange { min: i64, max: i64 },
    /// List of integers in an inclusive range; a single value is wrapped
    IntList { min: i64, max: i64 },
    /// Entity ids as a list or comma separated string
    EntityIds,
    /// `YYYY-MM-DD` date
    Date,
}

impl FieldValidator {
    /// Frontend type name
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValidator::String => "string",
            FieldValidator::Boolean => "boolean",
            FieldValidator::In(_) => "select",
            FieldValidator::MultiSelect(_) => "multi_select",
            FieldValidator::IntRange { .. } => "integer",
            FieldValidator::IntList { .. } => "integer_list",
            FieldValidator::EntityIds => "entity_ids",
            FieldValidator::Date => "date",
        }
    }

    /// Validate `value` for `key`, returning the coerced value.
    pub fn coerce(&self, key: &str, value: &Value) -> Result<Value, SchemaError> {
        match self {
            FieldValidator::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                _ => Err(invalid_type(key, "str")),
            },
            FieldValidator::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err(invalid_type(key, "bool")),
            },
            FieldValidator::In(options) => {
                let s = value.as_str().ok_or_else(|| invalid_type(key, "str"))?;
                if options.iter().any(|o| o == s) {
                    Ok(value.clone())
                } else {
                    Err(SchemaError::NotInOptions {
                        key: key.to_string(),
                        options: options.clone(),
                    })
                }
            }
            FieldValidator::MultiSelect(options) => {
                let mut selected = Vec::new();
                for item in ensure_list(value) {
                    let s = item.as_str().ok_or_else(|| invalid_type(key, "str"))?;
                    if !options.iter().any(|o| o == s) {
                        return Err(SchemaError::NotInOptions {
                            key: key.to_string(),
                            options: options.clone(),
                        });
                    }
                    selected.push(Value::String(s.to_string()));
                }
                Ok(Value::Array(selected))
            }
            FieldValidator::IntRange { min, max } => {
                coerce_int(key, value, *min, *max).map(Value::from)
            }
            FieldValidator::IntList { min, max } => ensure_list(value)
                .iter()
                .map(|item| coerce_int(key, item, *min, *max).map(Value::from))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            FieldValidator::EntityIds => {
                let items: Vec<String> = match value {
                    Value::String(s) => s.split(',').map(|m| m.trim().to_string()).collect(),
                    Value::Array(items) => items
                        .iter()
                        .map(|i| {
                            i.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| invalid_type(key, "str"))
                        })
                        .collect::<Result<_, _>>()?,
                    Value::Null => Vec::new(),
                    _ => return Err(invalid_type(key, "list")),
                };
                let mut entity_ids = Vec::with_capacity(items.len());
                for item in items {
                    let entity_id = item.to_lowercase();
                    if !is_valid_entity_id(&entity_id) {
                        return Err(SchemaError::InvalidEntityId {
                            key: key.to_string(),
                            value: item,
                        });
                    }
                    entity_ids.push(Value::String(entity_id));
                }
                Ok(Value::Array(entity_ids))
            }
            FieldValidator::Date => {
                let s = value.as_str().ok_or_else(|| SchemaError::InvalidDate {
                    key: key.to_string(),
                })?;
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                    .map_err(|_| SchemaError::InvalidDate {
                        key: key.to_string(),
                    })
            }
        }
    }
}

fn invalid_type(key: &str, expected: &'static str) -> SchemaError {
    SchemaError::InvalidType {
        key: key.to_string(),
        expected,
    }
}

fn ensure_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

fn coerce_int(key: &str, value: &Value, min: i64, max: i64) -> Result<i64, SchemaError> {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid_type(key, "int"))?;

    if n < min || n > max {
        return Err(SchemaError::OutOfRange {
            key: key.to_string(),
            min,
            max,
        });
    }
    Ok(n)
}

/// `domain.object_id`, both lowercase alphanumeric with underscores, neither
/// starting nor ending with `_`, and no `__` in either part.
fn is_valid_entity_id(entity_id: &str) -> bool {
    let Some((domain, object_id)) = entity_id.split_once('.') else {
        return false;
    };
    let valid_part = |s: &str| {
        !s.is_empty()
            && !s.starts_with('_')
            && !s.ends_with('_')
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    };
    valid_part(domain) && valid_part(object_id) && !entity_id.contains("__")
}

/// A single field of a form
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub key: String,
    pub marker: Marker,
    /// Value pre-filled when the form is rendered
    pub suggested_value: Option<Value>,
    pub validator: FieldValidator,
}

impl SchemaField {
    pub fn new(key: impl Into<String>, marker: Marker) -> Self {
        Self {
            key: key.into(),
            marker,
            suggested_value: None,
            validator: FieldValidator::String,
        }
    }

    pub fn required(key: impl Into<String>) -> Self {
        Self::new(key, Marker::Required)
    }

    pub fn optional(key: impl Into<String>) -> Self {
        Self::new(key, Marker::Optional)
    }

    pub fn with_suggested_value(mut self, value: Value) -> Self {
        self.suggested_value = Some(value);
        self
    }

    pub fn validator(mut self, validator: FieldValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn is_required(&self) -> bool {
        self.marker == Marker::Required
    }

    /// Frontend representation of this field
    pub fn to_form_field(&self) -> FormField {
        let (options, value_min, value_max) = match &self.validator {
            FieldValidator::In(options) | FieldValidator::MultiSelect(options) => {
                (Some(options.clone()), None, None)
            }
            FieldValidator::IntRange { min, max } | FieldValidator::IntList { min, max } => {
                (None, Some(*min), Some(*max))
            }
            _ => (None, None, None),
        };
        FormField {
            name: self.key.clone(),
            field_type: self.validator.type_name().to_string(),
            required: self.is_required(),
            description: self.suggested_value.clone().map(|suggested_value| {
                FieldDescription {
                    suggested_value,
                }
            }),
            options,
            value_min,
            value_max,
        }
    }
}

/// Ordered set of form fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSchema {
    fields: Vec<SchemaField>,
    extra: Extra,
}

impl DataSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how unknown keys are treated during [`coerce`](Self::coerce)
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    /// Append a field, replacing any earlier field with the same key
    pub fn push(&mut self, field: SchemaField) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.key == field.key) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Field keys in form order
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn extra(&self) -> Extra {
        self.extra
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_form_fields(&self) -> Vec<FormField> {
        self.fields.iter().map(SchemaField::to_form_field).collect()
    }

    /// Validate submitted input, returning the coerced mapping.
    ///
    /// Optional fields that were not submitted stay absent; suggested values
    /// are never injected.
    pub fn coerce(&self, input: &ConfigData) -> Result<ConfigData, SchemaError> {
        let mut output = ConfigData::with_capacity(input.len());

        for field in &self.fields {
            match input.get(&field.key) {
                Some(value) => {
                    output.insert(field.key.clone(), field.validator.coerce(&field.key, value)?);
                }
                None if field.is_required() => {
                    return Err(SchemaError::Required(field.key.clone()));
                }
                None => {}
            }
        }

        for (key, value) in input {
            if self.contains(key) {
                continue;
            }
            match self.extra {
                Extra::Allow => {
                    output.insert(key.clone(), value.clone());
                }
                Extra::Prevent => return Err(SchemaError::ExtraKey(key.clone())),
            }
        }

        Ok(output)
    }
}

impl Serialize for DataSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_form_fields().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> ConfigData {
        serde_json::from_value(value).unwrap()
    }

    fn month_schema() -> DataSchema {
        let mut schema = DataSchema::new();
        schema.push(
            SchemaField::required("first_month")
                .validator(FieldValidator::In(vec!["jan".into(), "feb".into()])),
        );
        schema.push(
            SchemaField::optional("period")
                .validator(FieldValidator::IntRange { min: 1, max: 365 }),
        );
        schema
    }

    #[test]
    fn test_required_key_missing() {
        let err = month_schema().coerce(&data(json!({"period": 3}))).unwrap_err();
        assert_eq!(err, SchemaError::Required("first_month".to_string()));
    }

    #[test]
    fn test_optional_key_stays_absent() {
        let out = month_schema()
            .coerce(&data(json!({"first_month": "jan"})))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out.contains_key("period"));
    }

    #[test]
    fn test_extra_keys() {
        let input = data(json!({"first_month": "feb", "unexpected": true}));
        assert_eq!(
            month_schema().coerce(&input).unwrap_err(),
            SchemaError::ExtraKey("unexpected".to_string())
        );

        let out = month_schema()
            .with_extra(Extra::Allow)
            .coerce(&input)
            .unwrap();
        assert_eq!(out["unexpected"], json!(true));
    }

    #[test]
    fn test_int_coercion_and_range() {
        let v = FieldValidator::IntRange { min: 1, max: 52 };
        assert_eq!(v.coerce("first_week", &json!("7")).unwrap(), json!(7));
        assert_eq!(v.coerce("first_week", &json!(52)).unwrap(), json!(52));
        assert!(matches!(
            v.coerce("first_week", &json!(53)),
            Err(SchemaError::OutOfRange { min: 1, max: 52, .. })
        ));
        assert!(matches!(
            v.coerce("first_week", &json!("soon")),
            Err(SchemaError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_int_list_wraps_scalar() {
        let v = FieldValidator::IntList { min: 1, max: 5 };
        assert_eq!(v.coerce("week_order_number", &json!(2)).unwrap(), json!([2]));
        assert_eq!(
            v.coerce("week_order_number", &json!([1, "3"])).unwrap(),
            json!([1, 3])
        );
        assert!(v.coerce("week_order_number", &json!([6])).is_err());
    }

    #[test]
    fn test_multi_select() {
        let v = FieldValidator::MultiSelect(vec!["mon".into(), "tue".into()]);
        assert_eq!(v.coerce("collection_days", &json!("mon")).unwrap(), json!(["mon"]));
        assert!(matches!(
            v.coerce("collection_days", &json!(["mon", "fri"])),
            Err(SchemaError::NotInOptions { .. })
        ));
    }

    #[test]
    fn test_entity_ids() {
        let v = FieldValidator::EntityIds;
        assert_eq!(
            v.coerce("entities", &json!("sensor.paper, Sensor.Glass")).unwrap(),
            json!(["sensor.paper", "sensor.glass"])
        );
        assert_eq!(
            v.coerce("entities", &json!(["light.a"])).unwrap(),
            json!(["light.a"])
        );
        assert!(matches!(
            v.coerce("entities", &json!("not_an_entity")),
            Err(SchemaError::InvalidEntityId { .. })
        ));
        assert!(v.coerce("entities", &json!("my__domain.thing")).is_err());
        assert!(v.coerce("entities", &json!("light._hidden")).is_err());
        assert!(v.coerce("entities", &json!("light.a__b")).is_err());
        assert!(v.coerce("entities", &json!("light.a_b")).is_ok());
    }

    #[test]
    fn test_date() {
        let v = FieldValidator::Date;
        assert_eq!(v.coerce("first_date", &json!("2024-02-29")).unwrap(), json!("2024-02-29"));
        assert!(v.coerce("first_date", &json!("2023-02-29")).is_err());
        assert!(v.coerce("first_date", &json!(20240101)).is_err());
    }

    #[test]
    fn test_push_replaces_same_key() {
        let mut schema = DataSchema::new();
        schema.push(SchemaField::optional("icon_normal"));
        schema.push(SchemaField::required("icon_normal"));
        assert_eq!(schema.len(), 1);
        assert!(schema.get("icon_normal").unwrap().is_required());
    }

    #[test]
    fn test_serialize_form_fields() {
        let mut schema = month_schema();
        schema.push(
            SchemaField::optional("icon_today").with_suggested_value(json!("mdi:delete-restore")),
        );
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json[0]["name"], "first_month");
        assert_eq!(json[0]["type"], "select");
        assert_eq!(json[0]["required"], true);
        assert_eq!(json[0]["options"], json!(["jan", "feb"]));
        assert_eq!(json[1]["valueMin"], 1);
        assert_eq!(json[1]["valueMax"], 365);
        assert_eq!(
            json[2]["description"]["suggested_value"],
            "mdi:delete-restore"
        );
    }
}
