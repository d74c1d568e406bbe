//! Configuration shared by the config flow, the options flow and YAML import
//!
//! [`SharedConfigState`] accumulates the record across the two steps and
//! derives each step's form. Step 1 collects the frequency and the common
//! parameters; step 2 asks for the detail that frequency needs.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use ha_data_entry_flow::{ConfigData, DataSchema, FieldValidator, SchemaField};

use crate::constants::*;
use crate::frequency::Frequency;
use crate::validation::string_to_list;
use crate::validators::{ConfigValidator, DefaultValidator};

/// Outcome of evaluating a step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Show the step's form (again)
    NeedsInput {
        schema: DataSchema,
        errors: HashMap<String, String>,
    },
    /// The step is complete
    Advance,
}

impl StepOutcome {
    pub fn is_advance(&self) -> bool {
        matches!(self, StepOutcome::Advance)
    }
}

fn defaults() -> ConfigData {
    [
        (CONF_FREQUENCY, json!(DEFAULT_FREQUENCY)),
        (CONF_ICON_NORMAL, json!(DEFAULT_ICON_NORMAL)),
        (CONF_ICON_TODAY, json!(DEFAULT_ICON_TODAY)),
        (CONF_ICON_TOMORROW, json!(DEFAULT_ICON_TOMORROW)),
        (CONF_VERBOSE_STATE, json!(DEFAULT_VERBOSE_STATE)),
        (CONF_HIDDEN, json!(false)),
        (CONF_MANUAL, json!(false)),
        (CONF_FIRST_MONTH, json!(DEFAULT_FIRST_MONTH)),
        (CONF_LAST_MONTH, json!(DEFAULT_LAST_MONTH)),
        (CONF_PERIOD, json!(DEFAULT_PERIOD)),
        (CONF_FIRST_WEEK, json!(DEFAULT_FIRST_WEEK)),
        (CONF_VERBOSE_FORMAT, json!(DEFAULT_VERBOSE_FORMAT)),
        (CONF_DATE_FORMAT, json!(DEFAULT_DATE_FORMAT)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

/// Text of a submitted value, as the validators see it
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn options_of(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Accumulated configuration of one flow
pub struct SharedConfigState {
    data: ConfigData,
    name: Option<String>,
    errors: HashMap<String, String>,
    defaults: ConfigData,
    validator: Arc<dyn ConfigValidator>,
}

impl SharedConfigState {
    pub fn new(data: ConfigData) -> Self {
        Self::with_validator(data, Arc::new(DefaultValidator))
    }

    pub fn with_validator(data: ConfigData, validator: Arc<dyn ConfigValidator>) -> Self {
        Self {
            data,
            name: None,
            errors: HashMap::new(),
            defaults: defaults(),
            validator,
        }
    }

    /// Merge `user_input` into the record.
    ///
    /// Keys submitted as an empty string are removed so their default
    /// applies again. `name` is moved out of the record into the title.
    pub fn update(&mut self, user_input: &ConfigData) {
        for (key, value) in user_input {
            if value.as_str() == Some("") {
                self.data.remove(key);
            } else {
                self.data.insert(key.clone(), value.clone());
            }
        }
        if let Some(name) = self.data.remove(CONF_NAME) {
            self.name = Some(value_text(&name));
        }
    }

    /// Suggested value: in-progress input, then record, then default
    fn suggested_value(&self, key: &str, overrides: Option<&ConfigData>) -> Option<Value> {
        overrides
            .and_then(|o| o.get(key))
            .or_else(|| self.data.get(key))
            .or_else(|| self.defaults.get(key))
            .cloned()
    }

    fn field(&self, field: SchemaField, overrides: Option<&ConfigData>) -> SchemaField {
        match self.suggested_value(&field.key, overrides) {
            Some(value) => field.with_suggested_value(value),
            None => field,
        }
    }

    /// Required field with its suggested value
    pub fn required(&self, key: &str, overrides: Option<&ConfigData>) -> SchemaField {
        self.field(SchemaField::required(key), overrides)
    }

    /// Optional field with its suggested value
    pub fn optional(&self, key: &str, overrides: Option<&ConfigData>) -> SchemaField {
        self.field(SchemaField::optional(key), overrides)
    }

    /// Step 1 form. The options flow leaves out `name`: the title of an
    /// existing entry is not changed here.
    pub fn step1_schema(&self, overrides: Option<&ConfigData>, options: bool) -> DataSchema {
        let mut schema = DataSchema::new();
        if !options {
            schema.push(self.required(CONF_NAME, overrides));
        }
        schema.push(
            self.required(CONF_FREQUENCY, overrides)
                .validator(FieldValidator::In(Frequency::options())),
        );
        for key in [
            CONF_ICON_NORMAL,
            CONF_ICON_TODAY,
            CONF_ICON_TOMORROW,
            CONF_EXPIRE_AFTER,
        ] {
            schema.push(self.optional(key, overrides));
        }
        for key in [CONF_VERBOSE_STATE, CONF_HIDDEN, CONF_MANUAL] {
            schema.push(
                self.optional(key, overrides)
                    .validator(FieldValidator::Boolean),
            );
        }
        schema
    }

    /// Step 1 - choose frequency and common parameters
    pub fn step1_frequency(
        &mut self,
        user_input: Option<&ConfigData>,
        options: bool,
    ) -> StepOutcome {
        self.errors.clear();

        if let Some(input) = user_input {
            let icons = [
                (CONF_ICON_NORMAL, DEFAULT_ICON_NORMAL),
                (CONF_ICON_TODAY, DEFAULT_ICON_TODAY),
                (CONF_ICON_TOMORROW, DEFAULT_ICON_TOMORROW),
            ];
            let icon_check = icons.iter().try_for_each(|(key, default)| {
                let icon = match input.get(*key) {
                    None | Some(Value::Null) => default.to_string(),
                    Some(value) => value_text(value),
                };
                self.validator.icon(&icon)
            });
            if let Err(e) = icon_check {
                debug!("Rejected icon: {}", e);
                self.errors.insert("base".to_string(), ERROR_ICON.to_string());
            }

            let expire_after = match input.get(CONF_EXPIRE_AFTER) {
                None | Some(Value::Null) => String::new(),
                Some(value) => value_text(value),
            };
            if let Err(e) = self.validator.time(&expire_after) {
                debug!("Rejected {}: {}", CONF_EXPIRE_AFTER, e);
                self.errors.insert("base".to_string(), ERROR_TIME.to_string());
            }

            if self.errors.is_empty() {
                self.update(input);
                return StepOutcome::Advance;
            }
        }

        StepOutcome::NeedsInput {
            schema: self.step1_schema(user_input, options),
            errors: self.errors.clone(),
        }
    }

    /// Step 2 form for the committed frequency
    pub fn step2_schema(&self) -> DataSchema {
        let frequency = self.frequency().unwrap_or_default();
        let mut schema = DataSchema::new();

        if frequency.is_annual() {
            schema.push(self.required(CONF_DATE, None));
        } else if frequency.is_group() {
            schema.push(
                self.required(CONF_ENTITIES, None)
                    .validator(FieldValidator::EntityIds),
            );
        } else if !frequency.is_blank() {
            schema.push(
                self.required(CONF_COLLECTION_DAYS, None)
                    .validator(FieldValidator::MultiSelect(options_of(&WEEKDAYS))),
            );
            for key in [CONF_FIRST_MONTH, CONF_LAST_MONTH] {
                schema.push(
                    self.required(key, None)
                        .validator(FieldValidator::In(options_of(&MONTH_OPTIONS))),
                );
            }
            if frequency.is_monthly() {
                let (min, max) = ORDER_NUMBER_RANGE;
                for key in [CONF_WEEKDAY_ORDER_NUMBER, CONF_WEEK_ORDER_NUMBER] {
                    schema.push(
                        self.optional(key, None)
                            .validator(FieldValidator::IntList { min, max }),
                    );
                }
            }
            if frequency.has_period() {
                let (min, max) = PERIOD_RANGE;
                schema.push(
                    self.required(CONF_PERIOD, None)
                        .validator(FieldValidator::IntRange { min, max }),
                );
            }
            if frequency.is_every_n_weeks() {
                let (min, max) = FIRST_WEEK_RANGE;
                schema.push(
                    self.required(CONF_FIRST_WEEK, None)
                        .validator(FieldValidator::IntRange { min, max }),
                );
            }
            if frequency.is_daily() {
                schema.push(
                    self.required(CONF_FIRST_DATE, None)
                        .validator(FieldValidator::Date),
                );
            }
        }

        if self.verbose_state() {
            schema.push(self.required(CONF_VERBOSE_FORMAT, None));
            schema.push(self.required(CONF_DATE_FORMAT, None));
        }
        schema
    }

    /// Step 2 - enter the detail that depends on frequency.
    ///
    /// Name and frequency are committed by step 1 and ignored here.
    pub fn step2_detail(&mut self, user_input: Option<ConfigData>) -> StepOutcome {
        self.errors.clear();

        let user_input = user_input.map(|mut input| {
            input.remove(CONF_FREQUENCY);
            input.remove(CONF_NAME);
            input
        });
        match user_input {
            Some(mut input) if !input.is_empty() => {
                if self.frequency().unwrap_or_default().is_group() {
                    let entities = string_to_list(input.get(CONF_ENTITIES));
                    input.insert(CONF_ENTITIES.to_string(), entities);
                }
                self.update(&input);
                StepOutcome::Advance
            }
            _ => StepOutcome::NeedsInput {
                schema: self.step2_schema(),
                errors: self.errors.clone(),
            },
        }
    }

    /// Frequency in the record, `None` if unset or not recognised
    pub fn frequency(&self) -> Option<Frequency> {
        let value = self.data.get(CONF_FREQUENCY)?.as_str()?;
        match value.parse() {
            Ok(frequency) => Some(frequency),
            Err(e) => {
                warn!("{}, using {}", e, Frequency::default());
                None
            }
        }
    }

    fn verbose_state(&self) -> bool {
        self.data
            .get(CONF_VERBOSE_STATE)
            .and_then(Value::as_bool)
            .unwrap_or(DEFAULT_VERBOSE_STATE)
    }

    /// The accumulated record
    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Title extracted from `name`
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Errors of the last step evaluation
    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::Invalid;

    fn data(value: Value) -> ConfigData {
        serde_json::from_value(value).unwrap()
    }

    fn keys(outcome: &StepOutcome) -> Vec<&str> {
        match outcome {
            StepOutcome::NeedsInput { schema, .. } => schema.keys(),
            StepOutcome::Advance => panic!("expected a form"),
        }
    }

    fn state_for(frequency: Frequency, verbose: bool) -> SharedConfigState {
        SharedConfigState::new(data(json!({
            "frequency": frequency.as_str(),
            "verbose_state": verbose,
        })))
    }

    /// Accepts everything; the core runs without platform rules
    struct AcceptAll;

    impl ConfigValidator for AcceptAll {
        fn icon(&self, _value: &str) -> Result<(), Invalid> {
            Ok(())
        }

        fn time(&self, _value: &str) -> Result<(), Invalid> {
            Ok(())
        }
    }

    #[test]
    fn test_update_removes_empty_and_extracts_name() {
        let mut state = SharedConfigState::new(data(json!({"icon_today": "mdi:bell"})));
        state.update(&data(json!({
            "name": "Paper",
            "icon_today": "",
            "frequency": "weekly"
        })));

        assert_eq!(state.name(), Some("Paper"));
        assert!(!state.data().contains_key("name"));
        assert!(!state.data().contains_key("icon_today"));
        assert_eq!(state.data()["frequency"], json!("weekly"));
    }

    #[test]
    fn test_suggested_value_priority() {
        let state = SharedConfigState::new(data(json!({"first_month": "mar"})));

        // default only
        let field = state.optional(CONF_PERIOD, None);
        assert_eq!(field.suggested_value, Some(json!(DEFAULT_PERIOD)));

        // override beats default
        let overrides = data(json!({"period": 4}));
        let field = state.optional(CONF_PERIOD, Some(&overrides));
        assert_eq!(field.suggested_value, Some(json!(4)));

        // record beats default, override beats record
        assert_eq!(
            state.required(CONF_FIRST_MONTH, None).suggested_value,
            Some(json!("mar"))
        );
        let overrides = data(json!({"first_month": "apr"}));
        assert_eq!(
            state.required(CONF_FIRST_MONTH, Some(&overrides)).suggested_value,
            Some(json!("apr"))
        );

        // nothing known
        assert_eq!(state.required(CONF_ENTITIES, None).suggested_value, None);
    }

    #[test]
    fn test_step1_form_without_input() {
        let mut state = SharedConfigState::new(ConfigData::new());
        let outcome = state.step1_frequency(None, false);
        assert_eq!(
            keys(&outcome),
            vec![
                "name",
                "frequency",
                "icon_normal",
                "icon_today",
                "icon_tomorrow",
                "expire_after",
                "verbose_state",
                "hidden",
                "manual_update"
            ]
        );
        if let StepOutcome::NeedsInput { schema, errors } = outcome {
            assert!(errors.is_empty());
            assert!(schema.get("name").unwrap().is_required());
            assert!(!schema.get("icon_today").unwrap().is_required());
        }
    }

    #[test]
    fn test_step1_options_hides_name() {
        let mut state = SharedConfigState::new(ConfigData::new());
        let outcome = state.step1_frequency(None, true);
        assert!(!keys(&outcome).contains(&"name"));
        assert_eq!(keys(&outcome).len(), 8);
    }

    #[test]
    fn test_step1_invalid_icon_keeps_record() {
        let seed = data(json!({"unique_id": "abc"}));
        let mut state = SharedConfigState::new(seed.clone());
        let input = data(json!({
            "name": "Paper",
            "frequency": "weekly",
            "icon_normal": "trash"
        }));

        let outcome = state.step1_frequency(Some(&input), false);

        match outcome {
            StepOutcome::NeedsInput { schema, errors } => {
                assert_eq!(errors.get("base").map(String::as_str), Some("icon"));
                // re-rendered form keeps what was typed
                assert_eq!(
                    schema.get("icon_normal").unwrap().suggested_value,
                    Some(json!("trash"))
                );
            }
            StepOutcome::Advance => panic!("invalid icon accepted"),
        }
        assert_eq!(state.data(), &seed);
        assert_eq!(state.name(), None);
    }

    #[test]
    fn test_step1_invalid_time() {
        let mut state = SharedConfigState::new(ConfigData::new());
        let input = data(json!({"frequency": "weekly", "expire_after": "25:00"}));
        state.step1_frequency(Some(&input), true);
        assert_eq!(state.errors().get("base").map(String::as_str), Some("time"));
        assert!(state.data().is_empty());
    }

    #[test]
    fn test_step1_icon_and_time_errors_report_time_last() {
        let mut state = SharedConfigState::new(ConfigData::new());
        let input = data(json!({
            "frequency": "weekly",
            "icon_tomorrow": "bad",
            "expire_after": "bad"
        }));
        state.step1_frequency(Some(&input), true);
        assert_eq!(state.errors().len(), 1);
        assert_eq!(state.errors()["base"], "time");
    }

    #[test]
    fn test_step1_errors_cleared_on_next_evaluation() {
        let mut state = SharedConfigState::new(ConfigData::new());
        state.step1_frequency(Some(&data(json!({"icon_today": "x"}))), true);
        assert!(!state.errors().is_empty());

        let outcome = state.step1_frequency(Some(&data(json!({"frequency": "annual"}))), true);
        assert!(outcome.is_advance());
        assert!(state.errors().is_empty());
        assert_eq!(state.frequency(), Some(Frequency::Annual));
    }

    #[test]
    fn test_step1_empty_icon_is_invalid() {
        let seed = data(json!({"frequency": "weekly"}));
        let mut state = SharedConfigState::new(seed.clone());
        let input = data(json!({"frequency": "blank", "icon_normal": ""}));
        assert!(!state.step1_frequency(Some(&input), true).is_advance());
        assert_eq!(state.errors().get("base").map(String::as_str), Some("icon"));
        assert_eq!(state.data(), &seed);
    }

    #[test]
    fn test_step1_null_values_count_as_absent() {
        let mut state = SharedConfigState::new(ConfigData::new());
        let input = data(json!({
            "frequency": "blank",
            "icon_today": null,
            "expire_after": null
        }));
        assert!(state.step1_frequency(Some(&input), true).is_advance());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_injected_validator() {
        let mut state = SharedConfigState::with_validator(ConfigData::new(), Arc::new(AcceptAll));
        let input = data(json!({
            "name": "Glass",
            "frequency": "monthly",
            "icon_normal": "not an icon",
            "expire_after": "whenever"
        }));
        assert!(state.step1_frequency(Some(&input), false).is_advance());
        assert_eq!(state.name(), Some("Glass"));
        assert_eq!(state.data()["icon_normal"], json!("not an icon"));
    }

    #[test]
    fn test_step2_fields_per_frequency() {
        let cases = [
            (Frequency::Annual, vec!["date"]),
            (Frequency::Group, vec!["entities"]),
            (Frequency::Blank, vec![]),
            (
                Frequency::Weekly,
                vec!["collection_days", "first_month", "last_month"],
            ),
            (
                Frequency::EvenWeeks,
                vec!["collection_days", "first_month", "last_month"],
            ),
            (
                Frequency::OddWeeks,
                vec!["collection_days", "first_month", "last_month"],
            ),
            (
                Frequency::Monthly,
                vec![
                    "collection_days",
                    "first_month",
                    "last_month",
                    "weekday_order_number",
                    "week_order_number",
                    "period",
                ],
            ),
            (
                Frequency::EveryNWeeks,
                vec![
                    "collection_days",
                    "first_month",
                    "last_month",
                    "period",
                    "first_week",
                ],
            ),
            (
                Frequency::EveryNDays,
                vec![
                    "collection_days",
                    "first_month",
                    "last_month",
                    "period",
                    "first_date",
                ],
            ),
        ];

        for (frequency, expected) in cases {
            let mut state = state_for(frequency, false);
            assert_eq!(
                keys(&state.step2_detail(None)),
                expected,
                "fields for {}",
                frequency
            );

            let mut state = state_for(frequency, true);
            let mut verbose = expected.clone();
            verbose.extend(["verbose_format", "date_format"]);
            assert_eq!(
                keys(&state.step2_detail(Some(ConfigData::new()))),
                verbose,
                "verbose fields for {}",
                frequency
            );
        }
    }

    #[test]
    fn test_step2_required_and_optional_markers() {
        let state = state_for(Frequency::Monthly, true);
        let schema = state.step2_schema();
        for field in schema.fields() {
            let optional = field.key == CONF_WEEKDAY_ORDER_NUMBER
                || field.key == CONF_WEEK_ORDER_NUMBER;
            assert_eq!(field.is_required(), !optional, "{}", field.key);
        }
        assert_eq!(
            schema.get(CONF_PERIOD).unwrap().validator,
            FieldValidator::IntRange { min: 1, max: 365 }
        );
        assert_eq!(
            schema.get(CONF_DATE_FORMAT).unwrap().suggested_value,
            Some(json!(DEFAULT_DATE_FORMAT))
        );
    }

    #[test]
    fn test_step2_group_entities_to_list() {
        let mut state = state_for(Frequency::Group, false);
        let outcome = state.step2_detail(Some(data(json!({"entities": "light.a, light.b"}))));
        assert!(outcome.is_advance());
        assert_eq!(state.data()["entities"], json!(["light.a", "light.b"]));
    }

    #[test]
    fn test_step2_non_group_keeps_values() {
        let mut state = state_for(Frequency::EveryNWeeks, false);
        let outcome = state.step2_detail(Some(data(json!({
            "collection_days": ["mon"],
            "period": 2,
            "first_week": 3
        }))));
        assert!(outcome.is_advance());
        assert_eq!(state.data()["period"], json!(2));
        assert!(!state.data().contains_key("entities"));
    }

    #[test]
    fn test_step2_ignores_frequency_and_name() {
        let mut state = state_for(Frequency::Weekly, false);
        let outcome = state.step2_detail(Some(data(json!({
            "collection_days": ["mon"],
            "first_month": "jan",
            "last_month": "dec",
            "frequency": "annual",
            "name": "Renamed"
        }))));
        assert!(outcome.is_advance());
        assert_eq!(state.frequency(), Some(Frequency::Weekly));
        assert_eq!(state.name(), None);

        // nothing left once they are dropped
        let outcome = state.step2_detail(Some(data(json!({"frequency": "annual"}))));
        assert!(!outcome.is_advance());
        assert_eq!(state.frequency(), Some(Frequency::Weekly));
    }

    #[test]
    fn test_unknown_frequency_falls_back_to_default() {
        let state = SharedConfigState::new(data(json!({"frequency": "hourly"})));
        assert_eq!(state.frequency(), None);
        assert_eq!(
            state.step2_schema().keys(),
            vec!["collection_days", "first_month", "last_month"]
        );
    }
}
