//! YAML import
//!
//! Sensors defined under `garbage_collection: sensors:` in
//! `configuration.yaml` are turned into config entries by running each one
//! through the config flow's `import` step.

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use ha_config_entries::{ConfigEntries, ConfigEntriesFlowManager};
use ha_data_entry_flow::{ConfigData, FlowContext};

use crate::config_flow::GarbageCollectionFlowHandler;
use crate::constants::*;
use crate::validation::{is_date, is_dates, is_month_day, string_to_list};

/// Keys holding lists of `YYYY-MM-DD` dates
pub const CONF_INCLUDE_DATES: &str = "include_dates";
pub const CONF_EXCLUDE_DATES: &str = "exclude_dates";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid garbage_collection section: {0}")]
    InvalidSection(String),

    #[error("Invalid value for {key} in sensor {index}: {reason}")]
    InvalidValue {
        index: usize,
        key: String,
        reason: String,
    },
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Read the sensor definitions from a YAML file
pub fn load_sensor_configs(path: impl AsRef<Path>) -> ImportResult<Vec<ConfigData>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let root: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    parse_sensor_configs(&root)
}

/// Extract `garbage_collection.sensors` from a parsed YAML document.
///
/// A document without the section yields no sensors.
pub fn parse_sensor_configs(root: &serde_yaml::Value) -> ImportResult<Vec<ConfigData>> {
    let section = match root.get(DOMAIN) {
        None | Some(serde_yaml::Value::Null) => {
            debug!("No {} section found", DOMAIN);
            return Ok(Vec::new());
        }
        Some(section) => section,
    };
    if !section.is_mapping() {
        return Err(ImportError::InvalidSection("expected a mapping".to_string()));
    }

    let sensors = match section.get(CONF_SENSORS) {
        None | Some(serde_yaml::Value::Null) => return Ok(Vec::new()),
        Some(serde_yaml::Value::Sequence(sensors)) => sensors,
        Some(_) => {
            return Err(ImportError::InvalidSection(format!(
                "{} must be a list",
                CONF_SENSORS
            )))
        }
    };

    sensors
        .iter()
        .enumerate()
        .map(|(index, sensor)| {
            let value = serde_json::to_value(sensor).map_err(|e| ImportError::InvalidValue {
                index,
                key: CONF_SENSORS.to_string(),
                reason: e.to_string(),
            })?;
            let Value::Object(map) = value else {
                return Err(ImportError::InvalidSection(format!(
                    "sensor {} is not a mapping",
                    index
                )));
            };
            normalize_sensor(index, map.into_iter().collect())
        })
        .collect()
}

/// Check date values the forms do not check, and turn date lists
/// into lists.
fn normalize_sensor(index: usize, mut config: ConfigData) -> ImportResult<ConfigData> {
    let invalid = |key: &str, reason: &str| ImportError::InvalidValue {
        index,
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if let Some(date) = config.get(CONF_DATE) {
        let date = date.as_str().ok_or_else(|| invalid(CONF_DATE, "expected text"))?;
        if !is_month_day(date) {
            return Err(invalid(CONF_DATE, "expected MM/DD"));
        }
    }

    if let Some(first_date) = config.get(CONF_FIRST_DATE) {
        let first_date = first_date
            .as_str()
            .ok_or_else(|| invalid(CONF_FIRST_DATE, "expected text"))?;
        if !is_date(first_date) {
            return Err(invalid(CONF_FIRST_DATE, "expected YYYY-MM-DD"));
        }
    }

    for key in [CONF_INCLUDE_DATES, CONF_EXCLUDE_DATES] {
        if !config.contains_key(key) {
            continue;
        }
        let list = string_to_list(config.get(key));
        let dates: Vec<&str> = list
            .as_array()
            .into_iter()
            .flatten()
            .map(|d| d.as_str().ok_or_else(|| invalid(key, "expected text")))
            .collect::<ImportResult<_>>()?;
        if !is_dates(&dates) {
            return Err(invalid(key, "expected a list of YYYY-MM-DD"));
        }
        config.insert(key.to_string(), list);
    }

    Ok(config)
}

/// Outcome of importing a YAML file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Titles of the entries created
    pub created: Vec<String>,
    /// Sensors whose title already has an entry
    pub skipped: Vec<String>,
    /// Flows left waiting on a form, by flow id
    pub pending: Vec<String>,
    /// Sensors whose flow failed
    pub failed: Vec<String>,
}

/// Run every sensor in `path` through the import flow.
///
/// Sensors whose `name` matches the title of an existing entry of the
/// domain are skipped, so running the import twice is harmless.
pub async fn async_import_yaml(
    entries: &ConfigEntries,
    flows: &ConfigEntriesFlowManager,
    path: impl AsRef<Path>,
) -> ImportResult<ImportSummary> {
    let sensors = load_sensor_configs(path)?;
    let mut existing: HashSet<String> = entries
        .get_by_domain(DOMAIN)
        .into_iter()
        .map(|entry| entry.title)
        .collect();
    let mut summary = ImportSummary::default();

    for sensor in sensors {
        let name = sensor
            .get(CONF_NAME)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if existing.contains(&name) {
            debug!("Skipping {}, already configured", name);
            summary.skipped.push(name);
            continue;
        }

        let handler = Box::new(GarbageCollectionFlowHandler::new());
        match flows.async_init(handler, FlowContext::import(), Some(sensor)).await {
            Ok(result) if result.is_create_entry() => {
                info!("Imported {}", name);
                existing.insert(name.clone());
                summary.created.push(name);
            }
            Ok(result) => {
                warn!(
                    "Import of {} stopped at step {:?} with errors {:?}",
                    name, result.step_id, result.errors
                );
                summary.pending.push(result.flow_id);
            }
            Err(e) => {
                warn!("Failed to import {}: {}", name, e);
                summary.failed.push(name);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_config_entries::Storage;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> ImportResult<Vec<ConfigData>> {
        parse_sensor_configs(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_parse_sensors() {
        let sensors = parse(
            r#"
homeassistant:
  name: Home
garbage_collection:
  sensors:
    - name: Paper
      frequency: weekly
      collection_days: [mon, thu]
    - name: Glass
      frequency: annual
      date: "11/24"
      exclude_dates: "2024-12-24, 2024-12-31"
"#,
        )
        .unwrap();

        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0]["name"], json!("Paper"));
        assert_eq!(sensors[0]["collection_days"], json!(["mon", "thu"]));
        assert_eq!(
            sensors[1]["exclude_dates"],
            json!(["2024-12-24", "2024-12-31"])
        );
    }

    #[test]
    fn test_missing_section() {
        assert!(parse("homeassistant:\n  name: Home\n").unwrap().is_empty());
        assert!(parse("garbage_collection:\n").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_section() {
        assert!(matches!(
            parse("garbage_collection: 3\n"),
            Err(ImportError::InvalidSection(_))
        ));
        assert!(matches!(
            parse("garbage_collection:\n  sensors: Paper\n"),
            Err(ImportError::InvalidSection(_))
        ));
        assert!(matches!(
            parse("garbage_collection:\n  sensors:\n    - Paper\n"),
            Err(ImportError::InvalidSection(_))
        ));
    }

    #[test]
    fn test_invalid_dates() {
        let err = parse(
            "garbage_collection:\n  sensors:\n    - name: Tree\n      frequency: annual\n      date: \"02/30\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::InvalidValue { index: 0, ref key, .. } if key == "date"));

        let err = parse(
            "garbage_collection:\n  sensors:\n    - name: A\n      first_date: \"2024-01-01\"\n    - name: B\n      include_dates: [\"2024-13-01\"]\n",
        )
        .unwrap_err();
        assert!(
            matches!(err, ImportError::InvalidValue { index: 1, ref key, .. } if key == "include_dates")
        );
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("configuration.yaml");
        assert!(matches!(
            load_sensor_configs(&missing),
            Err(ImportError::Read { .. })
        ));

        std::fs::write(&missing, "garbage_collection: [unclosed\n").unwrap();
        assert!(matches!(
            load_sensor_configs(&missing),
            Err(ImportError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_import_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("configuration.yaml");
        std::fs::write(
            &path,
            r#"
garbage_collection:
  sensors:
    - name: Paper
      frequency: weekly
      collection_days: mon
    - name: Late
      frequency: blank
      expire_after: "later"
    - name: Broken
      frequency: weekly
"#,
        )
        .unwrap();

        let storage = Arc::new(Storage::new(temp_dir.path()));
        let entries = Arc::new(ConfigEntries::new(storage));
        let flows = ConfigEntriesFlowManager::new(entries.clone());

        let summary = async_import_yaml(&entries, &flows, &path).await.unwrap();
        assert_eq!(summary.created, vec!["Paper".to_string()]);
        assert_eq!(summary.pending.len(), 1);
        assert_eq!(summary.failed, vec!["Broken".to_string()]);

        let entry = &entries.get_by_domain(DOMAIN)[0];
        assert_eq!(entry.title, "Paper");
        assert_eq!(entry.data["collection_days"], json!(["mon"]));
        assert_eq!(entry.data["first_month"], json!(DEFAULT_FIRST_MONTH));

        let again = async_import_yaml(&entries, &flows, &path).await.unwrap();
        assert_eq!(again.skipped, vec!["Paper".to_string()]);
        assert!(again.created.is_empty());
        assert_eq!(entries.len(), 1);
    }
}
