//! Config Entry types
//!
//! A ConfigEntry is one configured instance of an integration, e.g. one
//! garbage collection schedule. `data` holds what the config flow collected,
//! `options` what an options flow last submitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use ha_data_entry_flow::ConfigData;

/// Origin of a config entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntrySource {
    /// Configured via UI/API
    #[default]
    User,
    /// Imported from YAML config
    Import,
}

impl ConfigEntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigEntrySource::User => "user",
            ConfigEntrySource::Import => "import",
        }
    }
}

impl FromStr for ConfigEntrySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ConfigEntrySource::User),
            "import" => Ok(ConfigEntrySource::Import),
            other => Err(format!("unknown config entry source: {other}")),
        }
    }
}

impl fmt::Display for ConfigEntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration entry for an integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Unique identifier (ULID)
    pub entry_id: String,

    /// Integration domain (e.g., "garbage_collection")
    pub domain: String,

    /// Human-readable display name
    pub title: String,

    /// Configuration data collected by the config flow
    #[serde(default)]
    pub data: ConfigData,

    /// Data submitted by the options flow
    #[serde(default)]
    pub options: ConfigData,

    /// Schema version of `data`
    #[serde(default = "default_version")]
    pub version: u32,

    /// Optional unique identifier for duplicate prevention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    /// Origin type
    #[serde(default)]
    pub source: ConfigEntrySource,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl ConfigEntry {
    /// Create a new config entry
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            domain: domain.into(),
            title: title.into(),
            data: ConfigData::new(),
            options: ConfigData::new(),
            version: 1,
            unique_id: None,
            source: ConfigEntrySource::User,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_data(mut self, data: ConfigData) -> Self {
        self.data = data;
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn with_source(mut self, source: ConfigEntrySource) -> Self {
        self.source = source;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

/// Partial update of a config entry; `None` fields are left alone
#[derive(Debug, Default)]
pub struct ConfigEntryUpdate {
    pub title: Option<String>,
    pub data: Option<ConfigData>,
    pub options: Option<ConfigData>,
    pub unique_id: Option<Option<String>>,
}

impl ConfigEntryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn data(mut self, data: ConfigData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn options(mut self, options: ConfigData) -> Self {
        self.options = Some(options);
        self
    }

    pub fn unique_id(mut self, unique_id: Option<String>) -> Self {
        self.unique_id = Some(unique_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.data.is_none()
            && self.options.is_none()
            && self.unique_id.is_none()
    }
}
