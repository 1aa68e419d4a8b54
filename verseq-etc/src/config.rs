use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type Properties = HashMap<String, serde_yaml::Value>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid batch size '{0}': expect a whole number between 1 and 1000000")]
    InvalidBatchSize(String),

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// How many identifiers are reserved by a single refill.
///
/// Bounded by [`BatchSize::MAX`], since every identifier of a batch is one write in a
/// single bulk request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BatchSize(NonZeroU64);

impl BatchSize {
    pub const DEFAULT: BatchSize = BatchSize(NonZeroU64::MIN);

    pub const MAX: u64 = 1_000_000;

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for BatchSize {
    type Error = ConfigError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > BatchSize::MAX {
            return Err(ConfigError::InvalidBatchSize(value.to_string()));
        }
        NonZeroU64::new(value)
            .map(BatchSize)
            .ok_or_else(|| ConfigError::InvalidBatchSize(value.to_string()))
    }
}

impl TryFrom<i64> for BatchSize {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u64::try_from(value) {
            Ok(n) => BatchSize::try_from(n),
            Err(_) => Err(ConfigError::InvalidBatchSize(value.to_string())),
        }
    }
}

impl TryFrom<f64> for BatchSize {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > BatchSize::MAX as f64
        {
            return Err(ConfigError::InvalidBatchSize(value.to_string()));
        }
        BatchSize::try_from(value as u64)
    }
}

impl Serialize for BatchSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.get())
    }
}

struct BatchSizeVisitor;

impl<'de> Visitor<'de> for BatchSizeVisitor {
    type Value = BatchSize;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a positive whole number")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        BatchSize::try_from(v).map_err(E::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        BatchSize::try_from(v).map_err(E::custom)
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        BatchSize::try_from(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for BatchSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BatchSizeVisitor)
    }
}

/// Where the sequences live in the backing store and how many identifiers are fetched at once.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct SequencerConfig {
    #[serde(default = "SequencerConfig::default_resource_name")]
    pub resource_name: String,
    #[serde(default = "SequencerConfig::default_sub_resource_kind")]
    pub sub_resource_kind: String,
    #[serde(default)]
    pub batch_size: Option<BatchSize>,
}

impl SequencerConfig {
    pub const DEFAULT_RESOURCE_NAME: &'static str = "sequences";
    pub const DEFAULT_SUB_RESOURCE_KIND: &'static str = "_doc";

    fn default_resource_name() -> String {
        Self::DEFAULT_RESOURCE_NAME.to_string()
    }

    fn default_sub_resource_kind() -> String {
        Self::DEFAULT_SUB_RESOURCE_KIND.to_string()
    }

    pub fn resource_name<S>(mut self, name: S) -> Self
    where
        S: Into<String>,
    {
        self.resource_name = name.into();
        self
    }

    pub fn sub_resource_kind<S>(mut self, kind: S) -> Self
    where
        S: Into<String>,
    {
        self.sub_resource_kind = kind.into();
        self
    }

    pub fn batch_size(mut self, size: BatchSize) -> Self {
        self.batch_size.replace(size);
        self
    }

    /// The effective batch size, falling back to one identifier per refill.
    pub fn effective_batch_size(&self) -> BatchSize {
        self.batch_size.unwrap_or_default()
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            resource_name: Self::default_resource_name(),
            sub_resource_kind: Self::default_sub_resource_kind(),
            batch_size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub kind: String,
    #[serde(default)]
    pub props: Properties,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            props: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct LoggerConfig {
    #[serde(default = "LoggerConfig::default_level")]
    pub level: String,
}

impl LoggerConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BootstrapConf {
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sequencer: SequencerConfig,
}

impl BootstrapConf {
    pub fn from_yaml(b: &[u8]) -> Result<Self, ConfigError> {
        let v = serde_yaml::from_slice::<serde_yaml::Value>(b)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;

        // report a bad batch size as such, not as a generic parse failure
        if let Some(raw) = v.get("sequencer").and_then(|it| it.get("batch_size")) {
            if !raw.is_null() && BatchSize::deserialize(Clone::clone(raw)).is_err() {
                let shown = serde_yaml::to_string(raw).unwrap_or_default();
                return Err(ConfigError::InvalidBatchSize(shown.trim().to_string()));
            }
        }

        let c = serde_yaml::from_value::<BootstrapConf>(v)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        debug!("load bootstrap configuration: {:?}", &c);
        Ok(c)
    }
}
