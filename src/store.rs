use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::engine::lint_config;
use crate::limits::*;
use crate::model::RuleSetConfig;

#[derive(Debug)]
pub enum StoreError {
    InvalidPropertyId,
    NotFound(String),
    Io(std::io::Error),
    Parse(String),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::InvalidPropertyId => write!(f, "invalid property id"),
            StoreError::NotFound(id) => write!(f, "no rule set for property: {id}"),
            StoreError::Io(e) => write!(f, "io error: {e}"),
            StoreError::Parse(e) => write!(f, "rule set parse error: {e}"),
            StoreError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Per-property rule sets, loaded lazily from `<config_dir>/<property>.json`.
///
/// Callers get an `Arc` snapshot; `reload` swaps the cached entry without
/// touching evaluations already holding the old one.
pub struct PropertyStore {
    configs: DashMap<String, Arc<RuleSetConfig>>,
    config_dir: PathBuf,
}

impl PropertyStore {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            configs: DashMap::new(),
            config_dir,
        }
    }

    /// Get the cached rule set or load it from disk.
    pub fn get(&self, property_id: &str) -> Result<Arc<RuleSetConfig>, StoreError> {
        if let Some(config) = self.configs.get(property_id) {
            return Ok(config.value().clone());
        }
        if self.configs.len() >= MAX_PROPERTIES {
            return Err(StoreError::LimitExceeded("too many properties"));
        }

        let config = Arc::new(self.load(property_id)?);
        self.configs.insert(property_id.to_string(), config.clone());
        metrics::gauge!(crate::observability::PROPERTIES_LOADED).set(self.configs.len() as f64);
        Ok(config)
    }

    /// Drop the cached rule set so the next `get` reads it from disk again.
    /// Returns whether anything was cached.
    pub fn reload(&self, property_id: &str) -> bool {
        let removed = self.configs.remove(property_id).is_some();
        metrics::gauge!(crate::observability::PROPERTIES_LOADED).set(self.configs.len() as f64);
        removed
    }

    fn load(&self, property_id: &str) -> Result<RuleSetConfig, StoreError> {
        let safe_name = sanitize_property_id(property_id)?;
        let path = self.config_dir.join(format!("{safe_name}.json"));
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(property_id.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let config: RuleSetConfig =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse(e.to_string()))?;

        if config.minimum_stay_rules.len() > MAX_RULES_PER_FAMILY
            || config.booking_window_rules.len() > MAX_RULES_PER_FAMILY
        {
            return Err(StoreError::LimitExceeded("too many rules"));
        }

        for issue in lint_config(&config) {
            warn!(property = property_id, "rule set issue: {issue}");
        }
        info!(
            property = property_id,
            enabled = config.enabled,
            stay_rules = config.minimum_stay_rules.len(),
            window_rules = config.booking_window_rules.len(),
            "loaded rule set"
        );
        Ok(config)
    }
}

/// Strip anything that could escape the config directory.
pub fn sanitize_property_id(property_id: &str) -> Result<String, StoreError> {
    if property_id.len() > MAX_PROPERTY_ID_LEN {
        return Err(StoreError::LimitExceeded("property id too long"));
    }
    let safe_name: String = property_id
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if safe_name.is_empty() {
        return Err(StoreError::InvalidPropertyId);
    }
    Ok(safe_name)
}
