//! Settings shared by the CLI subcommands.
//!
//! Values come from built-in defaults, then an optional YAML file, then
//! command-line flags (applied by the CLI). Any key may be omitted from the
//! file:
//!
//! ```yaml
//! iou_threshold: 0.4
//! min_width: 32
//! output_root: /var/lib/platescan/items
//! order: confidence
//! gemini:
//!   model: gemini-2.0-flash
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::PlatescanError;
use crate::extract::Extractor;
use crate::nutrition::{GeminiConfig, UsdaClientConfig};
use crate::region::{SelectOptions, SelectOrder};

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub iou_threshold: f64,
    pub min_width: u32,
    pub min_height: u32,
    /// Confidence floor for the fruit/vegetable model.
    pub min_confidence: f64,
    /// Per-request namespaces are created below this directory.
    pub output_root: PathBuf,
    /// `detector` or `confidence`.
    pub order: String,
    pub http_timeout_secs: u64,
    pub usda: UsdaSettings,
    pub gemini: GeminiSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsdaSettings {
    pub base_url: String,
    pub data_type: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            min_width: 20,
            min_height: 20,
            min_confidence: 0.6,
            output_root: PathBuf::from("output_items"),
            order: "detector".to_string(),
            http_timeout_secs: 30,
            usda: UsdaSettings::default(),
            gemini: GeminiSettings::default(),
        }
    }
}

impl Default for UsdaSettings {
    fn default() -> Self {
        let client = UsdaClientConfig::default();
        Self {
            base_url: client.base_url,
            data_type: client.data_type,
            api_key_env: "USDA_API_KEY".to_string(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        let client = GeminiConfig::default();
        Self {
            base_url: client.base_url,
            model: client.model,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from a YAML file, filling gaps with defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, PlatescanError> {
        let file = File::open(path).map_err(PlatescanError::Io)?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| {
            PlatescanError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Defaults, or the given file when present.
    pub fn load(path: Option<&Path>) -> Result<Self, PlatescanError> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), PlatescanError> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(PlatescanError::InvalidConfig {
                message: format!(
                    "iou_threshold must be within [0, 1], got {}",
                    self.iou_threshold
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PlatescanError::InvalidConfig {
                message: format!(
                    "min_confidence must be within [0, 1], got {}",
                    self.min_confidence
                ),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(PlatescanError::InvalidConfig {
                message: "http_timeout_secs must be greater than 0".to_string(),
            });
        }
        self.select_order()?;
        Ok(())
    }

    pub fn select_order(&self) -> Result<SelectOrder, PlatescanError> {
        parse_order(&self.order)
    }

    pub fn select_options(&self) -> Result<SelectOptions, PlatescanError> {
        Ok(SelectOptions {
            iou_threshold: self.iou_threshold,
            order: self.select_order()?,
        })
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.min_width, self.min_height)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// USDA client settings; the key is read from the configured variable.
    pub fn usda_client_config(&self) -> Result<UsdaClientConfig, PlatescanError> {
        Ok(UsdaClientConfig {
            api_key: api_key("USDA", &self.usda.api_key_env)?,
            base_url: self.usda.base_url.clone(),
            data_type: self.usda.data_type.clone(),
            timeout: self.http_timeout(),
        })
    }

    pub fn gemini_config(&self) -> Result<GeminiConfig, PlatescanError> {
        Ok(GeminiConfig {
            api_key: api_key("Gemini", &self.gemini.api_key_env)?,
            base_url: self.gemini.base_url.clone(),
            model: self.gemini.model.clone(),
            timeout: self.http_timeout(),
        })
    }
}

pub fn parse_order(value: &str) -> Result<SelectOrder, PlatescanError> {
    match value {
        "detector" => Ok(SelectOrder::Detector),
        "confidence" => Ok(SelectOrder::Confidence),
        other => Err(PlatescanError::Unsupported {
            kind: "selection order",
            value: format!("'{}' (supported: detector, confidence)", other),
        }),
    }
}

fn api_key(service: &'static str, env: &str) -> Result<String, PlatescanError> {
    match std::env::var(env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(PlatescanError::MissingApiKey {
            service,
            env: env.to_string(),
        }),
    }
}
