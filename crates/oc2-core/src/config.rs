use crate::error::{Oc2Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay listens on.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// URL path of the OpenC2 endpoint.
    #[serde(default = "default_path")]
    pub path: String,
    /// Maximum accepted request body, in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
    /// Run the structural validator on every submission.
    #[serde(default)]
    pub strict_validation: bool,
    /// Serve a JSON dump of the command log and assets at `/debug`.
    #[serde(default)]
    pub debug_endpoint: bool,
}

fn default_listen() -> String {
    "localhost:1512".to_string()
}

fn default_path() -> String {
    "/oc2".to_string()
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            body_limit: default_body_limit(),
            strict_validation: false,
            debug_endpoint: false,
        }
    }
}

impl RelayConfig {
    /// Read a YAML config file. Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Oc2Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: RelayConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !self.path.starts_with('/') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("path '{}' must start with '/'", self.path),
            });
        }

        if self.body_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "body_limit must be greater than zero".to_string(),
            });
        }

        if self.debug_endpoint && self.path == "/debug" {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "path '/debug' collides with the debug endpoint".to_string(),
            });
        } else if self.debug_endpoint {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "debug endpoint exposes every queued command and asset id".to_string(),
            });
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(Oc2Error::Config(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
